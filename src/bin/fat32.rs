#[macro_use]
extern crate log;

mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fatdisk::disk::{RawDisk, SectorDevice};
use fatdisk::fs::fat::path::components;
use fatdisk::fs::fat::{Fat32, FileInfo, VolumeCache};
use fatdisk::part::mbr::Mbr;
use fatdisk::part::PartitionDescriptor;
use fatdisk::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(about = "Read files from FAT32 volumes inside disk images")]
struct Options {
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u32,

    #[clap(name = "file", parse(from_os_str))]
    pub file: PathBuf,

    #[clap(
        short = 'p',
        long = "partition",
        conflicts_with = "start",
        help = "MBR partition slot (0-3) holding the volume"
    )]
    pub partition: Option<usize>,

    #[clap(
        long,
        help = "First sector of the volume, 0 for a bare file system image",
        long_help = "First sector of the volume. When neither this nor --partition is given the first FAT32 partition of the MBR is used, or sector 0 if the image has no MBR."
    )]
    pub start: Option<u64>,

    #[clap(subcommand)]
    pub subcommand: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Print boot sector fields and free space
    Info,
    #[clap(alias = "dir")]
    Ls(SubCommandPath),
    #[clap(alias = "type")]
    Cat(SubCommandPath),
}

#[derive(Parser)]
struct SubCommandPath {
    #[clap(default_value = "/")]
    pub path: String,
}

fn select_partition(
    disk: &mut dyn SectorDevice,
    options: &Options,
) -> anyhow::Result<PartitionDescriptor> {
    if let Some(start) = options.start {
        return Ok(PartitionDescriptor::new(start, start));
    }

    let mbr = match Mbr::load(disk) {
        Ok(x) => Some(x),
        Err(Error::MbrMissing) if options.partition.is_none() => None,
        Err(e) => return Err(e).context("failed to read MBR"),
    };

    let index = match (&mbr, options.partition) {
        (Some(_), Some(index)) => Some(index),
        (Some(mbr), None) => mbr.first_fat32(),
        (None, _) => None,
    };

    match (mbr, index) {
        (Some(mbr), Some(index)) => mbr
            .descriptor(index)
            .with_context(|| format!("partition {} is empty", index)),
        _ => {
            info!("no FAT32 partition in MBR, reading volume at sector 0");
            Ok(PartitionDescriptor::new(0, 0))
        }
    }
}

fn print_entry(file: &FileInfo) {
    let modified = file
        .modified
        .map(|x| x.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| " ".repeat(16));

    println!(
        "{} {} {}{} {:>10} {}",
        modified,
        if file.directory { "<DIR>" } else { "     " },
        if file.hidden { 'H' } else { '-' },
        if file.system { 'S' } else { '-' },
        file.size,
        file.name
    );
}

fn main() -> anyhow::Result<()> {
    better_panic::install();
    let options = Options::parse();
    utils::setup_logging(options.verbose);

    let image = File::open(&options.file)
        .with_context(|| format!("failed to open {}", options.file.display()))?;
    let mut disk = RawDisk::open(BufReader::new(image), 0).context("failed to open disk image")?;
    let partition = select_partition(&mut disk, &options)?;
    debug!("using volume at LBA {}", partition.start);

    let fs = Fat32::new();

    match options.subcommand {
        SubCommand::Info => {
            let mut cache = VolumeCache::new();
            let volume = cache
                .ensure(&mut disk, &partition)
                .context("failed to read FAT32 volume")?;

            println!("{}", volume.boot_sector());
            println!(
                "Free space                  : {}",
                utils::size_to_string(volume.free_size())
            );
        }
        SubCommand::Ls(p) => {
            let path = components(&p.path);
            let files = fs
                .try_ls(&mut disk, &partition, &path)
                .with_context(|| format!("cannot list {}", p.path))?;

            for file in files.iter() {
                print_entry(file);
            }
        }
        SubCommand::Cat(p) => {
            let mut path = components(&p.path);
            let name = path.pop().context("no file name given")?;
            let content = fs
                .try_read_file(&mut disk, &partition, &path, name)
                .with_context(|| format!("cannot read {}", p.path))?;

            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&content)?;
            lock.flush()?;
        }
    }

    Ok(())
}
