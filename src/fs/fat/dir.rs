use super::entry::{entries, Attributes, DirEntry};
use super::volume::Volume;
use crate::disk::SectorDevice;
use crate::Result;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// Directory listing entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub hidden: bool,
    pub system: bool,
    pub directory: bool,
    /// File size, or the size of one cluster for directories.
    pub size: u64,
    pub modified: Option<NaiveDateTime>,
}

impl FileInfo {
    fn from_entry(entry: &DirEntry, cluster_size: u64) -> Self {
        let flags = entry.flags();
        let directory = entry.is_directory();

        Self {
            name: entry.name().display(),
            hidden: flags.contains(Attributes::HIDDEN),
            system: flags.contains(Attributes::SYSTEM),
            directory,
            size: if directory {
                cluster_size
            } else {
                entry.file_size as u64
            },
            modified: entry.modified(),
        }
    }
}

impl Volume {
    /// List the directory at `path`.
    ///
    /// Listing stops at the first end-of-directory entry. A chain that ends,
    /// is corrupted or cannot be read past the first cluster yields what was
    /// collected up to that point, as does a chain looping back on itself.
    pub fn list<S>(&mut self, disk: &mut dyn SectorDevice, path: &[S]) -> Result<Vec<FileInfo>>
    where
        S: AsRef<str>,
    {
        let mut cluster = self.find_cluster_number(disk, path)?;
        self.read_cluster(disk, cluster)?;

        let cluster_size = self.cluster_size() as u64;
        let mut visited = HashSet::new();
        visited.insert(cluster);
        let mut files = Vec::new();

        loop {
            if self.collect(&mut files, cluster_size) {
                break;
            }

            match self.follow(disk, cluster) {
                Ok(Some(next)) => {
                    if !visited.insert(next) {
                        warn!("directory chain loops back to cluster {}", next);
                        break;
                    }
                    if let Err(e) = self.read_cluster(disk, next) {
                        warn!("directory listing truncated at cluster {}: {}", next, e);
                        break;
                    }
                    cluster = next;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("directory listing truncated: {}", e);
                    break;
                }
            }
        }

        Ok(files)
    }

    /// Append the used entries of the loaded cluster, returns true once the
    /// end-of-directory entry was seen.
    fn collect(&self, files: &mut Vec<FileInfo>, cluster_size: u64) -> bool {
        for entry in entries(self.cluster_buffer()) {
            if entry.is_end_of_directory() {
                return true;
            }

            if entry.is_used() {
                files.push(FileInfo::from_entry(&entry, cluster_size));
            }
        }

        false
    }
}
