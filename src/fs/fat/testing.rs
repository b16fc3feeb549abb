//! Helpers laying out small FAT32 volumes in memory.

use super::chain::END_OF_CHAIN;
use super::entry::DIRECTORY_ENTRY_SIZE;
use crate::disk::{RamDisk, SectorDevice, SECTOR_SIZE};
use crate::part::PartitionDescriptor;
use crate::{Error, Result};

pub const ATTR_FILE: u8 = 0x20;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_LONG_NAME: u8 = 0x0F;

pub fn entry(
    name: &[u8; 11],
    attributes: u8,
    cluster: u32,
    size: u32,
) -> [u8; DIRECTORY_ENTRY_SIZE] {
    let mut raw = [0u8; DIRECTORY_ENTRY_SIZE];
    raw[0..11].copy_from_slice(name);
    raw[11] = attributes;
    raw[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    raw[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    raw[28..32].copy_from_slice(&size.to_le_bytes());
    raw
}

pub struct ImageBuilder {
    disk_uuid: u64,
    partition_uuid: u64,
    partition_start: u64,
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    number_of_fats: u8,
    sectors_per_fat: u32,
    data_clusters: u32,
    free_clusters: u32,
    root_cluster: u32,
    writes: Vec<(u64, Vec<u8>)>,
}

impl ImageBuilder {
    pub fn new(partition_start: u64, sectors_per_cluster: u8) -> Self {
        Self {
            disk_uuid: 1,
            partition_uuid: 1,
            partition_start,
            sectors_per_cluster,
            reserved_sectors: 32,
            number_of_fats: 2,
            sectors_per_fat: 16,
            data_clusters: 16,
            free_clusters: 0,
            root_cluster: 2,
            writes: Vec::new(),
        }
    }

    pub fn uuids(mut self, disk: u64, partition: u64) -> Self {
        self.disk_uuid = disk;
        self.partition_uuid = partition;
        self
    }

    pub fn reserved_sectors(mut self, x: u16) -> Self {
        self.reserved_sectors = x;
        self
    }

    pub fn sectors_per_fat(mut self, x: u32) -> Self {
        self.sectors_per_fat = x;
        self
    }

    pub fn data_clusters(mut self, x: u32) -> Self {
        self.data_clusters = x;
        self
    }

    pub fn free_clusters(mut self, x: u32) -> Self {
        self.free_clusters = x;
        self
    }

    pub fn root_cluster(mut self, x: u32) -> Self {
        self.root_cluster = x;
        self
    }

    pub fn partition(&self) -> PartitionDescriptor {
        PartitionDescriptor::new(self.partition_uuid, self.partition_start)
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    pub fn fat_region_start(&self) -> u64 {
        self.partition_start + self.reserved_sectors as u64
    }

    pub fn cluster_lba(&self, cluster: u32) -> u64 {
        self.fat_region_start()
            + self.number_of_fats as u64 * self.sectors_per_fat as u64
            + (cluster as u64 - 2) * self.sectors_per_cluster as u64
    }

    /// Store `value` for `cluster` in every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        for copy in 0..self.number_of_fats as u64 {
            let offset = (self.fat_region_start() + copy * self.sectors_per_fat as u64)
                * SECTOR_SIZE as u64
                + cluster as u64 * 4;
            self.writes.push((offset, value.to_le_bytes().to_vec()));
        }
    }

    /// Link `clusters` in order and terminate the chain.
    pub fn set_chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.set_fat(*last, END_OF_CHAIN);
        }
    }

    pub fn write_cluster(&mut self, cluster: u32, data: &[u8]) {
        assert!(data.len() <= self.cluster_size());
        let offset = self.cluster_lba(cluster) * SECTOR_SIZE as u64;
        self.writes.push((offset, data.to_vec()));
    }

    /// Put a raw directory entry into slot `index` of `cluster`.
    pub fn set_entry(&mut self, cluster: u32, index: usize, raw: &[u8; DIRECTORY_ENTRY_SIZE]) {
        assert!((index + 1) * DIRECTORY_ENTRY_SIZE <= self.cluster_size());
        let offset =
            self.cluster_lba(cluster) * SECTOR_SIZE as u64 + (index * DIRECTORY_ENTRY_SIZE) as u64;
        self.writes.push((offset, raw.to_vec()));
    }

    fn boot_sector(&self) -> [u8; SECTOR_SIZE] {
        let total = self.reserved_sectors as u32
            + self.number_of_fats as u32 * self.sectors_per_fat
            + self.data_clusters * self.sectors_per_cluster as u32;

        let mut buf = [0u8; SECTOR_SIZE];
        buf[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        buf[3..11].copy_from_slice(b"FATDISK ");
        buf[11..13].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
        buf[13] = self.sectors_per_cluster;
        buf[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[16] = self.number_of_fats;
        buf[21] = 0xF8;
        buf[32..36].copy_from_slice(&total.to_le_bytes());
        buf[36..40].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        buf[44..48].copy_from_slice(&self.root_cluster.to_le_bytes());
        buf[48..50].copy_from_slice(&1u16.to_le_bytes());
        buf[50..52].copy_from_slice(&6u16.to_le_bytes());
        buf[66] = 0x29;
        buf[71..82].copy_from_slice(b"TEST VOLUME");
        buf[82..90].copy_from_slice(b"FAT32   ");
        buf[510] = 0x55;
        buf[511] = 0xAA;
        buf
    }

    fn fs_info(&self) -> [u8; SECTOR_SIZE] {
        let mut buf = [0u8; SECTOR_SIZE];
        buf[0..4].copy_from_slice(b"RRaA");
        buf[484..488].copy_from_slice(b"rrAa");
        buf[488..492].copy_from_slice(&self.free_clusters.to_le_bytes());
        buf[492..496].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        buf[508..512].copy_from_slice(&[0x00, 0x00, 0x55, 0xAA]);
        buf
    }

    pub fn build(self) -> RamDisk {
        let total_sectors =
            self.cluster_lba(2) + self.data_clusters as u64 * self.sectors_per_cluster as u64;
        let mut disk = RamDisk::new_zeroed(self.disk_uuid, total_sectors as u32);

        let start = self.partition_start * SECTOR_SIZE as u64;
        disk.write_at(start, &self.boot_sector());
        disk.write_at(start + SECTOR_SIZE as u64, &self.fs_info());

        let mut defaults = Self::new(self.partition_start, self.sectors_per_cluster);
        defaults.reserved_sectors = self.reserved_sectors;
        defaults.number_of_fats = self.number_of_fats;
        defaults.sectors_per_fat = self.sectors_per_fat;
        defaults.set_fat(0, 0x0FFF_FFF8);
        defaults.set_fat(1, 0x0FFF_FFFF);
        defaults.set_fat(self.root_cluster, END_OF_CHAIN);

        for (offset, data) in defaults.writes.iter().chain(self.writes.iter()) {
            disk.write_at(*offset, data);
        }

        disk
    }
}

/// Device wrapper recording every request and failing reads touching
/// selected sectors.
pub struct TestDisk<D> {
    inner: D,
    reads: Vec<(u64, u32)>,
    failing: Vec<u64>,
}

impl<D> TestDisk<D>
where
    D: SectorDevice,
{
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            reads: Vec::new(),
            failing: Vec::new(),
        }
    }

    pub fn fail_lba(&mut self, lba: u64) {
        self.failing.push(lba);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    pub fn reads(&self) -> &[(u64, u32)] {
        self.reads.as_slice()
    }

    pub fn reads_of(&self, lba: u64) -> usize {
        self.reads.iter().filter(|(x, _)| *x == lba).count()
    }
}

impl<D> SectorDevice for TestDisk<D>
where
    D: SectorDevice,
{
    fn uuid(&self) -> u64 {
        self.inner.uuid()
    }

    fn sector_count(&self) -> u64 {
        self.inner.sector_count()
    }

    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<()> {
        self.reads.push((lba, count));
        let end = lba.saturating_add(count as u64);
        if self.failing.iter().any(|x| *x >= lba && *x < end) {
            return Err(Error::ReadFailed { lba, count });
        }
        self.inner.read_sectors(lba, count, buf)
    }
}
