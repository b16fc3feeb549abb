//! Read-only FAT32 driver working directly on 512-byte sectors.

pub mod bpb;
pub mod cache;
pub mod chain;
pub mod dir;
pub mod entry;
mod file;
pub mod fsinfo;
pub mod path;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::VolumeCache;
pub use chain::ChainLink;
pub use dir::FileInfo;
pub use volume::Volume;

use crate::disk::SectorDevice;
use crate::part::PartitionDescriptor;
use crate::Result;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FAT32 driver.
///
/// Owns the volume cache; each operation holds the cache lock for its whole
/// duration, so concurrent callers are serialized and never observe the
/// cached volume switching under them.
///
/// `free_size`, `ls` and `read_file` fold every failure into an empty
/// result. The `try_` variants report the cause.
#[derive(Default)]
pub struct Fat32 {
    cache: Mutex<VolumeCache>,
}

impl Fat32 {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache(&self) -> MutexGuard<'_, VolumeCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn try_free_size(
        &self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
    ) -> Result<u64> {
        let mut cache = self.cache();
        Ok(cache.ensure(disk, partition)?.free_size())
    }

    /// Free space in bytes, 0 when the volume cannot be read.
    pub fn free_size(&self, disk: &mut dyn SectorDevice, partition: &PartitionDescriptor) -> u64 {
        self.try_free_size(disk, partition).unwrap_or_else(|e| {
            debug!("free_size: {}", e);
            0
        })
    }

    pub fn try_ls<S>(
        &self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
        path: &[S],
    ) -> Result<Vec<FileInfo>>
    where
        S: AsRef<str>,
    {
        let mut cache = self.cache();
        cache.ensure(disk, partition)?.list(disk, path)
    }

    /// Entries of the directory at `path`, empty on any failure.
    pub fn ls<S>(
        &self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
        path: &[S],
    ) -> Vec<FileInfo>
    where
        S: AsRef<str>,
    {
        self.try_ls(disk, partition, path).unwrap_or_else(|e| {
            debug!("ls: {}", e);
            Vec::new()
        })
    }

    pub fn try_read_file<S>(
        &self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
        path: &[S],
        filename: &str,
    ) -> Result<Vec<u8>>
    where
        S: AsRef<str>,
    {
        let mut cache = self.cache();
        cache.ensure(disk, partition)?.read_file(disk, path, filename)
    }

    /// Content of `filename` in the directory at `path`, empty on any failure.
    pub fn read_file<S>(
        &self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
        path: &[S],
        filename: &str,
    ) -> Vec<u8>
    where
        S: AsRef<str>,
    {
        self.try_read_file(disk, partition, path, filename)
            .unwrap_or_else(|e| {
                debug!("read_file {:?}: {}", filename, e);
                Vec::new()
            })
    }

    /// Drop the cached volume, the next operation reloads it.
    pub fn invalidate(&self) {
        self.cache().invalidate()
    }

    /// Number of volume loads performed so far.
    pub fn loads(&self) -> u64 {
        self.cache().loads()
    }
}
