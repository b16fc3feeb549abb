use super::volume::Volume;
use crate::disk::SectorDevice;
use crate::part::PartitionDescriptor;
use crate::{Error, Result};

/// Holds the volume of the most recently used (disk, partition) pair.
///
/// Requesting a different pair drops the cached volume and loads the new
/// one. A failed load is remembered as well: the pair stays current with no
/// volume until another pair is requested or the cache is invalidated.
#[derive(Default)]
pub struct VolumeCache {
    key: Option<(u64, u64)>,
    volume: Option<Volume>,
    loads: u64,
}

impl VolumeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the volume for `partition` on `disk` is loaded.
    pub fn ensure(
        &mut self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
    ) -> Result<&mut Volume> {
        let key = (disk.uuid(), partition.uuid);

        if self.key != Some(key) {
            debug!(
                "loading volume of disk {:#x} partition {:#x} at LBA {}",
                key.0, key.1, partition.start
            );
            self.loads += 1;
            self.volume = match Volume::load(disk, partition) {
                Ok(x) => Some(x),
                Err(e) => {
                    warn!("failed to load volume at LBA {}: {}", partition.start, e);
                    None
                }
            };
            self.key = Some(key);
        }

        self.volume.as_mut().ok_or(Error::VolumeUnavailable)
    }

    pub fn ensure_cached(
        &mut self,
        disk: &mut dyn SectorDevice,
        partition: &PartitionDescriptor,
    ) -> bool {
        self.ensure(disk, partition).is_ok()
    }

    /// Forget the cached pair, the next request reloads.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.volume = None;
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.volume.as_ref()
    }

    /// How many times a volume load was attempted.
    pub fn loads(&self) -> u64 {
        self.loads
    }
}
