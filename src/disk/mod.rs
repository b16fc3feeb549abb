pub mod ram;
pub mod raw;

pub use ram::RamDisk;
pub use raw::RawDisk;

use crate::Result;

/// Every sector handled by the driver is 512 bytes, regardless of what the
/// boot sector advertises.
pub const SECTOR_SIZE: usize = 512;

/// Block device seen by the FAT driver.
///
/// `read_sectors` is all-or-nothing: on error the contents of `buf` must be
/// left untouched, callers never look at a partially filled buffer.
pub trait SectorDevice {
    /// Stable identity of the disk, used as part of the volume cache key.
    fn uuid(&self) -> u64;

    /// Number of sectors available on the device.
    fn sector_count(&self) -> u64;

    /// Read `count` consecutive sectors starting at `lba` into the first
    /// `count * SECTOR_SIZE` bytes of `buf`.
    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<()>;
}
