use crate::disk::{SectorDevice, SECTOR_SIZE};
use crate::{Error, Result};

/// Sector device backed by a byte vector.
pub struct RamDisk {
    uuid: u64,
    buffer: Vec<u8>,
}

impl RamDisk {
    pub fn new_zeroed(uuid: u64, num_sectors: u32) -> Self {
        Self {
            uuid,
            buffer: vec![0u8; num_sectors as usize * SECTOR_SIZE],
        }
    }

    /// Copy `data` into the disk at byte `offset`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) {
        let start = offset as usize;
        let end = start + data.len();
        assert!(end <= self.buffer.len(), "write past end of RAM disk");
        self.buffer[start..end].copy_from_slice(data);
    }
}

impl SectorDevice for RamDisk {
    fn uuid(&self) -> u64 {
        self.uuid
    }

    fn sector_count(&self) -> u64 {
        (self.buffer.len() / SECTOR_SIZE) as u64
    }

    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<()> {
        let length = count as usize * SECTOR_SIZE;
        let start = lba
            .checked_mul(SECTOR_SIZE as u64)
            .filter(|x| *x <= self.buffer.len() as u64)
            .ok_or(Error::ReadFailed { lba, count })? as usize;

        if start + length > self.buffer.len() || buf.len() < length {
            return Err(Error::ReadFailed { lba, count });
        }

        buf[..length].copy_from_slice(&self.buffer[start..start + length]);
        Ok(())
    }
}
