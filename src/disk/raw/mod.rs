use crate::disk::{SectorDevice, SECTOR_SIZE};
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Sector device over any seekable byte backend, typically a disk image file.
pub struct RawDisk<B>
where
    B: Read + Seek,
{
    backend: B,
    uuid: u64,
    disk_size: u64,
    // reads land here first so a failed request never leaks into the caller's buffer
    temp: Vec<u8>,
}

impl<B> RawDisk<B>
where
    B: Read + Seek,
{
    pub fn open(mut backend: B, uuid: u64) -> Result<Self> {
        let disk_size = backend.seek(SeekFrom::End(0))?;
        if disk_size % SECTOR_SIZE as u64 != 0 {
            warn!(
                "disk size {} is not a multiple of {}, trailing bytes ignored",
                disk_size, SECTOR_SIZE
            );
        }

        Ok(Self {
            backend,
            uuid,
            disk_size,
            temp: Vec::new(),
        })
    }
}

impl<B> SectorDevice for RawDisk<B>
where
    B: Read + Seek,
{
    fn uuid(&self) -> u64 {
        self.uuid
    }

    fn sector_count(&self) -> u64 {
        self.disk_size / SECTOR_SIZE as u64
    }

    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<()> {
        let length = count as usize * SECTOR_SIZE;
        if buf.len() < length || lba.saturating_add(count as u64) > self.sector_count() {
            return Err(Error::ReadFailed { lba, count });
        }

        self.temp.resize(length, 0);

        let r = self
            .backend
            .seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))
            .and_then(|_| self.backend.read_exact(&mut self.temp[..length]));
        if let Err(e) = r {
            debug!("read of {} sector(s) at LBA {} failed: {}", count, lba, e);
            return Err(Error::ReadFailed { lba, count });
        }

        buf[..length].copy_from_slice(&self.temp[..length]);
        Ok(())
    }
}
