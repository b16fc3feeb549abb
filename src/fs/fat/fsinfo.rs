use crate::disk::SECTOR_SIZE;
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

pub const LEAD_SIGNATURE: u32 = 0x4161_5252;
pub const STRUCT_SIGNATURE: u32 = 0x6141_7272;
pub const TRAIL_SIGNATURE: u32 = 0xAA55_0000;

/// FS information sector. Only the cluster counters are used, the
/// signatures are kept for diagnostics.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FsInfo {
    pub lead_signature: u32,
    pub struct_signature: u32,
    pub free_clusters: u32,
    pub allocated_clusters: u32,
    pub trail_signature: u32,
}

impl FsInfo {
    pub const SIZE: usize = SECTOR_SIZE;

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        debug_assert!(buffer.len() >= Self::SIZE);

        let mut reader = Cursor::new(&buffer[..Self::SIZE]);

        let lead_signature = reader.read_u32::<LittleEndian>()?;
        reader.seek(SeekFrom::Current(480))?;
        let struct_signature = reader.read_u32::<LittleEndian>()?;
        let free_clusters = reader.read_u32::<LittleEndian>()?;
        let allocated_clusters = reader.read_u32::<LittleEndian>()?;
        reader.seek(SeekFrom::Current(12))?;
        let trail_signature = reader.read_u32::<LittleEndian>()?;

        debug_assert_eq!(reader.position(), Self::SIZE as u64);

        Ok(Self {
            lead_signature,
            struct_signature,
            free_clusters,
            allocated_clusters,
            trail_signature,
        })
    }

    pub fn has_valid_signatures(&self) -> bool {
        self.lead_signature == LEAD_SIGNATURE
            && self.struct_signature == STRUCT_SIGNATURE
            && self.trail_signature == TRAIL_SIGNATURE
    }
}
