use crate::disk::{SectorDevice, SECTOR_SIZE};
use crate::part::PartitionDescriptor;
use crate::{Error, Result};
use std::convert::TryInto;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

pub const PARTITION_TYPE_FAT32_CHS: u8 = 0x0B;
pub const PARTITION_TYPE_FAT32_LBA: u8 = 0x0C;

pub struct MbrPartition {
    pub flags: u8,
    pub start_chs: (u16, u8, u8),
    pub partition_type: u8,
    pub end_chs: (u16, u8, u8),
    pub lba: u32,
    pub num_sectors: u32,
}

impl MbrPartition {
    pub fn decode(buf: &[u8; 16]) -> Option<Self> {
        let mut cursor = Cursor::new(buf);

        let flags = cursor.read_u8().ok()?;
        let start_chs = Self::decode_chs(&mut cursor)?;
        let partition_type = cursor.read_u8().ok()?;
        if partition_type == 0 {
            return None;
        }
        let end_chs = Self::decode_chs(&mut cursor)?;

        let lba = cursor.read_u32::<LittleEndian>().ok()?;
        let num_sectors = cursor.read_u32::<LittleEndian>().ok()?;

        debug_assert_eq!(cursor.position(), 16);

        Some(Self {
            flags,
            start_chs,
            partition_type,
            end_chs,
            lba,
            num_sectors,
        })
    }

    fn decode_chs<T: AsRef<[u8]>>(cursor: &mut Cursor<T>) -> Option<(u16, u8, u8)> {
        let x1 = cursor.read_u8().ok()?;
        let x2 = cursor.read_u8().ok()?;
        let x3 = cursor.read_u8().ok()?;

        let head = x1;
        let sector = x2 & 0x3F;
        let cylinder = x3 as u16 | (((x2 as u16) & 0xC0) << 2);

        Some((cylinder, head, sector))
    }

    pub fn is_fat32(&self) -> bool {
        self.partition_type == PARTITION_TYPE_FAT32_CHS
            || self.partition_type == PARTITION_TYPE_FAT32_LBA
    }
}

pub struct Mbr {
    pub disk_signature: u32,
    pub partitions: Vec<Option<MbrPartition>>,
}

impl Mbr {
    pub fn load(disk: &mut dyn SectorDevice) -> Result<Self> {
        let mut buf = [0u8; SECTOR_SIZE];
        disk.read_sectors(0, 1, &mut buf)?;

        Self::decode(&buf)
    }

    pub fn decode(buf: &[u8; SECTOR_SIZE]) -> Result<Self> {
        if buf[0x1FE] != 0x55 || buf[0x1FF] != 0xAA {
            return Err(Error::MbrMissing);
        }

        let disk_signature = u32::from_le_bytes([buf[0x1B8], buf[0x1B9], buf[0x1BA], buf[0x1BB]]);

        let mut partitions: Vec<Option<MbrPartition>> = Vec::with_capacity(4);
        for x in [0x01BE, 0x01CE, 0x01DE, 0x01EE].iter().copied() {
            let entry: &[u8; 16] = buf[x..x + 0x10]
                .try_into()
                .map_err(|_| Error::MbrMissing)?;
            partitions.push(MbrPartition::decode(entry));
        }

        Ok(Self {
            disk_signature,
            partitions,
        })
    }

    /// Descriptor for the partition in slot `index` (0..4).
    ///
    /// The descriptor uuid combines the disk signature with the slot so two
    /// slots of one disk never share a cache key.
    pub fn descriptor(&self, index: usize) -> Option<PartitionDescriptor> {
        let partition = self.partitions.get(index)?.as_ref()?;
        Some(PartitionDescriptor::new(
            ((self.disk_signature as u64) << 8) | index as u64,
            partition.lba as u64,
        ))
    }

    /// Index of the first FAT32 partition, if any.
    pub fn first_fat32(&self) -> Option<usize> {
        self.partitions
            .iter()
            .position(|x| x.as_ref().map_or(false, MbrPartition::is_fat32))
    }
}
