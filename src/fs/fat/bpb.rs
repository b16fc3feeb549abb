use crate::disk::SECTOR_SIZE;
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::{Cursor, Read};

pub const BOOT_SIGNATURE: u16 = 0xAA55;

/// FAT32 boot sector with its BIOS parameter block.
#[derive(Clone)]
pub struct BootSector {
    pub jump: [u8; 3],
    pub oem_id: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub number_of_fats: u8,
    pub root_directory_entries: u16,
    pub total_sectors: u16,
    pub media_descriptor: u8,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub number_of_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_long: u32,
    pub sectors_per_fat_long: u32,
    pub drive_description: u16,
    pub version: u16,
    pub root_directory_cluster: u32,
    pub fs_information_sector: u16,
    pub backup_boot_sector: u16,
    pub reserved: [u8; 12],
    pub drive_number: u8,
    pub winnt_flags: u8,
    pub extended_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub file_system_type: [u8; 8],
    pub boot_code: [u8; 420],
    pub signature: u16,
}

impl BootSector {
    pub const SIZE: usize = SECTOR_SIZE;

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        debug_assert!(buffer.len() >= Self::SIZE);

        let mut reader = Cursor::new(&buffer[..Self::SIZE]);

        macro_rules! read {
            (array($size:expr)) => {{
                let mut a = [0u8; $size];
                reader.read_exact(&mut a)?;
                a
            }};
            (u8) => {{
                reader.read_u8()?
            }};
            (u16) => {{
                reader.read_u16::<LittleEndian>()?
            }};
            (u32) => {{
                reader.read_u32::<LittleEndian>()?
            }};
        }

        let this = Self {
            jump: read!(array(3)),
            oem_id: read!(array(8)),
            bytes_per_sector: read!(u16),
            sectors_per_cluster: read!(u8),
            reserved_sectors: read!(u16),
            number_of_fats: read!(u8),
            root_directory_entries: read!(u16),
            total_sectors: read!(u16),
            media_descriptor: read!(u8),
            sectors_per_fat: read!(u16),
            sectors_per_track: read!(u16),
            number_of_heads: read!(u16),
            hidden_sectors: read!(u32),
            total_sectors_long: read!(u32),
            sectors_per_fat_long: read!(u32),
            drive_description: read!(u16),
            version: read!(u16),
            root_directory_cluster: read!(u32),
            fs_information_sector: read!(u16),
            backup_boot_sector: read!(u16),
            reserved: read!(array(12)),
            drive_number: read!(u8),
            winnt_flags: read!(u8),
            extended_signature: read!(u8),
            volume_id: read!(u32),
            volume_label: read!(array(11)),
            file_system_type: read!(array(8)),
            boot_code: read!(array(420)),
            signature: read!(u16),
        };

        debug_assert_eq!(reader.position(), Self::SIZE as u64);

        Ok(this)
    }

    /// Signature and file system type are not enforced, a mismatch is only
    /// reported here.
    pub fn has_valid_signature(&self) -> bool {
        self.signature == BOOT_SIGNATURE
    }

    pub fn is_fat32(&self) -> bool {
        &self.file_system_type == b"FAT32   "
    }

    /// Bytes covered by one cluster, always counted in 512-byte sectors.
    #[inline]
    pub fn cluster_size(&self) -> u32 {
        self.sectors_per_cluster as u32 * SECTOR_SIZE as u32
    }
}

impl fmt::Display for BootSector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Oem ID                      : {}
Bytes per sector            : {}
Sectors per cluster         : {}
Reserved sectors            : {}
Number of FATs              : {}
Sectors per FAT             : {}
Root directory cluster      : {}
FS information sector       : {}
Hidden sectors              : {}
Total sectors               : {}
Volume ID                   : {:08X}
Label                       : {}
File system type            : {}",
            String::from_utf8_lossy(&self.oem_id),
            self.bytes_per_sector,
            self.sectors_per_cluster,
            self.reserved_sectors,
            self.number_of_fats,
            self.sectors_per_fat_long,
            self.root_directory_cluster,
            self.fs_information_sector,
            self.hidden_sectors,
            if self.total_sectors != 0 {
                self.total_sectors as u32
            } else {
                self.total_sectors_long
            },
            self.volume_id,
            String::from_utf8_lossy(&self.volume_label).trim_end(),
            String::from_utf8_lossy(&self.file_system_type).trim_end()
        )
    }
}
