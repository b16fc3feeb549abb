use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveDateTime};

pub const DIRECTORY_ENTRY_SIZE: usize = 32;

/// First name byte of an entry that was deleted.
pub const ENTRY_DELETED: u8 = 0xE5;
/// First name byte of the entry terminating a directory.
pub const ENTRY_END: u8 = 0x00;

bitflags! {
    /// Attribute bits as interpreted by the driver.
    pub struct Attributes: u8 {
        const HIDDEN = 0x01;
        const SYSTEM = 0x02;
        const DIRECTORY = 0x10;
        const LONG_NAME = 0x0F;
    }
}

/// Name carried by a directory entry.
///
/// Long name fragments are recognised but never reassembled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryName<'a> {
    Short(&'a [u8]),
    LongFragment,
}

impl<'a> EntryName<'a> {
    /// Name presented to callers, long fragments show up as `LONG`.
    pub fn display(&self) -> String {
        match self {
            EntryName::Short(x) => String::from_utf8_lossy(x).into_owned(),
            EntryName::LongFragment => "LONG".to_owned(),
        }
    }
}

/// 32-byte on-disk directory entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirEntry {
    pub name: [u8; 11],
    pub attributes: u8,
    pub reserved: u8,
    pub creation_time_tenths: u8,
    pub creation_time: u16,
    pub creation_date: u16,
    pub accessed_date: u16,
    pub cluster_high: u16,
    pub modification_time: u16,
    pub modification_date: u16,
    pub cluster_low: u16,
    pub file_size: u32,
}

impl DirEntry {
    pub fn decode(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= DIRECTORY_ENTRY_SIZE);

        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[0..11]);

        Self {
            name,
            attributes: raw[11],
            reserved: raw[12],
            creation_time_tenths: raw[13],
            creation_time: LittleEndian::read_u16(&raw[14..16]),
            creation_date: LittleEndian::read_u16(&raw[16..18]),
            accessed_date: LittleEndian::read_u16(&raw[18..20]),
            cluster_high: LittleEndian::read_u16(&raw[20..22]),
            modification_time: LittleEndian::read_u16(&raw[22..24]),
            modification_date: LittleEndian::read_u16(&raw[24..26]),
            cluster_low: LittleEndian::read_u16(&raw[26..28]),
            file_size: LittleEndian::read_u32(&raw[28..32]),
        }
    }

    #[inline]
    pub fn is_end_of_directory(&self) -> bool {
        self.name[0] == ENTRY_END
    }

    #[inline]
    pub fn is_used(&self) -> bool {
        self.name[0] != ENTRY_DELETED
    }

    #[inline]
    pub fn is_long_name(&self) -> bool {
        self.attributes == Attributes::LONG_NAME.bits()
    }

    pub fn flags(&self) -> Attributes {
        Attributes::from_bits_truncate(self.attributes)
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        self.attributes & Attributes::DIRECTORY.bits() != 0
    }

    pub fn first_cluster(&self) -> u32 {
        self.cluster_low as u32 | ((self.cluster_high as u32) << 16)
    }

    /// Name bytes up to the first space of the padded 8.3 field.
    pub fn short_name(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|x| *x == b' ')
            .unwrap_or(self.name.len());
        &self.name[..len]
    }

    pub fn name(&self) -> EntryName<'_> {
        if self.is_long_name() {
            EntryName::LongFragment
        } else {
            EntryName::Short(self.short_name())
        }
    }

    /// Exact, case sensitive comparison against the space-trimmed 8.3 name.
    pub fn name_equals(&self, name: &str) -> bool {
        self.short_name() == name.as_bytes()
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        decode_timestamp(self.modification_date, self.modification_time)
    }
}

/// Iterate the entries stored in a directory cluster buffer.
pub fn entries(buffer: &[u8]) -> impl Iterator<Item = DirEntry> + '_ {
    buffer
        .chunks_exact(DIRECTORY_ENTRY_SIZE)
        .map(DirEntry::decode)
}

fn decode_timestamp(date: u16, time: u16) -> Option<NaiveDateTime> {
    let year = 1980 + (date >> 9) as i32;
    let month = ((date >> 5) & 0x0F) as u32;
    let day = (date & 0x1F) as u32;

    let hours = (time >> 11) as u32;
    let minutes = ((time >> 5) & 0x3F) as u32;
    let seconds = (time & 0x1F) as u32 * 2;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hours, minutes, seconds)
}
