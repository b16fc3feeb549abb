pub mod mbr;

/// Location and identity of a partition, as handed to the FAT driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PartitionDescriptor {
    pub uuid: u64,
    /// First sector of the partition, in disk LBA.
    pub start: u64,
}

impl PartitionDescriptor {
    pub fn new(uuid: u64, start: u64) -> Self {
        Self { uuid, start }
    }
}
