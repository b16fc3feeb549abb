use super::bpb::BootSector;
use super::chain::{ChainLink, FAT_ENTRY_MASK};
use super::fsinfo::FsInfo;
use crate::disk::{SectorDevice, SECTOR_SIZE};
use crate::part::PartitionDescriptor;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// A loaded FAT32 volume: decoded boot and FS information sectors plus the
/// cluster buffers reused by every operation on it.
pub struct Volume {
    partition_start: u64,
    boot: BootSector,
    info: FsInfo,
    // directory and file data
    cluster: Vec<u8>,
    // FAT window
    fat: Vec<u8>,
}

impl Volume {
    pub fn load(disk: &mut dyn SectorDevice, partition: &PartitionDescriptor) -> Result<Self> {
        let mut sector = [0u8; SECTOR_SIZE];

        disk.read_sectors(partition.start, 1, &mut sector)?;
        let boot = BootSector::decode(&sector)?;
        debug!("{}", boot);

        if !boot.has_valid_signature() {
            warn!(
                "boot sector signature is {:#06x}, expected 0xaa55",
                boot.signature
            );
        }
        if !boot.is_fat32() {
            warn!(
                "file system type is {:?}, continuing as FAT32",
                String::from_utf8_lossy(&boot.file_system_type)
            );
        }
        if boot.sectors_per_cluster == 0 {
            return Err(Error::InvalidBpb);
        }

        let info_lba = partition.start + boot.fs_information_sector as u64;
        disk.read_sectors(info_lba, 1, &mut sector)?;
        let info = FsInfo::decode(&sector)?;
        if !info.has_valid_signatures() {
            warn!("FS information sector at LBA {} has bad signatures", info_lba);
        }

        let cluster_size = boot.cluster_size() as usize;
        Ok(Self {
            partition_start: partition.start,
            boot,
            info,
            cluster: vec![0u8; cluster_size],
            fat: vec![0u8; cluster_size],
        })
    }

    #[inline]
    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    #[inline]
    pub fn fs_info(&self) -> &FsInfo {
        &self.info
    }

    #[inline]
    pub fn partition_start(&self) -> u64 {
        self.partition_start
    }

    #[inline]
    pub fn root_cluster(&self) -> u32 {
        self.boot.root_directory_cluster
    }

    #[inline]
    pub fn cluster_size(&self) -> usize {
        self.boot.cluster_size() as usize
    }

    pub fn fat_region_start(&self) -> u64 {
        self.partition_start + self.boot.reserved_sectors as u64
    }

    pub fn data_region_start(&self) -> u64 {
        self.fat_region_start()
            + self.boot.number_of_fats as u64 * self.boot.sectors_per_fat_long as u64
    }

    /// First sector of `cluster`. Cluster numbering starts at 2.
    pub fn cluster_lba(&self, cluster: u32) -> u64 {
        // clusters 0 and 1 wrap to an LBA no device has, so reads of them fail
        self.data_region_start().wrapping_add(
            (cluster as u64)
                .wrapping_sub(2)
                .wrapping_mul(self.boot.sectors_per_cluster as u64),
        )
    }

    pub fn free_size(&self) -> u64 {
        self.info.free_clusters as u64 * self.boot.sectors_per_cluster as u64 * SECTOR_SIZE as u64
    }

    /// Number of entries the FAT can hold, no chain can be longer than this.
    pub fn max_chain_length(&self) -> u64 {
        self.boot.sectors_per_fat_long as u64 * (SECTOR_SIZE / 4) as u64
    }

    /// First sector of the cluster-sized FAT window holding the entry of
    /// `cluster`, and the entry offset inside that window.
    fn fat_window(&self, cluster: u32) -> (u64, usize) {
        let cluster_size = self.cluster_size() as u64;
        let byte_offset = cluster as u64 * 4;

        let window = byte_offset / cluster_size;
        let lba = self.fat_region_start() + window * self.boot.sectors_per_cluster as u64;
        (lba, (byte_offset % cluster_size) as usize)
    }

    /// Raw FAT entry of `cluster`, masked to 28 bits.
    pub fn read_fat_value(&mut self, disk: &mut dyn SectorDevice, cluster: u32) -> Result<u32> {
        let (lba, offset) = self.fat_window(cluster);

        disk.read_sectors(lba, self.boot.sectors_per_cluster as u32, &mut self.fat)?;
        let value = LittleEndian::read_u32(&self.fat[offset..offset + 4]) & FAT_ENTRY_MASK;
        trace!("FAT[{}] = {:#010x} (LBA {})", cluster, value, lba);

        Ok(value)
    }

    pub fn chain_link(&mut self, disk: &mut dyn SectorDevice, cluster: u32) -> ChainLink {
        match self.read_fat_value(disk, cluster) {
            Ok(value) => ChainLink::from_fat_value(value),
            Err(e) => {
                debug!("FAT lookup for cluster {} failed: {}", cluster, e);
                ChainLink::ReadFailure
            }
        }
    }

    /// Next cluster of the chain: 0 when the chain ends or the FAT could not
    /// be read, `BAD_CLUSTER` when the chain is corrupted.
    pub fn next_cluster(&mut self, disk: &mut dyn SectorDevice, cluster: u32) -> u32 {
        self.chain_link(disk, cluster).to_compat()
    }

    /// `Ok(None)` on end of chain; bad clusters and FAT read failures are errors.
    pub(crate) fn follow(
        &mut self,
        disk: &mut dyn SectorDevice,
        cluster: u32,
    ) -> Result<Option<u32>> {
        match self.chain_link(disk, cluster) {
            ChainLink::Next(next) => Ok(Some(next)),
            ChainLink::EndOfChain => Ok(None),
            ChainLink::Bad => Err(Error::CorruptedChain { cluster }),
            ChainLink::ReadFailure => Err(Error::ReadFailed {
                lba: self.fat_window(cluster).0,
                count: self.boot.sectors_per_cluster as u32,
            }),
        }
    }

    /// Load `cluster` into the shared cluster buffer.
    pub(crate) fn read_cluster(&mut self, disk: &mut dyn SectorDevice, cluster: u32) -> Result<()> {
        if cluster < 2 {
            return Err(Error::CorruptedChain { cluster });
        }

        let lba = self.cluster_lba(cluster);
        trace!("reading cluster {} at LBA {}", cluster, lba);
        disk.read_sectors(lba, self.boot.sectors_per_cluster as u32, &mut self.cluster)
    }

    #[inline]
    pub(crate) fn cluster_buffer(&self) -> &[u8] {
        self.cluster.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat::chain::{BAD_CLUSTER, END_OF_CHAIN};
    use crate::fs::fat::testing::{ImageBuilder, TestDisk};

    #[test]
    fn test_cluster_lba_reference_geometry() {
        crate::tests_init();

        let image = ImageBuilder::new(2048, 4)
            .reserved_sectors(32)
            .sectors_per_fat(1000)
            .data_clusters(4);
        let partition = image.partition();
        let mut disk = image.build();

        let volume = Volume::load(&mut disk, &partition).unwrap();
        assert_eq!(volume.fat_region_start(), 2080);
        assert_eq!(volume.data_region_start(), 4080);
        assert_eq!(volume.cluster_lba(2), 4080);
        for n in 2..64 {
            assert_eq!(volume.cluster_lba(n + 1) - volume.cluster_lba(n), 4);
        }
        assert_eq!(volume.root_cluster(), 2);
        assert_eq!(volume.cluster_size(), 2048);
    }

    #[test]
    fn test_read_fat_value_masks_and_locates() {
        crate::tests_init();

        let mut image = ImageBuilder::new(0, 4).data_clusters(8);
        image.set_fat(3, 0xF000_0004);
        // past the first cluster-sized window of the FAT
        image.set_fat(700, 0x0000_0123);
        image.set_fat(5, BAD_CLUSTER);
        image.set_fat(6, END_OF_CHAIN);
        image.set_fat(7, 0xFFFF_FFFF);
        let partition = image.partition();
        let mut disk = image.build();

        let mut volume = Volume::load(&mut disk, &partition).unwrap();
        assert_eq!(volume.read_fat_value(&mut disk, 3).unwrap(), 4);
        assert_eq!(volume.read_fat_value(&mut disk, 700).unwrap(), 0x123);

        assert_eq!(volume.next_cluster(&mut disk, 3), 4);
        assert_eq!(volume.next_cluster(&mut disk, 700), 0x123);
        assert_eq!(volume.next_cluster(&mut disk, 5), BAD_CLUSTER);
        assert_eq!(volume.next_cluster(&mut disk, 6), 0);
        assert_eq!(volume.next_cluster(&mut disk, 7), 0);

        assert_eq!(volume.chain_link(&mut disk, 5), ChainLink::Bad);
        assert_eq!(volume.chain_link(&mut disk, 7), ChainLink::EndOfChain);
        assert!(matches!(
            volume.follow(&mut disk, 5),
            Err(Error::CorruptedChain { cluster: 5 })
        ));
        assert_eq!(volume.follow(&mut disk, 6).unwrap(), None);
    }

    #[test]
    fn test_fat_read_failure() {
        crate::tests_init();

        let mut image = ImageBuilder::new(0, 1).data_clusters(8);
        image.set_fat(3, 4);
        let fat_start = image.fat_region_start();
        let partition = image.partition();
        let mut disk = TestDisk::new(image.build());

        let mut volume = Volume::load(&mut disk, &partition).unwrap();
        disk.fail_lba(fat_start);

        assert_eq!(volume.chain_link(&mut disk, 3), ChainLink::ReadFailure);
        assert_eq!(volume.next_cluster(&mut disk, 3), 0);
        assert!(matches!(
            volume.read_fat_value(&mut disk, 3),
            Err(Error::ReadFailed { .. })
        ));
        assert!(matches!(
            volume.follow(&mut disk, 3),
            Err(Error::ReadFailed { lba, count: 1 }) if lba == fat_start
        ));

        disk.clear_failures();
        assert_eq!(volume.follow(&mut disk, 3).unwrap(), Some(4));
    }

    #[test]
    fn test_load_failures() {
        crate::tests_init();

        let image = ImageBuilder::new(0, 1).data_clusters(4);
        let partition = image.partition();
        let mut disk = TestDisk::new(image.build());
        disk.fail_lba(1);
        assert!(matches!(
            Volume::load(&mut disk, &partition),
            Err(Error::ReadFailed { lba: 1, count: 1 })
        ));

        let image = ImageBuilder::new(0, 1).data_clusters(4);
        let partition = image.partition();
        let mut disk = image.build();
        disk.write_at(13, &[0]);
        assert!(matches!(
            Volume::load(&mut disk, &partition),
            Err(Error::InvalidBpb)
        ));
    }

    #[test]
    fn test_free_size() {
        crate::tests_init();

        let image = ImageBuilder::new(0, 8).data_clusters(4).free_clusters(1000);
        let partition = image.partition();
        let mut disk = image.build();

        let volume = Volume::load(&mut disk, &partition).unwrap();
        assert_eq!(volume.free_size(), 1000 * 8 * 512);
    }

    #[test]
    fn test_clusters_below_two_are_rejected() {
        crate::tests_init();

        let image = ImageBuilder::new(0, 1).data_clusters(4);
        let partition = image.partition();
        let mut disk = image.build();

        let mut volume = Volume::load(&mut disk, &partition).unwrap();
        assert!(volume.read_cluster(&mut disk, 0).is_err());
        assert!(volume.read_cluster(&mut disk, 1).is_err());
        assert!(volume.read_cluster(&mut disk, 2).is_ok());
    }
}
