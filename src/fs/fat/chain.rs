//! FAT entry values and how a chain step is classified.

/// FAT32 entries only use the low 28 bits.
pub const FAT_ENTRY_MASK: u32 = 0x0FFF_FFFF;
/// Any value at or above this ends a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;
/// Cluster marked unusable.
pub const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// Outcome of following one link of a cluster chain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChainLink {
    Next(u32),
    EndOfChain,
    Bad,
    ReadFailure,
}

impl ChainLink {
    /// Classify an already masked FAT value.
    pub fn from_fat_value(value: u32) -> Self {
        match value {
            x if x >= END_OF_CHAIN => ChainLink::EndOfChain,
            BAD_CLUSTER => ChainLink::Bad,
            // a free entry inside a chain links nowhere
            0 => ChainLink::EndOfChain,
            x => ChainLink::Next(x),
        }
    }

    /// Collapse into the single number callers of `next_cluster` expect:
    /// 0 for end of chain or read failure, the bad marker as is.
    pub fn to_compat(self) -> u32 {
        match self {
            ChainLink::Next(x) => x,
            ChainLink::Bad => BAD_CLUSTER,
            ChainLink::EndOfChain | ChainLink::ReadFailure => 0,
        }
    }
}
