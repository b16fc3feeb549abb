use std::{io, result};

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("failed to read {count} sector(s) at LBA {lba}")]
    ReadFailed { lba: u64, count: u32 },
    #[error("volume unavailable, boot or FS information sector could not be read")]
    VolumeUnavailable,
    #[error("cluster chain corrupted at cluster {cluster:#x}")]
    CorruptedChain { cluster: u32 },
    #[error("MBR is missing")]
    MbrMissing,
    #[error("invalid BPB")]
    InvalidBpb,
    #[error("not found")]
    NotFound,
}
