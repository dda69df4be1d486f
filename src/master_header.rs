//! NuFX Master Header Block: the fixed 48-byte structure at the start of a
//! ShrinkIt archive.
//!
//! # Layout (all integers little-endian)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 6  | NuFile ID `4e f5 46 e9 6c e5` |
//! | 6  | 2  | master CRC |
//! | 8  | 4  | total records |
//! | 12 | 8  | archive create when (TimeRec) |
//! | 20 | 8  | archive mod when (TimeRec) |
//! | 28 | 2  | master version |
//! | 30 | 8  | reserved |
//! | 38 | 4  | master EOF (total archive length) |
//! | 42 | 6  | reserved |
//!
//! The master CRC is CRC-16/XMODEM over bytes 8..48.  A mismatch does not
//! fail decoding; it is reported by [`MasterHeaderBlock::is_valid_crc`] so a
//! caller can still read a damaged archive and warn.
//!
//! An archive may be preceded by leading garbage or wrapped in a single-file
//! Binary II envelope; [`MasterHeaderBlock::locate`] deals with both.

use thiserror::Error;
use tracing::{debug, warn};

use crate::byte_source::{ByteSource, ByteSourceError};
use crate::timestamp::Timestamp;

/// Size of the master header in bytes.
pub const MASTER_HEADER_LEN: usize = 48;
/// Offset where the CRC-protected region starts.
pub const MASTER_CRC_START:  usize = 8;
/// Master Header Block ID ("NuFile" in alternating high ASCII).
pub const NUFILE_ID: [u8; 6] = [0x4e, 0xf5, 0x46, 0xe9, 0x6c, 0xe5];
/// Record Header Block ID ("NuFX").
pub const NUFX_ID:   [u8; 4] = [0x4e, 0xf5, 0x46, 0xd8];
/// Binary II header ID.
pub const BXY_ID:    [u8; 3] = [0x0a, 0x47, 0x4c];
/// Size of a Binary II file header.
pub const BXY_HEADER_LEN: usize = 128;
/// Offset of the "files to follow" count inside a Binary II header.
const BXY_FILES_TO_FOLLOW: usize = 127;

const MASTER_RESERVED_1: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MasterHeaderError {
    #[error("Truncated master header: {0}")]
    OutOfBounds(#[from] ByteSourceError),
    #[error("No NuFX master header found")]
    UnknownFormat,
    #[error("Truncated Binary II header at offset {offset}: {available} of 128 bytes present")]
    TruncatedBinaryIi { offset: usize, available: usize },
    #[error("Binary II wrapper announces {0} more file(s); only single-file wrappers are supported")]
    BinaryIiMultiFile(u8),
}

// ── ArchiveKind ───────────────────────────────────────────────────────────────

/// What a signature scan found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A NuFX archive starting with a Master Header Block.
    NuFile,
    /// A bare Record Header Block with no master header in front of it.
    NuFx,
    /// A Binary II envelope.
    BinaryIi,
}

impl ArchiveKind {
    /// Find the first known signature within `data[..max_scan]` (a signature
    /// may run past `max_scan`).  Returns the kind and its byte offset.
    pub fn detect(data: &[u8], max_scan: usize) -> Option<(ArchiveKind, usize)> {
        let limit = max_scan.min(data.len());
        (0..limit).find_map(|pos| {
            let tail = &data[pos..];
            if tail.starts_with(&NUFILE_ID) {
                Some((ArchiveKind::NuFile, pos))
            } else if tail.starts_with(&NUFX_ID) {
                Some((ArchiveKind::NuFx, pos))
            } else if tail.starts_with(&BXY_ID) {
                Some((ArchiveKind::BinaryIi, pos))
            } else {
                None
            }
        })
    }
}

// ── LocateOptions ─────────────────────────────────────────────────────────────

/// Configuration for [`MasterHeaderBlock::locate`].
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// How many leading bytes may be skipped while looking for a signature.
    pub max_scan:        usize,
    /// Look inside a single-file Binary II envelope.
    pub allow_binary_ii: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            max_scan:        2048,
            allow_binary_ii: true,
        }
    }
}

// ── MasterHeaderBlock ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterHeaderBlock {
    id:                  [u8; 6],
    master_crc:          u16,
    computed_crc:        u16,
    total_records:       u32,
    archive_create_when: Timestamp,
    archive_mod_when:    Timestamp,
    master_version:      u16,
    master_eof:          u32,
}

impl MasterHeaderBlock {
    /// Decode the header starting at the cursor of `bs`, consuming exactly
    /// [`MASTER_HEADER_LEN`] bytes.  Fails without consuming anything when
    /// fewer bytes remain.  The ID is not checked.
    pub fn read(bs: &mut ByteSource<'_>) -> Result<Self, MasterHeaderError> {
        let start = bs.position();
        if bs.remaining() < MASTER_HEADER_LEN {
            return Err(ByteSourceError::OutOfBounds {
                offset:    start,
                requested: MASTER_HEADER_LEN,
                available: bs.remaining(),
            }
            .into());
        }

        let mut id = [0u8; 6];
        id.copy_from_slice(bs.read_bytes(NUFILE_ID.len())?);
        let master_crc          = bs.read_word()?;
        let total_records       = bs.read_long()?;
        let archive_create_when = bs.read_date()?;
        let archive_mod_when    = bs.read_date()?;
        let master_version      = bs.read_word()?;
        bs.skip(MASTER_RESERVED_1)?;
        let master_eof          = bs.read_long()?;
        bs.skip(MASTER_HEADER_LEN - (bs.position() - start))?;

        let computed_crc = bs.compute_crc16(
            start + MASTER_CRC_START,
            MASTER_HEADER_LEN - MASTER_CRC_START,
        )?;

        if master_eof >> 24 != 0 {
            warn!(
                master_eof,
                "master EOF has a non-zero high byte; archive length may be misread"
            );
        }
        if master_crc != computed_crc {
            debug!(stored = master_crc, computed = computed_crc, "master header CRC mismatch");
        }
        debug!(
            id = %hex::encode(id),
            total_records,
            master_version,
            master_eof,
            "decoded master header"
        );

        Ok(Self {
            id,
            master_crc,
            computed_crc,
            total_records,
            archive_create_when,
            archive_mod_when,
            master_version,
            master_eof,
        })
    }

    /// Find and decode the master header in a whole-archive buffer.
    ///
    /// Skips up to `opts.max_scan` bytes of leading garbage and, when allowed,
    /// one Binary II envelope.  Returns the header's offset in `data` along
    /// with the decoded header.
    pub fn locate(data: &[u8], opts: &LocateOptions) -> Result<(usize, Self), MasterHeaderError> {
        let mut base = 0;
        let mut allow_binary_ii = opts.allow_binary_ii;
        loop {
            let (kind, pos) = ArchiveKind::detect(&data[base..], opts.max_scan)
                .ok_or(MasterHeaderError::UnknownFormat)?;
            let offset = base + pos;
            debug!(?kind, offset, "archive signature");
            match kind {
                ArchiveKind::NuFile => {
                    let mut bs = ByteSource::new(data);
                    bs.skip(offset)?;
                    return Ok((offset, Self::read(&mut bs)?));
                }
                ArchiveKind::BinaryIi if allow_binary_ii => {
                    let mut bs = ByteSource::new(data);
                    bs.skip(offset)?;
                    let envelope = bs.read_bytes(BXY_HEADER_LEN).map_err(|_| {
                        MasterHeaderError::TruncatedBinaryIi {
                            offset,
                            available: data.len() - offset,
                        }
                    })?;
                    let files_to_follow = envelope[BXY_FILES_TO_FOLLOW];
                    if files_to_follow != 0 {
                        return Err(MasterHeaderError::BinaryIiMultiFile(files_to_follow));
                    }
                    base = offset + BXY_HEADER_LEN;
                    allow_binary_ii = false;
                }
                ArchiveKind::BinaryIi | ArchiveKind::NuFx => {
                    return Err(MasterHeaderError::UnknownFormat);
                }
            }
        }
    }

    /// The six ID bytes as stored.
    pub fn id(&self) -> &[u8; 6] {
        &self.id
    }

    pub fn has_nufile_id(&self) -> bool {
        self.id == NUFILE_ID
    }

    pub fn master_crc(&self) -> u16 {
        self.master_crc
    }

    /// CRC-16 recomputed over header bytes 8..48.
    pub fn computed_crc(&self) -> u16 {
        self.computed_crc
    }

    pub fn is_valid_crc(&self) -> bool {
        self.master_crc == self.computed_crc
    }

    pub fn total_records(&self) -> u32 {
        self.total_records
    }

    pub fn archive_create_when(&self) -> Timestamp {
        self.archive_create_when
    }

    pub fn archive_mod_when(&self) -> Timestamp {
        self.archive_mod_when
    }

    pub fn master_version(&self) -> u16 {
        self.master_version
    }

    /// Total archive length in bytes.  Version 0 archives leave it zero.
    pub fn master_eof(&self) -> u32 {
        self.master_eof
    }
}
