//! Track header atom (`tkhd`).
//!
//! Location: `moov/trak[multiple]/tkhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>

use binrw::BinRead;

use super::mdhd::version_sized;

/// Track header atom (`tkhd`).
/// Only the fields up to and including the track ID are parsed.
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct Tkhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    #[br(parse_with = version_sized, args(version))]
    pub(crate) creation_time: u64,
    #[br(parse_with = version_sized, args(version))]
    pub(crate) modification_time: u64,
    /// Uniquely identifies the track.
    /// Value 0 cannot be used.
    pub(crate) track_id: u32,
}

impl Tkhd {
    pub fn track_id(&self) -> u32 {
        self.track_id
    }
}
