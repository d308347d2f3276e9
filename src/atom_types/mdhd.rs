//! Media header atom (`mdhd`).
//!
//! Similar to `mvhd`,
//! but only describes a single track (`trak`).
//! Specifies the characteristics of a media (`mdia`),
//! including time scale and duration.
//!
//! Location: `moov/trak/mdia/mdhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>

use binrw::BinRead;
use time::{ext::NumericalDuration, Duration};

/// Media header atom ('mdhd'). One per track (`trak`).
/// Specifies the characteristics of a media (`mdia`), including time scale and duration.
///
/// Version 1 uses 64-bit creation/modification times and duration.
///
/// Path: `moov/trak/mdia/mdhd`
#[derive(Debug, Default, Clone, BinRead)]
#[br(big)]
pub struct Mdhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    #[br(parse_with = version_sized, args(version))]
    pub(crate) creation_time: u64, // should be UTC
    #[br(parse_with = version_sized, args(version))]
    pub(crate) modification_time: u64, // should be UTC
    pub(crate) time_scale: u32,
    /// Unscaled duration. I.e. "ticks"
    /// that require dividing by time scale
    /// to derive a value in seconds.
    #[br(parse_with = version_sized, args(version))]
    pub(crate) duration: u64,
    // 1 bit pad 0 then [u5; 3]
    #[br(map = |data: u16| derive_language_code(data))]
    pub(crate) language: String,
    pub(crate) quality: u16,
}

impl Mdhd {
    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn duration_unscaled(&self) -> u64 {
        self.duration
    }

    /// ISO-639-2/T language code
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Duration of the track.
    /// Zero if time scale is not set.
    pub fn duration(&self) -> Duration {
        match self.time_scale {
            0 => Duration::ZERO,
            ts => (self.duration as f64 / ts as f64).seconds(),
        }
    }
}

/// Reads a 32-bit value for version 0 atoms,
/// and a 64-bit value for version 1 atoms.
#[binrw::parser(reader, endian)]
pub(crate) fn version_sized(version: u8) -> binrw::BinResult<u64> {
    match version {
        1 => u64::read_options(reader, endian, ()),
        _ => u32::read_options(reader, endian, ()).map(u64::from),
    }
}

/// Derive three letter ISO639-2/T language code.
///
/// Packed in 16 bits `X u5 u5 u5`:
/// - most significant bit is padding (BE so left most)
/// - 1 `u5` + `0x60`
/// - 1 `u5` + `0x60`
/// - 1 `u5` + `0x60`
fn derive_language_code(data: u16) -> String {
    [
        // value between 0-31 + 96 = ascii range so casting to u8 is ok
        (((0b0111_1100_0000_0000 & data) >> 10) as u8 + 0x60) as char,
        (((0b0000_0011_1110_0000 & data) >> 5) as u8 + 0x60) as char,
        ((0b0000_0000_0001_1111 & data) as u8 + 0x60) as char
    ]
    .iter()
    .collect()
}
