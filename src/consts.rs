use time::{macros::datetime, PrimitiveDateTime};

/// FourCC:s for known "container" atoms.
/// These are nested and contains more atoms,
/// within its specified, total size.
///
/// Only container atoms in the main MP4 tree are listed.
///
/// - `moov`: offset tables, timing, metadata, telemetry
/// - `trak`: moov.trak (multiple)
/// - `tref`: moov.trak.tref
/// - `edts`: moov.trak.edts
/// - `mdia`: moov.trak.mdia
/// - `minf`: moov.trak.mdia.minf
/// - `dinf`: moov.trak.mdia.minf.dinf
/// - `stbl`: moov.trak.mdia.minf.stbl, contains timing (stts), offsets (stco)
/// - `udta`: moov.udta, may contain custom data, specific to the device
pub const CONTAINER: [&[u8; 4]; 9] = [
    b"moov",
    b"trak",
    b"tref",
    b"edts",
    b"mdia",
    b"minf",
    b"dinf",
    b"stbl",
    b"udta",
];

/// Handler sub type for the GoPro telemetry track (`hdlr` atom).
pub const MOV_GPMF_TRAK_TYPE: [u8; 4] = *b"meta";

/// Sample description data format for the GoPro telemetry track (`stsd` atom).
pub const MOV_GPMF_TRAK_SUBTYPE: [u8; 4] = *b"gpmd";

/// Size of a GPMF node header in bytes:
/// `FourCC | type | struct size | repeat`.
pub const GPMF_HEADER_SIZE: usize = 8;

/// Hard limit for GPMF nesting depth,
/// regardless of requested recursion.
pub const MAX_NEST_DEPTH: usize = 16;

/// Time zero for MP4 containers. Midnight January 1, 1904.
pub fn mp4_time_zero() -> PrimitiveDateTime {
    datetime!(1904-01-01 0:00)
}
