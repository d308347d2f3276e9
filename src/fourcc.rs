//! MP4 atom FourCC.
//! See https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFChap2/qtff2.html#//apple_ref/doc/uid/TP40000939-CH204-56313.
//! Some non-standard Four CC listed, stemming from GoPro MP4-files.

use std::fmt;

use crate::{support::string_from_bytes, GpmfError};

/// MP4 atom Four CC.
/// Only atoms needed to locate the telemetry track
/// have their own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FourCC {
    /// Data Information Atoms
    Dinf,
    Edts,
    Hdlr,
    Mdat,
    Mdhd,
    Mdia,
    Minf,
    /// Movie Atom
    Moov,
    /// Movie Header Atom
    Mvhd,
    Stbl,
    /// Chunk offset, 32-bit values
    Stco,
    /// Chunk offset, 64-bit values
    Co64,
    Stsc,
    Stsd,
    Stsz,
    /// Compact sample sizes
    Stz2,
    Stts,
    Tkhd,
    /// Track description
    Trak,
    Tref,
    /// User data
    Udta,
    /// GoPro GPMF in user data (`moov/udta/GPMF`)
    Gpmf,

    Custom([u8; 4])
}

impl FourCC {
    pub fn from_bytes(fourcc: [u8; 4]) -> Self {
        match &fourcc {
            b"dinf" => Self::Dinf,
            b"edts" => Self::Edts,
            b"hdlr" => Self::Hdlr,
            b"mdat" => Self::Mdat,
            b"mdhd" => Self::Mdhd,
            b"mdia" => Self::Mdia,
            b"minf" => Self::Minf,
            b"moov" => Self::Moov,
            b"mvhd" => Self::Mvhd,
            b"stbl" => Self::Stbl,
            b"stco" => Self::Stco,
            b"co64" => Self::Co64,
            b"stsc" => Self::Stsc,
            b"stsd" => Self::Stsd,
            b"stsz" => Self::Stsz,
            b"stz2" => Self::Stz2,
            b"stts" => Self::Stts,
            b"tkhd" => Self::Tkhd,
            b"trak" => Self::Trak,
            b"tref" => Self::Tref,
            b"udta" => Self::Udta,
            b"GPMF" => Self::Gpmf, // capitals in file
            _ => Self::Custom(fourcc),
        }
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_bytes(value.to_be_bytes())
    }

    /// FourCC from string literal, e.g. `"stco"`.
    /// Must be exactly four single byte characters.
    pub fn from_str(fourcc: &str) -> Result<Self, GpmfError> {
        let bytes: [u8; 4] = fourcc.as_bytes()
            .try_into()
            .map_err(|_| GpmfError::InvalidFourCC(fourcc.to_owned()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        match self {
            Self::Dinf => *b"dinf",
            Self::Edts => *b"edts",
            Self::Hdlr => *b"hdlr",
            Self::Mdat => *b"mdat",
            Self::Mdhd => *b"mdhd",
            Self::Mdia => *b"mdia",
            Self::Minf => *b"minf",
            Self::Moov => *b"moov",
            Self::Mvhd => *b"mvhd",
            Self::Stbl => *b"stbl",
            Self::Stco => *b"stco",
            Self::Co64 => *b"co64",
            Self::Stsc => *b"stsc",
            Self::Stsd => *b"stsd",
            Self::Stsz => *b"stsz",
            Self::Stz2 => *b"stz2",
            Self::Stts => *b"stts",
            Self::Tkhd => *b"tkhd",
            Self::Trak => *b"trak",
            Self::Tref => *b"tref",
            Self::Udta => *b"udta",
            Self::Gpmf => *b"GPMF",
            Self::Custom(b) => *b,
        }
    }

    /// Returns `true` for atoms that only contain other atoms.
    pub fn is_container(&self) -> bool {
        crate::CONTAINER.contains(&&self.to_bytes())
    }
}

impl Default for FourCC {
    fn default() -> Self {
        Self::Custom([0; 4])
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ISO8859-1, since e.g. GoPro uses bytes above ascii range
        write!(f, "{}", string_from_bytes(&self.to_bytes(), false))
    }
}
