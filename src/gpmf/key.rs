//! GPMF FourCC key.

use std::{fmt, str::FromStr};

use crate::{support::chars_from_bytes, GpmfError};

/// Four byte GPMF key, e.g. `DEVC`, `STRM`, `GPS5`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub [u8; 4]);

impl Key {
    /// Device container
    pub const DEVC: Key = Key(*b"DEVC");
    /// Device ID
    pub const DVID: Key = Key(*b"DVID");
    /// Device name
    pub const DVNM: Key = Key(*b"DVNM");
    /// Stream container
    pub const STRM: Key = Key(*b"STRM");
    /// Stream name
    pub const STNM: Key = Key(*b"STNM");
    /// Comment
    pub const RMRK: Key = Key(*b"RMRK");
    /// Scale divisors
    pub const SCAL: Key = Key(*b"SCAL");
    /// SI units
    pub const SIUN: Key = Key(*b"SIUN");
    /// Non-SI units
    pub const UNIT: Key = Key(*b"UNIT");
    /// Complex type definition
    pub const TYPE: Key = Key(*b"TYPE");
    /// Total samples delivered
    pub const TSMP: Key = Key(*b"TSMP");
    /// Time offset
    pub const TIMO: Key = Key(*b"TIMO");
    /// Empty payload count
    pub const EMPT: Key = Key(*b"EMPT");
    /// Input orientation
    pub const ORIN: Key = Key(*b"ORIN");
    /// Output orientation
    pub const ORIO: Key = Key(*b"ORIO");
    /// Orientation matrix
    pub const MTRX: Key = Key(*b"MTRX");
    pub const TICK: Key = Key(*b"TICK");
    pub const TOCK: Key = Key(*b"TOCK");
    /// Microsecond timestamp
    pub const STMP: Key = Key(*b"STMP");
    pub const QUAN: Key = Key(*b"QUAN");
    pub const VERS: Key = Key(*b"VERS");
    /// GPS latitude, longitude, altitude, 2D speed, 3D speed
    pub const GPS5: Key = Key(*b"GPS5");
    /// GPS time (`U`)
    pub const GPSU: Key = Key(*b"GPSU");
    /// GPS fix
    pub const GPSF: Key = Key(*b"GPSF");
    /// GPS precision (dilution of precision x 100)
    pub const GPSP: Key = Key(*b"GPSP");
    pub const GYRO: Key = Key(*b"GYRO");
    pub const ACCL: Key = Key(*b"ACCL");

    /// Keys describing a stream rather than holding its samples.
    pub const METADATA: [Key; 19] = [
        Self::STNM, Self::SIUN, Self::UNIT, Self::SCAL, Self::TYPE,
        Self::TSMP, Self::TIMO, Self::EMPT, Self::ORIN, Self::ORIO,
        Self::MTRX, Self::RMRK, Self::TICK, Self::TOCK, Self::STMP,
        Self::QUAN, Self::VERS, Self::DVID, Self::DVNM,
    ];

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// All null bytes, i.e. padding.
    pub fn is_null(&self) -> bool {
        self.0 == [0; 4]
    }

    pub fn is_metadata(&self) -> bool {
        Self::METADATA.contains(self)
    }
}

impl From<[u8; 4]> for Key {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Key {
    type Err = GpmfError;

    /// Key from string literal, e.g. `"GPS5"`.
    /// Must be exactly four single byte characters.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        key.as_bytes()
            .try_into()
            .map(Self)
            .map_err(|_| GpmfError::InvalidFourCC(key.to_owned()))
    }
}

impl TryFrom<&str> for Key {
    type Error = GpmfError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::from_str(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in chars_from_bytes(self.0) {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}
