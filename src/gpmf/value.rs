//! Decoded GPMF values.

use std::fmt;

use time::{Date, Month, PrimitiveDateTime, Time};

use crate::GpmfError;

use super::{BaseType, Key};

/// A single decoded value. Numeric data is
/// converted from big endian.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    U8(u8),
    /// One or more `c` values
    String(String),
    F64(f64),
    F32(f32),
    FourCC(Key),
    Guid([u8; 16]),
    I64(i64),
    U64(u64),
    I32(i32),
    U32(u32),
    /// Q15.16, raw
    Fixed32(i32),
    /// Q31.32, raw
    Fixed64(i64),
    I16(i16),
    U16(u16),
    Utc(PrimitiveDateTime),
}

impl Value {
    /// Decodes a single value of type `base_type` from `bytes`,
    /// which must be exactly `base_type.size()` long
    /// (any length for `Char`).
    pub(crate) fn decode(key: Key, base_type: BaseType, bytes: &[u8]) -> Result<Self, GpmfError> {
        let unsupported = || GpmfError::UnsupportedConversion {
            key: key.to_string(),
            base_type: base_type.to_u8(),
        };
        let corrupt = || GpmfError::CorruptNode {
            key: key.to_string(),
            offset: 0,
        };

        if base_type != BaseType::Char && bytes.len() != base_type.size() {
            return match base_type {
                BaseType::Complex | BaseType::Nested => Err(unsupported()),
                _ => Err(corrupt()),
            }
        }

        let value = match base_type {
            BaseType::I8 => Self::I8(bytes[0] as i8),
            BaseType::U8 => Self::U8(bytes[0]),
            BaseType::Char => Self::String(chars(bytes)),
            BaseType::F64 => Self::F64(f64::from_be_bytes(array(bytes)?)),
            BaseType::F32 => Self::F32(f32::from_be_bytes(array(bytes)?)),
            BaseType::FourCC => Self::FourCC(Key(array(bytes)?)),
            BaseType::Guid => Self::Guid(array(bytes)?),
            BaseType::I64 => Self::I64(i64::from_be_bytes(array(bytes)?)),
            BaseType::U64 => Self::U64(u64::from_be_bytes(array(bytes)?)),
            BaseType::I32 => Self::I32(i32::from_be_bytes(array(bytes)?)),
            BaseType::U32 => Self::U32(u32::from_be_bytes(array(bytes)?)),
            BaseType::Fixed32 => Self::Fixed32(i32::from_be_bytes(array(bytes)?)),
            BaseType::Fixed64 => Self::Fixed64(i64::from_be_bytes(array(bytes)?)),
            BaseType::I16 => Self::I16(i16::from_be_bytes(array(bytes)?)),
            BaseType::U16 => Self::U16(u16::from_be_bytes(array(bytes)?)),
            BaseType::Utc => Self::Utc(parse_utc(bytes)?),
            BaseType::Complex | BaseType::Nested => return Err(unsupported()),
        };

        Ok(value)
    }

    /// Decodes a numeric value directly to `f64`
    /// without going via `Value`.
    /// Returns `None` for non-numeric types or wrong length.
    pub(crate) fn numeric(base_type: BaseType, bytes: &[u8]) -> Option<f64> {
        let value = match base_type {
            BaseType::I8 => *bytes.first()? as i8 as f64,
            BaseType::U8 => *bytes.first()? as f64,
            BaseType::I16 => i16::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::U16 => u16::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::I32 => i32::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::U32 => u32::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::I64 => i64::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::U64 => u64::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::F32 => f32::from_be_bytes(bytes.try_into().ok()?) as f64,
            BaseType::F64 => f64::from_be_bytes(bytes.try_into().ok()?),
            BaseType::Fixed32 => i32::from_be_bytes(bytes.try_into().ok()?) as f64 / 65536.0,
            BaseType::Fixed64 => i64::from_be_bytes(bytes.try_into().ok()?) as f64 / 4294967296.0,
            _ => return None,
        };
        Some(value)
    }

    pub fn base_type(&self) -> BaseType {
        match self {
            Self::I8(_) => BaseType::I8,
            Self::U8(_) => BaseType::U8,
            Self::String(_) => BaseType::Char,
            Self::F64(_) => BaseType::F64,
            Self::F32(_) => BaseType::F32,
            Self::FourCC(_) => BaseType::FourCC,
            Self::Guid(_) => BaseType::Guid,
            Self::I64(_) => BaseType::I64,
            Self::U64(_) => BaseType::U64,
            Self::I32(_) => BaseType::I32,
            Self::U32(_) => BaseType::U32,
            Self::Fixed32(_) => BaseType::Fixed32,
            Self::Fixed64(_) => BaseType::Fixed64,
            Self::I16(_) => BaseType::I16,
            Self::U16(_) => BaseType::U16,
            Self::Utc(_) => BaseType::Utc,
        }
    }

    /// Numeric values as `f64`, with fixed point
    /// values converted. `None` for strings, FourCC, GUID, and date time.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I8(v) => Some(*v as f64),
            Self::U8(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            Self::F32(v) => Some(*v as f64),
            Self::I64(v) => Some(*v as f64),
            Self::U64(v) => Some(*v as f64),
            Self::I32(v) => Some(*v as f64),
            Self::U32(v) => Some(*v as f64),
            Self::Fixed32(v) => Some(*v as f64 / 65536.0),
            Self::Fixed64(v) => Some(*v as f64 / 4294967296.0),
            Self::I16(v) => Some(*v as f64),
            Self::U16(v) => Some(*v as f64),
            Self::String(_) | Self::FourCC(_) | Self::Guid(_) | Self::Utc(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Host byte order. Strings, FourCC and GUID as stored,
    /// date time re-formatted as `yymmddhhmmss.sss`.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match self {
            Self::I8(v) => v.to_ne_bytes().to_vec(),
            Self::U8(v) => vec![*v],
            Self::String(s) => s.chars().map(|c| c as u32 as u8).collect(),
            Self::F64(v) => v.to_ne_bytes().to_vec(),
            Self::F32(v) => v.to_ne_bytes().to_vec(),
            Self::FourCC(k) => k.0.to_vec(),
            Self::Guid(g) => g.to_vec(),
            Self::I64(v) => v.to_ne_bytes().to_vec(),
            Self::U64(v) => v.to_ne_bytes().to_vec(),
            Self::I32(v) => v.to_ne_bytes().to_vec(),
            Self::U32(v) => v.to_ne_bytes().to_vec(),
            Self::Fixed32(v) => v.to_ne_bytes().to_vec(),
            Self::Fixed64(v) => v.to_ne_bytes().to_vec(),
            Self::I16(v) => v.to_ne_bytes().to_vec(),
            Self::U16(v) => v.to_ne_bytes().to_vec(),
            Self::Utc(dt) => format!(
                "{:02}{:02}{:02}{:02}{:02}{:02}.{:03}",
                dt.year().rem_euclid(100),
                dt.month() as u8,
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.millisecond()
            ).into_bytes(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::FourCC(v) => write!(f, "{v}"),
            Self::Guid(v) => {
                for b in v.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            },
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::Utc(v) => write!(f, "{v}"),
            v @ (Self::Fixed32(_) | Self::Fixed64(_)) => match v.as_f64() {
                Some(n) => write!(f, "{n}"),
                None => Ok(()),
            },
        }
    }
}

fn array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], GpmfError> {
    bytes.try_into()
        .map_err(|_| GpmfError::BufferTooSmall{got: bytes.len(), required: N})
}

/// Single byte chars, null bytes removed.
fn chars(bytes: &[u8]) -> String {
    crate::support::string_from_bytes(bytes, true)
}

/// Parses GPMF date time `yymmddhhmmss.sss`, e.g. `"240131124559.250"`.
/// Years are in the 2000s.
pub(crate) fn parse_utc(bytes: &[u8]) -> Result<PrimitiveDateTime, GpmfError> {
    let text = String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_owned();
    let invalid = || GpmfError::InvalidTimestamp(text.clone());

    let field = |range: std::ops::Range<usize>| -> Result<u16, GpmfError> {
        text.get(range)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(invalid)
    };

    let year = 2000 + field(0 .. 2)? as i32;
    let month = Month::try_from(field(2 .. 4)? as u8).map_err(|_| invalid())?;
    let day = field(4 .. 6)? as u8;
    let hour = field(6 .. 8)? as u8;
    let minute = field(8 .. 10)? as u8;
    let second = field(10 .. 12)? as u8;
    let millisecond = match text.get(12 ..) {
        None | Some("") => 0,
        Some(s) if s.starts_with('.') && s.len() == 4 => field(13 .. 16)?,
        Some(_) => return Err(invalid()),
    };

    let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
    let time = Time::from_hms_milli(hour, minute, second, millisecond).map_err(|_| invalid())?;

    Ok(PrimitiveDateTime::new(date, time))
}
