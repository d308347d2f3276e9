//! GPMF base types, identified by a single ASCII type code
//! in the node header.

use std::fmt;

use crate::GpmfError;

/// GPMF base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `b`
    I8,
    /// `B`
    U8,
    /// `c`, single byte char. Grouped into strings per sample.
    Char,
    /// `d`
    F64,
    /// `f`
    F32,
    /// `F`
    FourCC,
    /// `G`, 128-bit ID
    Guid,
    /// `j`
    I64,
    /// `J`
    U64,
    /// `l`
    I32,
    /// `L`
    U32,
    /// `q`, Q15.16 fixed point
    Fixed32,
    /// `Q`, Q31.32 fixed point
    Fixed64,
    /// `s`
    I16,
    /// `S`
    U16,
    /// `U`, UTC date time as `yymmddhhmmss.sss`
    Utc,
    /// `?`, described by a preceding `TYPE` node
    Complex,
    /// `0`, contains other nodes
    Nested,
}

impl BaseType {
    pub fn from_u8(code: u8) -> Result<Self, GpmfError> {
        let base_type = match code {
            b'b' => Self::I8,
            b'B' => Self::U8,
            b'c' => Self::Char,
            b'd' => Self::F64,
            b'f' => Self::F32,
            b'F' => Self::FourCC,
            b'G' => Self::Guid,
            b'j' => Self::I64,
            b'J' => Self::U64,
            b'l' => Self::I32,
            b'L' => Self::U32,
            b'q' => Self::Fixed32,
            b'Q' => Self::Fixed64,
            b's' => Self::I16,
            b'S' => Self::U16,
            b'U' => Self::Utc,
            b'?' => Self::Complex,
            0 => Self::Nested,
            _ => return Err(GpmfError::UnknownBaseType(code)),
        };
        Ok(base_type)
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            Self::I8 => b'b',
            Self::U8 => b'B',
            Self::Char => b'c',
            Self::F64 => b'd',
            Self::F32 => b'f',
            Self::FourCC => b'F',
            Self::Guid => b'G',
            Self::I64 => b'j',
            Self::U64 => b'J',
            Self::I32 => b'l',
            Self::U32 => b'L',
            Self::Fixed32 => b'q',
            Self::Fixed64 => b'Q',
            Self::I16 => b's',
            Self::U16 => b'S',
            Self::Utc => b'U',
            Self::Complex => b'?',
            Self::Nested => 0,
        }
    }

    /// Size in bytes of a single value.
    /// 0 for complex and nested types.
    pub fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::Char => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 | Self::FourCC | Self::Fixed32 => 4,
            Self::I64 | Self::U64 | Self::F64 | Self::Fixed64 => 8,
            Self::Guid | Self::Utc => 16,
            Self::Complex | Self::Nested => 0,
        }
    }

    /// `true` for types that convert to floating point.
    pub fn is_numeric(&self) -> bool {
        matches!(self,
            Self::I8 | Self::U8 | Self::I16 | Self::U16
            | Self::I32 | Self::U32 | Self::I64 | Self::U64
            | Self::F32 | Self::F64 | Self::Fixed32 | Self::Fixed64
        )
    }

    /// Expands a `TYPE` definition into one base type per field.
    /// `[n]` repeats the preceding type code `n` times in total,
    /// e.g. `f[3]L` is `fffL`. Trailing null bytes are ignored.
    pub fn expand_complex(definition: &[u8]) -> Result<Vec<Self>, GpmfError> {
        let invalid = || GpmfError::InvalidComplexType(
            String::from_utf8_lossy(definition).trim_end_matches('\0').to_owned()
        );

        let mut fields: Vec<Self> = Vec::new();
        let mut codes = definition.iter()
            .take_while(|b| **b != 0);

        while let Some(code) = codes.next() {
            if *code == b'[' {
                let previous = *fields.last().ok_or_else(invalid)?;
                let mut n = 0_usize;
                loop {
                    match codes.next() {
                        Some(b']') => break,
                        Some(d) if d.is_ascii_digit() => {
                            n = n * 10 + (d - b'0') as usize;
                            // struct size is at most 255 bytes
                            if n > u8::MAX as usize {
                                return Err(invalid())
                            }
                        },
                        _ => return Err(invalid()),
                    }
                }
                if n == 0 {
                    return Err(invalid())
                }
                fields.extend(std::iter::repeat(previous).take(n - 1));
            } else {
                match Self::from_u8(*code)? {
                    Self::Complex | Self::Nested => return Err(invalid()),
                    t => fields.push(t),
                }
            }

            if fields.len() > u8::MAX as usize {
                return Err(invalid())
            }
        }

        Ok(fields)
    }
}

impl TryFrom<u8> for BaseType {
    type Error = GpmfError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nested => write!(f, "nested"),
            t => write!(f, "{}", t.to_u8() as char),
        }
    }
}
