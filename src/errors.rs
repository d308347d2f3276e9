//! Various MP4 and GPMF related errors.

use std::fmt;

/// Broad error categories. Several [`GpmfError`] variants
/// may map to the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File open/read failure.
    IoFailure,
    /// No track with the requested handler/format.
    TrackNotFound,
    /// Inconsistent or truncated container (box) structure.
    CorruptBox,
    /// Output buffer too small, or payload too small for a node header.
    BufferTooSmall,
    /// GPMF node implies an out-of-bounds payload, or is otherwise malformed.
    CorruptNode,
    /// Search miss. Expected, non-fatal.
    KeyNotFound,
    /// Scaling/formatting requested on an incompatible type.
    UnsupportedConversion,
    /// Payload or sample index out of range.
    IndexOutOfRange,
    /// Malformed caller input, e.g. a key that is not four bytes.
    InvalidInput,
}

/// Various MP4 and GPMF read/parse errors.
#[derive(Debug)]
pub enum GpmfError {
    /// Converted `binrw::Error`.
    BinReadError(binrw::Error),
    /// IO error
    IOError(std::io::Error),
    /// Converted `TryFromIntError`.
    TryFromIntError(std::num::TryFromIntError),
    /// No track with specified handler type and sample format.
    TrackNotFound{handler: String, format: String},
    /// Atom size or position inconsistent with its surroundings.
    CorruptBox{name: String, offset: u64, reason: &'static str},
    /// Required atom missing.
    NoSuchAtom(String),
    /// Sample tables disagree with each other.
    TableMismatch(String),
    /// Tried to read outside file: `(POSITION, LENGTH, FILE_SIZE)`.
    BoundsError(u64, u64, u64),
    /// Output buffer, or payload buffer, too small.
    BufferTooSmall{got: usize, required: usize},
    /// GPMF node extends past its scope, or header is truncated.
    CorruptNode{key: String, offset: usize},
    /// Unknown base type when decoding values.
    UnknownBaseType(u8),
    /// Missing type definition for Complex type (`63`/`?`)
    MissingComplexType,
    /// Complex type definition inconsistent with node.
    InvalidComplexType(String),
    /// Exceeded recurse depth when walking GPMF.
    RecurseDepthExceeded((usize, usize)),
    /// Invalid `U` timestamp string.
    InvalidTimestamp(String),
    /// Search did not find the FourCC.
    KeyNotFound(String),
    /// Cursor is not positioned on a usable node.
    NoNode,
    /// Conversion not possible for type.
    UnsupportedConversion{key: String, base_type: u8},
    /// `SCAL` count neither 1 nor the number of elements.
    ScaleMismatch{scales: usize, elements: usize},
    /// `SCAL` contains zero.
    ZeroScale(String),
    /// Index out of range: `(INDEX, LENGTH)`.
    IndexOutOfRange(usize, usize),
    /// Invalid FourCC. E.g. wrong length.
    InvalidFourCC(String),
}

impl GpmfError {
    /// Returns the broad error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GpmfError::IOError(_) => ErrorKind::IoFailure,
            GpmfError::BinReadError(binrw::Error::Io(_)) => ErrorKind::IoFailure,
            GpmfError::BinReadError(_)
            | GpmfError::TryFromIntError(_)
            | GpmfError::CorruptBox{..}
            | GpmfError::NoSuchAtom(_)
            | GpmfError::TableMismatch(_)
            | GpmfError::BoundsError(..) => ErrorKind::CorruptBox,
            GpmfError::TrackNotFound{..} => ErrorKind::TrackNotFound,
            GpmfError::BufferTooSmall{..} => ErrorKind::BufferTooSmall,
            GpmfError::CorruptNode{..}
            | GpmfError::UnknownBaseType(_)
            | GpmfError::MissingComplexType
            | GpmfError::InvalidComplexType(_)
            | GpmfError::RecurseDepthExceeded(_)
            | GpmfError::InvalidTimestamp(_) => ErrorKind::CorruptNode,
            GpmfError::KeyNotFound(_) | GpmfError::NoNode => ErrorKind::KeyNotFound,
            GpmfError::UnsupportedConversion{..}
            | GpmfError::ScaleMismatch{..}
            | GpmfError::ZeroScale(_) => ErrorKind::UnsupportedConversion,
            GpmfError::IndexOutOfRange(..) => ErrorKind::IndexOutOfRange,
            GpmfError::InvalidFourCC(_) => ErrorKind::InvalidInput,
        }
    }

    /// `true` for the expected "search found nothing" outcome.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::KeyNotFound
    }
}

impl std::error::Error for GpmfError {}

impl fmt::Display for GpmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpmfError::BinReadError(err) => write!(f, "{err}"),
            GpmfError::IOError(err) => write!(f, "IO error: {}", err),
            GpmfError::TryFromIntError(err) => write!(f, "{err}"),
            GpmfError::TrackNotFound{handler, format} => write!(f, "No track with handler type '{handler}' and sample format '{format}'."),
            GpmfError::CorruptBox{name, offset, reason} => write!(f, "Corrupt atom '{name}' @ offset {offset}: {reason}."),
            GpmfError::NoSuchAtom(name) => write!(f, "No such atom {name}."),
            GpmfError::TableMismatch(msg) => write!(f, "Sample table mismatch: {msg}."),
            GpmfError::BoundsError(pos, len, max) => write!(f, "Bounds error: tried to read {len} bytes @ {pos} with file size {max}."),
            GpmfError::BufferTooSmall{got, required} => write!(f, "Buffer too small: got {got}, requires {required}."),
            GpmfError::CorruptNode{key, offset} => write!(f, "Corrupt GPMF node '{key}' @ offset {offset}."),
            GpmfError::UnknownBaseType(bt) => write!(f, "Unknown base type {}/'{}'", bt, *bt as char),
            GpmfError::MissingComplexType => write!(f, "Missing type definitions for complex type '?'"),
            GpmfError::InvalidComplexType(s) => write!(f, "Invalid type definition '{s}' for complex type '?'"),
            GpmfError::RecurseDepthExceeded((depth, max)) => write!(f, "Recurse depth {depth} exceeds max recurse depth {max}"),
            GpmfError::InvalidTimestamp(s) => write!(f, "Invalid GPMF timestamp '{s}'"),
            GpmfError::KeyNotFound(key) => write!(f, "No such key '{key}'"),
            GpmfError::NoNode => write!(f, "Stream is not positioned on a node"),
            GpmfError::UnsupportedConversion{key, base_type} => write!(f, "Can not convert '{key}' with base type '{}'", *base_type as char),
            GpmfError::ScaleMismatch{scales, elements} => write!(f, "{scales} scale values for {elements} elements"),
            GpmfError::ZeroScale(key) => write!(f, "Scale value 0 for '{key}'"),
            GpmfError::IndexOutOfRange(index, len) => write!(f, "Index {index} out of range for length {len}"),
            GpmfError::InvalidFourCC(s) => write!(f, "Invalid FourCC '{s}'"),
        }
    }
}

/// Converts std::io::Error to GpmfError
impl From<std::io::Error> for GpmfError {
    fn from(err: std::io::Error) -> Self {
        GpmfError::IOError(err)
    }
}

/// Converts std::num::TryFromIntError to GpmfError
impl From<std::num::TryFromIntError> for GpmfError {
    fn from(err: std::num::TryFromIntError) -> GpmfError {
        GpmfError::TryFromIntError(err)
    }
}

/// Converts GpmfError to std::io::Error
impl From<GpmfError> for std::io::Error {
    fn from(err: GpmfError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Converts binrw::Error to GpmfError
impl From<binrw::Error> for GpmfError {
    fn from(err: binrw::Error) -> GpmfError {
        GpmfError::BinReadError(err)
    }
}
