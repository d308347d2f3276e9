//! Options for opening an MP4 file.

use crate::consts::{MOV_GPMF_TRAK_SUBTYPE, MOV_GPMF_TRAK_TYPE};

/// Selects the telemetry track and sets
/// the read buffer size.
///
/// ```rs
/// let options = Mp4Options::default()
///     .with_capacity(64 * 1024)
///     .with_track(*b"meta", *b"gpmd");
/// let mp4 = Mp4::with_options(Path::new("GOPR0001.MP4"), options)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp4Options {
    /// `BufReader` capacity. Defaults to 8KiB if `None`.
    pub capacity: Option<usize>,
    /// Handler sub type in `hdlr`.
    pub handler: [u8; 4],
    /// Data format in `stsd`.
    pub format: [u8; 4],
}

impl Default for Mp4Options {
    fn default() -> Self {
        Self {
            capacity: None,
            handler: MOV_GPMF_TRAK_TYPE,
            format: MOV_GPMF_TRAK_SUBTYPE,
        }
    }
}

impl Mp4Options {
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..self
        }
    }

    /// Select a track other than GoPro telemetry (`meta`/`gpmd`).
    pub fn with_track(self, handler: [u8; 4], format: [u8; 4]) -> Self {
        Self {
            handler,
            format,
            ..self
        }
    }
}
