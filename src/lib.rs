//! Locate and parse GoPro GPMF telemetry in MP4 files.
//! Does not and will not support any kind of video de/encoding.
//!
//! The MP4 implementation was mostly done with help from
//! <https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFPreface/qtffPreface.html>
//! (despite the warning on the front page above).
//! GPMF is described at <https://github.com/gopro/gpmf-parser>.
//!
//! ```rs
//! use gpmfiter::{Mp4, SampleRatePrecision, gpmf::Key};
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmfiter::GpmfError> {
//!     let mut mp4 = Mp4::new(Path::new("GOPR0001.MP4"))?;
//!
//!     println!("{:?}", mp4.duration());
//!     println!("{} payloads", mp4.payload_count());
//!
//!     let rate = mp4.sample_rate(Key::ACCL, SampleRatePrecision::Precise)?;
//!     println!("ACCL {:.2} Hz", rate.rate);
//!
//!     let payload = mp4.payload(0)?;
//!     println!("{}", payload.stream()?.dump()?);
//!
//!     Ok(())
//! }
//! ```

pub mod atom;
pub mod atom_types;
pub mod consts;
pub mod errors;
pub mod fourcc;
pub mod gpmf;
pub mod mp4;
pub mod options;
pub(crate) mod support;
pub mod track;

// Internal reader
pub(crate) mod reader;

#[cfg(test)]
mod tests;

pub use atom::{Atom, AtomHeader, AtomNode};
pub use atom_types::{
    Co64,
    Hdlr,
    Mdhd,
    Mvhd,
    Stco,
    Stsc,
    Stsd,
    Stsz,
    Stts,
    Stz2,
    Tkhd,
    SampleSizes,
};
pub use consts::{CONTAINER, mp4_time_zero, MAX_NEST_DEPTH};
pub use errors::{ErrorKind, GpmfError};
pub use fourcc::FourCC;
pub use gpmf::{Key, Recurse, Stream, Value};
pub use mp4::{Mp4, SampleRate, SampleRatePrecision};
pub use options::Mp4Options;
pub use track::{Payload, PayloadDescriptor, PayloadIndex, TrackDescriptor};
