//! MP4 atoms required for locating a track and deriving its sample offsets and timing.

mod co64;
mod hdlr;
mod mdhd;
mod mvhd;
mod stco;
mod stsc;
mod stsd;
mod stsz;
mod stts;
mod tkhd;

pub use co64::Co64;
pub use hdlr::Hdlr;
pub use mdhd::Mdhd;
pub use mvhd::Mvhd;
pub use stco::Stco;
pub use stsc::{SampleToChunk, Stsc};
pub use stsd::{SampleDescription, Stsd};
pub use stsz::{SampleSizes, Stsz, Stz2};
pub use stts::{Stts, TimeToSample};
pub use tkhd::Tkhd;
