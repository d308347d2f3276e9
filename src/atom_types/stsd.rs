//! Sample description atom (`stsd`).
//!
//! Only the data format of each entry is interpreted,
//! e.g. `gpmd` for GoPro telemetry.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_description_atom>

use binrw::BinRead;

/// Sample description atom (`stsd`).
#[derive(Debug, Default, Clone, BinRead)]
#[br(big, import(len: u64))]
pub struct Stsd {
    _version: u8,
    _flags: [u8; 3],
    #[br(assert(no_of_entries as u64 * 8 <= len.saturating_sub(8), "stsd entries exceed atom size"))]
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    descriptions: Vec<SampleDescription>
}

impl Stsd {
    pub fn descriptions(&self) -> &[SampleDescription] {
        &self.descriptions
    }

    /// Returns `true` if any entry has data format `format`.
    pub fn has_format(&self, format: &[u8; 4]) -> bool {
        self.descriptions.iter()
            .any(|d| &d.data_format == format)
    }
}

/// Sample description entry.
/// Layout mimics that of atoms: `size | fourcc | data load`.
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct SampleDescription {
    #[br(assert(size >= 8, "sample description smaller than header"))]
    size: u32,
    pub(crate) data_format: [u8; 4],
    #[br(count = size - 8)]
    data: Vec<u8>,
}

impl SampleDescription {
    pub fn data_format(&self) -> [u8; 4] {
        self.data_format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
