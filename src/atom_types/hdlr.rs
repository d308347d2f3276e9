//! Handler reference atom (`hdlr`).
//!
//! > Note: Distinguish from 'Metadata handler atom' with the same FourCC.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>

use binrw::BinRead;

/// Handler reference atom (`hdlr`)
#[derive(Debug, Default, Clone, BinRead)]
#[br(big)]
pub struct Hdlr {
    _version: u8,
    _flags: [u8; 3],
    /// Possible values:
    /// - `mhlr`: media handler
    /// - `dhlr`: data handler
    /// - `[0, 0, 0, 0]` (MP4, DJI Osmo)
    pub(crate) component_type: [u8; 4],
    /// Four CC for the type of media or data handler,
    /// e.g. `vide`, `soun`, `meta`.
    pub(crate) component_sub_type: [u8; 4],
    /// Reserved, should be set to 0.
    _component_manufacturer: u32,
    /// Reserved, should be set to 0.
    _component_flags: u32,
    /// Reserved, should be set to 0.
    _component_flags_mask: u32,
    /// May be a counted string (first byte specifies size),
    /// null terminated string, or neither.
    /// Parsed separately from the remaining atom bytes.
    #[br(ignore)]
    pub(crate) component_name: String,
}

impl Hdlr {
    /// Size of the fixed fields preceding the component name.
    pub(crate) const FIXED_SIZE: usize = 24;

    pub fn component_type(&self) -> [u8; 4] {
        self.component_type
    }

    /// Handler sub type, e.g. `meta` for GoPro telemetry.
    pub fn component_sub_type(&self) -> [u8; 4] {
        self.component_sub_type
    }

    /// Handler name, e.g. "GoPro MET".
    pub fn component_name(&self) -> &str {
        self.component_name.as_str()
    }
}
