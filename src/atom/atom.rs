//! MP4 atom.

use std::io::Cursor;

use binrw::{BinRead, BinReaderExt};

use crate::{
    atom_types::{Co64, Hdlr, Mdhd, Mvhd, Stco, Stsc, Stsd, Stsz, Stts, Stz2, Tkhd},
    errors::GpmfError,
    fourcc::FourCC,
    support::counted_string,
};

use super::AtomHeader;

/// MP4 atom with its data load,
/// borrowed from the in-memory `moov` atom.
#[derive(Debug, Clone, Copy)]
pub struct Atom<'a> {
    /// Header
    pub header: AtomHeader,
    /// Data load, i.e. atom bytes following the header.
    data: &'a [u8],
}

impl <'a> Atom<'a> {
    pub(crate) fn new(header: AtomHeader, data: &'a [u8]) -> Self {
        Self {
            header,
            data
        }
    }

    /// Total size of the atom in bytes.
    pub fn size(&self) -> u64 {
        self.header.atom_size
    }

    pub fn name(&self) -> FourCC {
        self.header.name
    }

    /// Raw data load.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Ensures user specified name (Four CC),
    /// matches that of current `Atom`.
    fn match_name(&self, name: FourCC) -> Result<(), GpmfError> {
        if self.header.name != name {
            Err(GpmfError::CorruptBox{
                name: self.header.name.to_string(),
                offset: self.header.offset,
                reason: "unexpected atom type",
            })
        } else {
            Ok(())
        }
    }

    /// Parses a sample table, passing the data load size
    /// to bound its entry count.
    fn table<T>(&self, name: FourCC) -> Result<T, GpmfError>
    where
        T: for<'b> BinRead<Args<'b> = (u64,)>,
    {
        self.match_name(name)?;
        let len = self.data.len() as u64;
        Ok(Cursor::new(self.data).read_be_args::<T>((len,))?)
    }

    /// Parses a fixed layout atom.
    fn fixed<T>(&self, name: FourCC) -> Result<T, GpmfError>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        self.match_name(name)?;
        Ok(Cursor::new(self.data).read_be::<T>()?)
    }

    /// Parse the atom into `Stts` (sample to time) if `Atom.name` is `stts`,
    pub fn stts(&self) -> Result<Stts, GpmfError> {
        self.table(FourCC::Stts)
    }

    /// Parse the atom into `Stsz` (sample to size in bytes) if `Atom.name` is `stsz`,
    pub fn stsz(&self) -> Result<Stsz, GpmfError> {
        self.table(FourCC::Stsz)
    }

    /// Parse the atom into `Stz2` (compact sample sizes) if `Atom.name` is `stz2`,
    pub fn stz2(&self) -> Result<Stz2, GpmfError> {
        self.table(FourCC::Stz2)
    }

    /// Parse the atom into `Stsc` (sample to chunk) if `Atom.name` is `stsc`,
    pub fn stsc(&self) -> Result<Stsc, GpmfError> {
        self.table(FourCC::Stsc)
    }

    /// Parse the atom into `Stco` (chunk offsets)
    /// if `Atom.name` is `stco`.
    pub fn stco(&self) -> Result<Stco, GpmfError> {
        self.table(FourCC::Stco)
    }

    /// Parse the atom into `Co64` (chunk offsets)
    /// if `Atom.name` is `co64`. 64-bit equivalent to `stco` for
    /// file sizes above 32bit limit.
    pub fn co64(&self) -> Result<Co64, GpmfError> {
        self.table(FourCC::Co64)
    }

    /// Parse the atom into `Stsd` (sample descriptions) if `Atom.name` is `stsd`,
    pub fn stsd(&self) -> Result<Stsd, GpmfError> {
        self.table(FourCC::Stsd)
    }

    /// Parse the atom into `Mdhd` if `Atom.name` is `mdhd`,
    pub fn mdhd(&self) -> Result<Mdhd, GpmfError> {
        self.fixed(FourCC::Mdhd)
    }

    /// Parse the atom into `Mvhd` if `Atom.name` is `mvhd`,
    pub fn mvhd(&self) -> Result<Mvhd, GpmfError> {
        self.fixed(FourCC::Mvhd)
    }

    /// Parse the atom into `Tkhd` if `Atom.name` is `tkhd`,
    pub fn tkhd(&self) -> Result<Tkhd, GpmfError> {
        self.fixed(FourCC::Tkhd)
    }

    /// Parse the atom into `Hdlr` if `Atom.name` is `hdlr`,
    pub fn hdlr(&self) -> Result<Hdlr, GpmfError> {
        let mut hdlr: Hdlr = self.fixed(FourCC::Hdlr)?;

        // GoPro uses a counted string that ends with space \x20,
        // whereas e.g. older Apple MP4/Quicktimes
        // use a null terminated string.
        if let Some(name) = self.data.get(Hdlr::FIXED_SIZE ..) {
            hdlr.component_name = counted_string(name);
        }

        Ok(hdlr)
    }
}
