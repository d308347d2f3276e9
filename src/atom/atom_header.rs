use std::{io::{Read, Seek}, ops::Range};

use binrw::BinReaderExt;

use crate::{FourCC, GpmfError};

/// Atom header.
/// 8 or 16 bytes in MP4, depending on whether
/// 32 or 64-bit sized.
///
/// ```ignore
/// | [X X X X] [Y Y Y Y] [Z Z Z Z Z Z Z Z] |
///    |         |         |
///    |         |         64bit size (optional, only if 32 bit size == 1)
///    |         FourCC
///    32bit size
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtomHeader {
    /// Total atom size in bytes including 8/16 byte header.
    pub(crate) atom_size: u64,
    /// FourCC
    pub(crate) name: FourCC,
    /// Absolute byte offset for start of atom in MP4,
    /// i.e. byte offset for its header,
    /// starting with 32-bit size.
    pub(crate) offset: u64,
    /// Set to `true` if atom size specified
    /// in 64 bit area. Some cameras
    /// specify all sizes as 64 bit regardless
    /// of actual atom size, so header size can not
    /// be derived from the size alone.
    pub(crate) size_64bit: bool
}

impl AtomHeader {
    /// Reads an atom header at the current position of `reader`,
    /// which must correspond to the absolute file position `offset`.
    ///
    /// `limit` is the absolute end of the enclosing atom
    /// (or file size for top-level atoms). The atom must
    /// fit within `limit`. A 32-bit size of 0 means the atom
    /// extends to `limit`, but is only accepted for `top_level` atoms.
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
        limit: u64,
        top_level: bool,
    ) -> Result<Self, GpmfError> {
        if offset.saturating_add(8) > limit {
            return Err(Self::corrupt(FourCC::default(), offset, "truncated header"))
        }

        let mut hdr = Self{offset, ..Self::default()};

        // Read 32bit total atom size
        hdr.atom_size = reader.read_be::<u32>()? as u64;

        // Can not read fourcc name as utf-8 since some
        // manufacturers use single-byte extended ascii/ISO8859-1
        hdr.name = FourCC::from_bytes(reader.read_be::<[u8; 4]>()?);

        // Check if atom size is 64bit and read the 8 bytes
        // following directly after FourCC as new size if so
        if hdr.atom_size == 1 {
            if offset.saturating_add(16) > limit {
                return Err(Self::corrupt(hdr.name, offset, "truncated 64-bit header"))
            }
            hdr.atom_size = reader.read_be::<u64>()?;
            hdr.size_64bit = true;
        }

        if hdr.atom_size == 0 {
            match top_level {
                true => hdr.atom_size = limit - offset,
                false => return Err(Self::corrupt(hdr.name, offset, "zero size nested atom")),
            }
        }

        if hdr.atom_size < hdr.header_size() as u64 {
            return Err(Self::corrupt(hdr.name, offset, "size smaller than header"))
        }

        match offset.checked_add(hdr.atom_size) {
            Some(end) if end <= limit => Ok(hdr),
            _ => Err(Self::corrupt(hdr.name, offset, "extends past parent")),
        }
    }

    fn corrupt(name: FourCC, offset: u64, reason: &'static str) -> GpmfError {
        GpmfError::CorruptBox {
            name: name.to_string(),
            offset,
            reason
        }
    }

    /// Convenience method to check whether atom is
    /// a container or not.
    pub fn is_container(&self) -> bool {
        self.name.is_container()
    }

    pub fn start(&self) -> u64 {
        self.offset
    }

    pub fn end(&self) -> u64 {
        self.offset + self.atom_size
    }

    pub fn atom_size(&self) -> u64 {
        self.atom_size
    }

    pub fn name(&self) -> &FourCC {
        &self.name
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Determine header size in bytes in MP4.
    /// Returns 8 or 16 bytes.
    pub fn header_size(&self) -> u8 {
        match self.size_64bit {
            true => 16,
            false => 8,
        }
    }

    /// Data load absolute offset,
    /// i.e. position after header
    /// adjusted for optional 64bit size value.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size() as u64
    }

    /// Size of data load, adjusted for header size
    /// (excludes header size).
    pub fn data_size(&self) -> u64 {
        self.atom_size - self.header_size() as u64
    }

    /// Returns start, end offset range for atom.
    pub fn bounds(&self) -> Range<u64> {
        self.offset .. self.end()
    }

    /// Returns absolute offset range for the data load.
    pub fn data_bounds(&self) -> Range<u64> {
        self.data_offset() .. self.end()
    }

    /// Returns `true` is absolute offset `pos`
    /// is contained within atom span.
    ///
    /// Inclusive lower bound, exclusive upper bound.
    pub fn contains(&self, pos: u64) -> bool {
        self.bounds().contains(&pos)
    }
}
