//! GPMF node: 8 byte header followed by data load,
//! padded to a multiple of 4 bytes.
//!
//! ```ignore
//! | [K K K K] [T] [S] [R R] [DATA ... PADDING] |
//!    |         |   |   |
//!    |         |   |   repeat, u16
//!    |         |   struct size in bytes, u8
//!    |         type code, u8 (0 for nested)
//!    key
//! ```

use std::{fmt, io::Cursor};

use binrw::{BinRead, BinReaderExt};

use crate::{consts::GPMF_HEADER_SIZE, support::align4, GpmfError};

use super::{BaseType, Key};

/// GPMF node header. Big endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct NodeHeader {
    #[br(map = |b: [u8; 4]| Key(b))]
    pub(crate) key: Key,
    pub(crate) type_code: u8,
    pub(crate) struct_size: u8,
    pub(crate) repeat: u16,
}

impl NodeHeader {
    /// Data load size in bytes, excluding padding.
    pub fn data_len(&self) -> usize {
        self.struct_size as usize * self.repeat as usize
    }

    /// Header, data load and padding in bytes.
    pub fn span(&self) -> usize {
        GPMF_HEADER_SIZE + align4(self.data_len())
    }
}

/// Decoded node, borrowing its data load from the payload buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<'a> {
    pub(crate) header: NodeHeader,
    /// Offset of the header within the payload buffer.
    pub(crate) offset: usize,
    /// Data load without padding.
    pub(crate) data: &'a [u8],
}

impl<'a> Node<'a> {
    /// Decodes the node at `offset` in `buffer`.
    /// The node, including padding, must end at or before `scope_end`,
    /// i.e. the end of the enclosing node's data load
    /// or the end of the buffer.
    pub(crate) fn parse(
        buffer: &'a [u8],
        offset: usize,
        scope_end: usize,
    ) -> Result<Self, GpmfError> {
        let scope_end = scope_end.min(buffer.len());
        let corrupt = |key: Option<Key>| GpmfError::CorruptNode {
            key: key.map(|k| k.to_string()).unwrap_or_else(|| String::from("????")),
            offset,
        };

        let header_bytes = offset.checked_add(GPMF_HEADER_SIZE)
            .filter(|end| *end <= scope_end)
            .and_then(|end| buffer.get(offset .. end))
            .ok_or_else(|| corrupt(None))?;

        let header: NodeHeader = Cursor::new(header_bytes).read_be()?;

        let data_offset = offset + GPMF_HEADER_SIZE;
        if offset + header.span() > scope_end {
            tracing::trace!(
                "node '{}' @ {offset} spans {} bytes, scope ends @ {scope_end}",
                header.key,
                header.span()
            );
            return Err(corrupt(Some(header.key)))
        }

        Ok(Self {
            header,
            offset,
            data: &buffer[data_offset .. data_offset + header.data_len()],
        })
    }

    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    pub fn key(&self) -> Key {
        self.header.key
    }

    pub fn type_code(&self) -> u8 {
        self.header.type_code
    }

    pub fn base_type(&self) -> Result<BaseType, GpmfError> {
        BaseType::from_u8(self.header.type_code)
    }

    pub fn is_nested(&self) -> bool {
        self.header.type_code == 0
    }

    pub fn struct_size(&self) -> usize {
        self.header.struct_size as usize
    }

    pub fn repeat(&self) -> usize {
        self.header.repeat as usize
    }

    /// Data load without padding.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Offset of the node header in the payload buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the data load in the payload buffer.
    pub fn data_offset(&self) -> usize {
        self.offset + GPMF_HEADER_SIZE
    }

    /// End of the data load, excluding padding.
    pub fn data_end(&self) -> usize {
        self.data_offset() + self.data.len()
    }

    /// End of the node, including padding.
    pub fn end(&self) -> usize {
        self.offset + self.header.span()
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_nested() {
            true => write!(f, "{} nested {} bytes", self.key(), self.data.len()),
            false => write!(
                f,
                "{} '{}' {}x{}",
                self.key(),
                self.type_code() as char,
                self.struct_size(),
                self.repeat()
            ),
        }
    }
}
