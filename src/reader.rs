use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
};

use crate::{AtomHeader, AtomNode, FourCC, GpmfError};

/// `BufReader` over a `File`,
/// with an in-memory copy of the `moov` atom.
#[derive(Debug)]
pub(crate) struct Mp4Reader {
    /// File size.
    pub(crate) len: u64,
    /// Reader over the full MP4 file.
    pub(crate) file_reader: BufReader<File>,
    /// Atom header representing the
    /// `moov` atom (offsets correspond to the full file).
    pub(crate) moov_header: AtomHeader,
    /// In-memory buffer over the `moov` atom
    /// data load (i.e. atoms contained by `moov`).
    pub(crate) moov: Vec<u8>,
}

impl Mp4Reader {
    /// Creates a `BufReader` for the full MP4 file,
    /// with default capacity (8KiB) if `capacity` is `None`,
    /// and in-memory buffer over the `moov`
    /// atom in that file.
    ///
    /// GoPro often stores telemetry with chunk sizes
    /// just above the default 8KiB buffer size.
    pub(crate) fn with_capacity(
        file: File,
        capacity: Option<usize>
    ) -> Result<Self, GpmfError> {
        let len = file.metadata()?.len();
        let reader = match capacity {
            Some(cap) => BufReader::with_capacity(cap, file),
            None => BufReader::new(file),
        };

        let mut rdr = Self {
            file_reader: reader,
            len,
            moov_header: AtomHeader::default(),
            moov: Vec::new(),
        };

        let moov_hdr = rdr.top_level()?
            .into_iter()
            .find(|h| h.name == FourCC::Moov)
            .ok_or_else(|| GpmfError::NoSuchAtom("moov".to_owned()))?;

        rdr.moov = rdr.read_bytes(moov_hdr.data_offset(), moov_hdr.data_size())?;
        rdr.moov_header = moov_hdr;

        tracing::debug!("read 'moov' @ {} ({} bytes)", moov_hdr.offset, moov_hdr.atom_size);

        Ok(rdr)
    }

    /// Returns top-level atom header at absolute position `pos`.
    ///
    /// Does not verify that `pos`
    /// is at atom boundary.
    pub(crate) fn header(&mut self, pos: u64) -> Result<AtomHeader, GpmfError> {
        self.file_reader.seek(SeekFrom::Start(pos))?;
        AtomHeader::read(&mut self.file_reader, pos, self.len, true)
    }

    /// Returns all top-level atom headers,
    /// e.g. `ftyp`, `mdat`, `moov`.
    pub(crate) fn top_level(&mut self) -> Result<Vec<AtomHeader>, GpmfError> {
        let mut headers = Vec::new();
        let mut pos = 0;
        while pos < self.len {
            let header = self.header(pos)?;
            tracing::trace!("top-level atom '{}' @ {} size {}", header.name, header.offset, header.atom_size);
            pos = header.end();
            headers.push(header);
        }
        Ok(headers)
    }

    /// Reads `len` bytes at absolute file position `pos`.
    ///
    /// Note that e.g. the `mdat` atom may be many GB in size.
    pub(crate) fn read_bytes(&mut self, pos: u64, len: u64) -> Result<Vec<u8>, GpmfError> {
        match pos.checked_add(len) {
            Some(end) if end <= self.len => (),
            _ => return Err(GpmfError::BoundsError(pos, len, self.len)),
        }
        self.file_reader.seek(SeekFrom::Start(pos))?;
        let mut buf = vec![0_u8; usize::try_from(len)?];
        self.file_reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Parses the in-memory `moov` atom into a tree,
    /// with `moov` as root.
    pub(crate) fn moov_tree(&self) -> Result<AtomNode, GpmfError> {
        let children = AtomNode::parse_all(&self.moov, self.moov_header.data_offset(), 1)?;
        Ok(AtomNode {
            header: self.moov_header,
            children,
        })
    }
}
