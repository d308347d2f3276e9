//! Telemetry payload. Wrapper over in-memory buffer `Cursor<Vec<u8>>`,
//! complete with start and end time relative to track start.

use std::io::{BufRead, Cursor, Read, Seek, SeekFrom};

use crate::{gpmf::Stream, GpmfError};

use super::PayloadDescriptor;

/// Raw GPMF payload for a single MP4 sample.
#[derive(Debug, Default, Clone)]
pub struct Payload {
    index: usize,
    start: f64,
    end: f64,
    reader: Cursor<Vec<u8>>
}

impl From<Payload> for Cursor<Vec<u8>> {
    fn from(payload: Payload) -> Self {
        payload.reader
    }
}

impl Seek for Payload {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.reader.seek(pos)
    }
}

impl Read for Payload {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for Payload {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl Payload {
    pub(crate) fn new(descriptor: &PayloadDescriptor, bytes: Vec<u8>) -> Self {
        Self {
            index: descriptor.index,
            start: descriptor.start,
            end: descriptor.end,
            reader: Cursor::new(bytes),
        }
    }

    /// 0-based payload index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `(START, END)` in seconds
    /// relative to track start.
    pub fn time(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    /// Payload duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Returns the raw bytes as a slice.
    pub fn raw(&self) -> &[u8] {
        self.reader.get_ref()
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.reader.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.get_ref().is_empty()
    }

    /// GPMF stream over the payload,
    /// positioned on the first node.
    pub fn stream(&self) -> Result<Stream<'_>, GpmfError> {
        Stream::new(self.raw())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.reader.into_inner()
    }
}
