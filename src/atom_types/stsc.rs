//! Sample to chunk atom (`stsc`)
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsc`
//!
//! See:
//! - Sample to chunk atom: <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom>
//! - <https://github.com/essential61/mp4analyser/wiki/Understanding-The-Sample-Tables:-An-Example>

use binrw::BinRead;

/// Sample to chunk atom (`stsc`)
#[derive(Debug, Clone, BinRead)]
#[br(big, import(len: u64))]
pub struct Stsc {
    _version: u8,
    _flags: [u8; 3],
    #[br(assert(no_of_entries as u64 * 12 <= len.saturating_sub(8), "stsc entries exceed atom size"))]
    pub(crate) no_of_entries: u32,
    #[br(count = no_of_entries)]
    pub(crate) sample_to_chunk_table: Vec<SampleToChunk>,
}

impl Stsc {
    /// Returns number of samples for specified chunk.
    ///
    /// > Important: The `first_chunk` field in an `stsc`
    /// > atom starts on 1,
    /// > so `chunk_index` is also a 1-based index,
    /// > exactly as the MP4 specification states.
    ///
    /// Assumes the table is sorted by `first_chunk`.
    pub fn no_of_samples(&self, chunk_index: u32) -> Option<u32> {
        // last entry with first_chunk <= chunk_index,
        // since all following chunks share its sample count
        let i = self.sample_to_chunk_table
            .partition_point(|s| s.first_chunk <= chunk_index);
        self.sample_to_chunk_table
            .get(i.checked_sub(1)?)
            .map(|s| s.samples_per_chunk)
    }

    /// Returns the table as tuples
    /// `(FIRST_CHUNK, SAMPLES_PER_CHUNK)`.
    pub fn table(&self) -> Vec<(u32, u32)> {
        self.sample_to_chunk_table.iter()
            .map(|s| (s.first_chunk, s.samples_per_chunk))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sample_to_chunk_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_to_chunk_table.is_empty()
    }
}

#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct SampleToChunk {
    /// 1-based index of first chunk
    /// that contains the number of
    /// samples specified in `samples_per_chunk`.
    /// The following chunks will all contain the
    /// same number of samples until the next
    /// sample to chunk entry.
    pub(crate) first_chunk: u32,
    /// Number of samples for chunk number
    /// specified by `first_chunk` and on,
    /// until the next sample to chunk entry.
    pub(crate) samples_per_chunk: u32,
    pub(crate) sample_description_id: u32,
}
