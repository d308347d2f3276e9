//! Sample size atoms (`stsz`, `stz2`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
//!
//! Note that `stsz` lists sample size not chunk size.
//! `stco` or `co64` list chunk offsets, not offsets to individual samples.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>

use binrw::BinRead;

/// Sample size atom (`stsz`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
#[derive(Debug, Clone, BinRead)]
#[br(big, import(len: u64))]
pub struct Stsz {
    _version: u8,
    _flags: [u8; 3],
    /// Sample size.
    /// If 0 `no_of_entries` contains
    /// the number of u32 values that should be read,
    /// else all sample sizes should have this value.
    pub(crate) sample_size: u32,
    #[br(assert(sample_size != 0 || no_of_entries as u64 * 4 <= len.saturating_sub(12), "stsz entries exceed atom size"))]
    pub(crate) no_of_entries: u32,
    #[br(if(sample_size == 0), count = no_of_entries)]
    pub(crate) sizes: Vec<u32>
}

impl Stsz {
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn sizes(&self) -> SampleSizes {
        match self.sample_size {
            0 => SampleSizes::Table(self.sizes.to_owned()),
            n => SampleSizes::Fixed{size: n, count: self.no_of_entries},
        }
    }
}

/// Compact sample size atom (`stz2`).
/// Sizes are packed as 4, 8, or 16 bit values.
#[derive(Debug, Clone, BinRead)]
#[br(big, import(len: u64))]
pub struct Stz2 {
    _version: u8,
    _flags: [u8; 3],
    _reserved: [u8; 3],
    #[br(assert([4, 8, 16].contains(&field_size), "invalid stz2 field size"))]
    pub(crate) field_size: u8,
    #[br(assert((no_of_entries as u64 * field_size as u64).div_ceil(8) <= len.saturating_sub(12), "stz2 entries exceed atom size"))]
    pub(crate) no_of_entries: u32,
    #[br(count = (no_of_entries as u64 * field_size as u64).div_ceil(8))]
    packed: Vec<u8>,
}

impl Stz2 {
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    /// Unpacked sample sizes.
    pub fn sizes(&self) -> SampleSizes {
        let n = self.no_of_entries as usize;
        let sizes = match self.field_size {
            4 => self.packed.iter()
                .flat_map(|b| [(b >> 4) as u32, (b & 0x0f) as u32])
                .take(n)
                .collect(),
            8 => self.packed.iter()
                .map(|b| *b as u32)
                .collect(),
            _ => self.packed.chunks_exact(2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]) as u32)
                .collect(),
        };
        SampleSizes::Table(sizes)
    }
}

/// Sample sizes, either a single size for all samples
/// or one size per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleSizes {
    Fixed{size: u32, count: u32},
    Table(Vec<u32>),
}

impl SampleSizes {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed{count, ..} => *count as usize,
            Self::Table(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of sample at 0-based `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            Self::Fixed{size, count} => (index < *count as usize).then_some(*size),
            Self::Table(t) => t.get(index).copied(),
        }
    }

    /// Summed size in bytes of all samples.
    pub fn total(&self) -> u64 {
        match self {
            Self::Fixed{size, count} => *size as u64 * *count as u64,
            Self::Table(t) => t.iter().map(|s| *s as u64).sum(),
        }
    }
}
