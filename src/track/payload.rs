//! Payload index. One entry per sample in the telemetry track,
//! with absolute file offset, size, and start/end time.

use rayon::prelude::*;

use crate::GpmfError;

use super::TrackDescriptor;

/// Location and timing for a single payload (MP4 sample).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadDescriptor {
    /// 0-based payload index.
    pub(crate) index: usize,
    /// Absolute byte offset in file.
    pub(crate) offset: u64,
    /// Size in bytes.
    pub(crate) size: u32,
    /// Start time in seconds, relative to track start.
    pub(crate) start: f64,
    /// End time in seconds, relative to track start.
    pub(crate) end: f64,
}

impl PayloadDescriptor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Returns `(START, END)` in seconds.
    pub fn time(&self) -> (f64, f64) {
        (self.start, self.end)
    }
}

/// All payloads in the telemetry track, ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadIndex {
    payloads: Vec<PayloadDescriptor>,
}

impl PayloadIndex {
    /// Expands the run-length sample tables in `track`
    /// into one descriptor per payload.
    /// All payloads must lie within `file_len`.
    pub fn new(track: &TrackDescriptor, file_len: u64) -> Result<Self, GpmfError> {
        // (CHUNK_OFFSET, FIRST_SAMPLE, SAMPLE_COUNT)
        let mut first_sample = 0_usize;
        let chunks: Vec<(u64, usize, usize)> = track.chunk_sample_counts()?
            .into_iter()
            .zip(track.chunk_offsets.iter())
            .map(|(count, offset)| {
                let chunk = (*offset, first_sample, count as usize);
                first_sample += count as usize;
                chunk
            })
            .collect();

        let sizes = &track.sample_sizes;

        // Samples within a chunk are contiguous, chunks are independent.
        let located = chunks.into_par_iter()
            .map(|(chunk_offset, first, count)| {
                let mut pos = chunk_offset;
                (first .. first + count)
                    .map(|sample| {
                        let size = sizes.get(sample).ok_or((sample, pos, 0))?;
                        match pos.checked_add(size as u64) {
                            Some(end) if end <= file_len => {
                                let located = (pos, size);
                                pos = end;
                                Ok(located)
                            },
                            _ => Err((sample, pos, size)),
                        }
                    })
                    .collect::<Result<Vec<(u64, u32)>, (usize, u64, u32)>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|(sample, pos, size)| {
                tracing::warn!("payload {sample} @ {pos} ({size} bytes) outside file");
                GpmfError::BoundsError(pos, size as u64, file_len)
            })?;

        let time_scale = track.time_scale as f64;
        let durations = track.sample_durations.iter()
            .flat_map(|(count, duration)| std::iter::repeat(*duration).take(*count as usize));

        // Integer tick sums, so that end(i) == start(i + 1).
        let mut ticks = 0_u64;
        let payloads: Vec<PayloadDescriptor> = located.into_iter()
            .flatten()
            .zip(durations)
            .enumerate()
            .map(|(index, ((offset, size), duration))| {
                let start = ticks as f64 / time_scale;
                ticks += duration as u64;
                PayloadDescriptor {
                    index,
                    offset,
                    size,
                    start,
                    end: ticks as f64 / time_scale,
                }
            })
            .collect();

        if payloads.len() != track.sample_count() {
            return Err(GpmfError::TableMismatch(format!(
                "indexed {} of {} samples", payloads.len(), track.sample_count()
            )))
        }

        tracing::debug!("indexed {} payloads, {ticks} ticks", payloads.len());

        Ok(Self { payloads })
    }

    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&PayloadDescriptor, GpmfError> {
        self.payloads.get(index)
            .ok_or(GpmfError::IndexOutOfRange(index, self.payloads.len()))
    }

    /// Returns `(START, END)` in seconds for payload at `index`.
    pub fn time(&self, index: usize) -> Result<(f64, f64), GpmfError> {
        self.get(index).map(|p| p.time())
    }

    /// Size in bytes for payload at `index`.
    pub fn size(&self, index: usize) -> Result<u32, GpmfError> {
        self.get(index).map(|p| p.size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PayloadDescriptor> {
        self.payloads.iter()
    }

    /// Summed payload durations in seconds.
    pub fn duration(&self) -> f64 {
        self.payloads.last()
            .map(|p| p.end)
            .unwrap_or(0.0)
    }
}
