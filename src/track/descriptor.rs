//! Locates the telemetry track in the `moov` tree and
//! collects the sample tables needed to index its payloads.

use crate::{
    atom::AtomNode,
    atom_types::{Co64, SampleSizes},
    support::string_from_bytes,
    FourCC,
    GpmfError,
    Mp4Options,
};

/// Sample tables and timing for the selected track.
///
/// Run-length tables are kept as is,
/// see `PayloadIndex` for the expanded form.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    pub(crate) track_id: u32,
    /// Handler name from `hdlr`, e.g. `GoPro MET`.
    pub(crate) name: String,
    pub(crate) handler: [u8; 4],
    pub(crate) format: [u8; 4],
    /// Ticks per second (`mdhd`).
    pub(crate) time_scale: u32,
    /// Unscaled duration (`mdhd`).
    pub(crate) duration: u64,
    /// Absolute chunk offsets (`stco`/`co64`).
    pub(crate) chunk_offsets: Vec<u64>,
    /// `(FIRST_CHUNK, SAMPLES_PER_CHUNK)` (`stsc`).
    pub(crate) samples_per_chunk: Vec<(u32, u32)>,
    /// Sample sizes (`stsz`/`stz2`).
    pub(crate) sample_sizes: SampleSizes,
    /// `(SAMPLE_COUNT, SAMPLE_DURATION)` (`stts`).
    pub(crate) sample_durations: Vec<(u32, u32)>,
}

impl TrackDescriptor {
    /// Returns the first track in `moov` with handler sub type
    /// and sample format specified in `options`.
    ///
    /// `moov_data` is the `moov` data load, starting at
    /// absolute position `moov_data_offset`.
    pub(crate) fn locate(
        moov: &AtomNode,
        moov_data: &[u8],
        moov_data_offset: u64,
        options: &Mp4Options,
    ) -> Result<Self, GpmfError> {
        for trak in moov.children_named(FourCC::Trak) {
            if let Some(track) = Self::from_trak(trak, moov_data, moov_data_offset, options)? {
                tracing::debug!(
                    "located track {} '{}' ({} chunks, {} samples, time scale {})",
                    track.track_id,
                    track.name,
                    track.chunk_offsets.len(),
                    track.sample_sizes.len(),
                    track.time_scale
                );
                return Ok(track)
            }
        }

        Err(GpmfError::TrackNotFound {
            handler: string_from_bytes(&options.handler, false),
            format: string_from_bytes(&options.format, false),
        })
    }

    /// Returns `None` if `trak` does not match the handler
    /// or sample format in `options`.
    fn from_trak(
        trak: &AtomNode,
        moov_data: &[u8],
        moov_data_offset: u64,
        options: &Mp4Options,
    ) -> Result<Option<Self>, GpmfError> {
        let atom = |node: &AtomNode| node.atom(moov_data, moov_data_offset);

        let mdia = required(trak, FourCC::Mdia)?;
        let hdlr = atom(required(mdia, FourCC::Hdlr)?)?.hdlr()?;
        if hdlr.component_sub_type() != options.handler {
            tracing::trace!(
                "skipping track with handler '{}'",
                string_from_bytes(&hdlr.component_sub_type(), false)
            );
            return Ok(None)
        }

        let stbl = mdia.path(&[FourCC::Minf, FourCC::Stbl])
            .ok_or_else(|| GpmfError::NoSuchAtom("minf/stbl".to_owned()))?;
        let stsd = atom(required(stbl, FourCC::Stsd)?)?.stsd()?;
        if !stsd.has_format(&options.format) {
            return Ok(None)
        }

        let track_id = match trak.child(FourCC::Tkhd) {
            Some(tkhd) => atom(tkhd)?.tkhd()?.track_id(),
            None => {
                tracing::warn!("track without 'tkhd' @ {}", trak.header.offset);
                0
            }
        };

        let mdhd = atom(required(mdia, FourCC::Mdhd)?)?.mdhd()?;
        let stsc = atom(required(stbl, FourCC::Stsc)?)?.stsc()?;
        let stts = atom(required(stbl, FourCC::Stts)?)?.stts()?;

        let sample_sizes = match (stbl.child(FourCC::Stsz), stbl.child(FourCC::Stz2)) {
            (Some(stsz), _) => atom(stsz)?.stsz()?.sizes(),
            (None, Some(stz2)) => atom(stz2)?.stz2()?.sizes(),
            (None, None) => return Err(GpmfError::NoSuchAtom("stsz".to_owned())),
        };

        let chunk_offsets = match (stbl.child(FourCC::Stco), stbl.child(FourCC::Co64)) {
            (Some(stco), _) => Co64::from(atom(stco)?.stco()?).into_offsets(),
            (None, Some(co64)) => atom(co64)?.co64()?.into_offsets(),
            (None, None) => return Err(GpmfError::NoSuchAtom("stco".to_owned())),
        };

        let track = Self {
            track_id,
            name: hdlr.component_name().to_owned(),
            handler: options.handler,
            format: options.format,
            time_scale: mdhd.time_scale(),
            duration: mdhd.duration_unscaled(),
            chunk_offsets,
            samples_per_chunk: stsc.table(),
            sample_sizes,
            sample_durations: stts.table(),
        };

        track.validate()?;

        Ok(Some(track))
    }

    /// Checks that the sample tables agree with each other.
    pub(crate) fn validate(&self) -> Result<(), GpmfError> {
        if self.time_scale == 0 {
            return Err(GpmfError::TableMismatch("time scale is 0".to_owned()))
        }

        let chunks = self.chunk_offsets.len() as u64;
        let mut previous = 0;
        for (first_chunk, _) in self.samples_per_chunk.iter() {
            if *first_chunk <= previous {
                return Err(GpmfError::TableMismatch(format!("stsc not ascending at chunk {first_chunk}")))
            }
            if *first_chunk as u64 > chunks {
                return Err(GpmfError::TableMismatch(format!("stsc chunk {first_chunk} exceeds {chunks} chunks")))
            }
            previous = *first_chunk;
        }

        let stsc_samples = self.chunk_sample_counts()?.iter().map(|n| *n as u64).sum::<u64>();
        let stsz_samples = self.sample_sizes.len() as u64;
        let stts_samples = self.sample_durations.iter().map(|(n, _)| *n as u64).sum::<u64>();

        if stsc_samples != stsz_samples || stsc_samples != stts_samples {
            return Err(GpmfError::TableMismatch(format!(
                "sample counts differ (stsc {stsc_samples}, stsz {stsz_samples}, stts {stts_samples})"
            )))
        }

        if stsz_samples == 0 {
            tracing::warn!("track {} has no samples", self.track_id);
        }

        Ok(())
    }

    /// Number of samples in each chunk, expanded from `stsc`.
    pub(crate) fn chunk_sample_counts(&self) -> Result<Vec<u32>, GpmfError> {
        let chunks = self.chunk_offsets.len();
        if self.samples_per_chunk.is_empty() {
            return match chunks {
                0 => Ok(Vec::new()),
                _ => Err(GpmfError::TableMismatch("empty stsc".to_owned())),
            }
        }
        if self.samples_per_chunk.first().map(|(first, _)| *first) != Some(1) {
            return Err(GpmfError::TableMismatch("stsc does not start at chunk 1".to_owned()))
        }

        let mut counts = Vec::with_capacity(chunks);
        for (i, (first_chunk, samples)) in self.samples_per_chunk.iter().enumerate() {
            // last entry covers all remaining chunks
            let next_first = self.samples_per_chunk.get(i + 1)
                .map(|(first, _)| *first as usize)
                .unwrap_or(chunks + 1);
            let run = next_first.saturating_sub(*first_chunk as usize);
            counts.extend(std::iter::repeat(*samples).take(run));
        }

        Ok(counts)
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler sub type, e.g. `meta`.
    pub fn handler(&self) -> [u8; 4] {
        self.handler
    }

    /// Sample format, e.g. `gpmd`.
    pub fn format(&self) -> [u8; 4] {
        self.format
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// Track duration in time scale units.
    pub fn duration_unscaled(&self) -> u64 {
        self.duration
    }

    /// Track duration from `mdhd`.
    pub fn duration(&self) -> time::Duration {
        time::Duration::seconds_f64(self.duration as f64 / self.time_scale as f64)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_sizes.len()
    }

    pub fn chunk_offsets(&self) -> &[u64] {
        &self.chunk_offsets
    }

    pub fn sample_sizes(&self) -> &SampleSizes {
        &self.sample_sizes
    }

    /// `(SAMPLE_COUNT, SAMPLE_DURATION)`.
    pub fn sample_durations(&self) -> &[(u32, u32)] {
        &self.sample_durations
    }
}

fn required(parent: &AtomNode, name: FourCC) -> Result<&AtomNode, GpmfError> {
    parent.child(name)
        .ok_or_else(|| GpmfError::NoSuchAtom(name.to_string()))
}
