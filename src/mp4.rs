//! Core MP4 struct and methods.
//!
//! Opens an MP4 file, locates the telemetry track
//! (handler sub type `meta`, sample format `gpmd` by default),
//! and indexes its payloads. Payloads are read on demand.
//!
//! Note on `hdlr` atom and finding "component name":
//! - The component name is a counted string:
//!     - first byte specifies number of bytes, e.g. "0x0b" = 11, followed by the string.
//!     - For GoPro the component name for GPMF data is "GoPro MET".
//!     - All GoPro component names end in 0x20 so far, and are trimmed.
//!
//! ```rs
//! use gpmfiter::{Mp4, gpmf::{Key, Recurse}};
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmfiter::GpmfError> {
//!     let mut mp4 = Mp4::new(Path::new("GOPR0001.MP4"))?;
//!
//!     for payload in mp4.payloads() {
//!         let payload = payload?;
//!         let mut stream = payload.stream()?;
//!         while stream.find_next(Key::GPS5, Recurse::Unlimited).is_ok() {
//!             let gps: Vec<f64> = stream.scaled(0, stream.repeat()?)?;
//!             println!("{:?} {gps:?}", payload.time());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::{fs::File, path::Path};

use time::{Duration, PrimitiveDateTime};

use crate::{
    atom::{Atom, AtomHeader, AtomNode},
    atom_types::Mvhd,
    gpmf::{Key, Recurse},
    reader::Mp4Reader,
    track::{Payload, PayloadIndex, TrackDescriptor},
    FourCC,
    GpmfError,
    Mp4Options,
};

/// How to derive the sample rate for a GPMF stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRatePrecision {
    /// Total samples over the time spanned
    /// by the payloads containing them.
    #[default]
    Fast,
    /// Least squares fit of accumulated sample count
    /// against payload end times.
    Precise,
}

/// Sample rate for a GPMF stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate {
    /// Samples per second.
    pub rate: f64,
    /// Time of first sample in seconds.
    pub start: f64,
    /// Time of last sample in seconds.
    pub end: f64,
    /// Total number of samples.
    pub samples: u64,
}

/// Mp4 file with located telemetry track.
#[derive(Debug)]
pub struct Mp4 {
    reader: Mp4Reader,
    /// Parsed `moov` atom.
    moov: AtomNode,
    track: TrackDescriptor,
    index: PayloadIndex,
    /// File size in bytes.
    pub len: u64,
}

impl Mp4 {
    /// Opens MP4 at `path`, locating and indexing
    /// the GoPro telemetry track.
    pub fn new(path: &Path) -> Result<Self, GpmfError> {
        Self::with_options(path, Mp4Options::default())
    }

    /// Opens MP4 at `path`, locating and indexing the track
    /// specified in `options`.
    pub fn with_options(path: &Path, options: Mp4Options) -> Result<Self, GpmfError> {
        let file = File::open(path)?;
        let reader = Mp4Reader::with_capacity(file, options.capacity)?;
        let moov = reader.moov_tree()?;
        let track = TrackDescriptor::locate(
            &moov,
            &reader.moov,
            reader.moov_header.data_offset(),
            &options
        )?;
        let index = PayloadIndex::new(&track, reader.len)?;

        Ok(Self {
            len: reader.len,
            reader,
            moov,
            track,
            index,
        })
    }

    /// Returns the parsed `moov` atom tree.
    pub fn atoms(&self) -> &AtomNode {
        &self.moov
    }

    /// Returns an atom in the `moov` tree
    /// together with its data load.
    pub fn atom(&self, node: &AtomNode) -> Result<Atom<'_>, GpmfError> {
        node.atom(&self.reader.moov, self.reader.moov_header.data_offset())
    }

    /// Returns all top-level atom headers,
    /// e.g. `ftyp`, `mdat`, `moov`.
    pub fn top_level(&mut self) -> Result<Vec<AtomHeader>, GpmfError> {
        self.reader.top_level()
    }

    /// Located telemetry track.
    pub fn track(&self) -> &TrackDescriptor {
        &self.track
    }

    /// Payload index for the telemetry track.
    pub fn index(&self) -> &PayloadIndex {
        &self.index
    }

    /// Movie header atom.
    pub fn mvhd(&self) -> Result<Mvhd, GpmfError> {
        let mvhd = self.moov.child(FourCC::Mvhd)
            .ok_or_else(|| GpmfError::NoSuchAtom(FourCC::Mvhd.to_string()))?;
        self.atom(mvhd)?.mvhd()
    }

    /// Creation time from `mvhd`.
    pub fn creation_time(&self) -> Result<PrimitiveDateTime, GpmfError> {
        self.mvhd().map(|m| m.creation_time())
    }

    /// Telemetry track duration.
    /// Falls back on summed payload durations
    /// if `mdhd` lists no duration.
    pub fn duration(&self) -> Duration {
        match self.track.duration {
            0 => Duration::seconds_f64(self.index.duration()),
            _ => self.track.duration(),
        }
    }

    /// Telemetry track duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration().as_seconds_f64()
    }

    /// GPMF stored in `moov/udta/GPMF`, e.g. camera settings
    /// for some GoPro models.
    pub fn user_data(&self) -> Result<Vec<u8>, GpmfError> {
        let gpmf = self.moov.path(&[FourCC::Udta, FourCC::Gpmf])
            .ok_or_else(|| GpmfError::NoSuchAtom("udta/GPMF".to_owned()))?;
        Ok(self.atom(gpmf)?.data().to_vec())
    }

    /// Number of payloads.
    pub fn payload_count(&self) -> usize {
        self.index.len()
    }

    /// Size in bytes for payload at `index`.
    pub fn payload_size(&self, index: usize) -> Result<u32, GpmfError> {
        self.index.size(index)
    }

    /// Returns `(START, END)` in seconds for payload at `index`.
    pub fn payload_time(&self, index: usize) -> Result<(f64, f64), GpmfError> {
        self.index.time(index)
    }

    /// Reads the raw bytes for payload at `index`.
    pub fn payload_bytes(&mut self, index: usize) -> Result<Vec<u8>, GpmfError> {
        let descriptor = self.index.get(index)?;
        self.reader.read_bytes(descriptor.offset, descriptor.size as u64)
    }

    /// Reads payload at `index`.
    pub fn payload(&mut self, index: usize) -> Result<Payload, GpmfError> {
        let descriptor = *self.index.get(index)?;
        let bytes = self.reader.read_bytes(descriptor.offset, descriptor.size as u64)?;
        Ok(Payload::new(&descriptor, bytes))
    }

    /// Iterates over all payloads in order.
    pub fn payloads(&mut self) -> impl Iterator<Item = Result<Payload, GpmfError>> + '_ {
        (0 .. self.payload_count()).map(move |i| self.payload(i))
    }

    /// Number of samples for `key` in each payload, as
    /// `(START, END, SAMPLES)`. Payloads without `key` are skipped,
    /// as are payloads that fail to parse.
    fn sample_counts(&mut self, key: Key) -> Result<Vec<(f64, f64, u64)>, GpmfError> {
        let mut counts = Vec::new();
        for i in 0 .. self.payload_count() {
            let payload = self.payload(i)?;
            let mut stream = match payload.stream() {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!("payload {i}: {err}");
                    continue
                }
            };

            let mut samples = 0;
            loop {
                match stream.find_next(key, Recurse::Unlimited) {
                    Ok(()) => samples += stream.repeat()? as u64,
                    Err(err) if err.is_not_found() => break,
                    Err(err) => {
                        tracing::warn!("payload {i}: {err}");
                        break
                    },
                }
            }

            if samples > 0 {
                let (start, end) = payload.time();
                counts.push((start, end, samples));
            }
        }
        Ok(counts)
    }

    /// Derives the sample rate for the GPMF stream `key`,
    /// e.g. `Key::ACCL`, over all payloads.
    pub fn sample_rate(
        &mut self,
        key: Key,
        precision: SampleRatePrecision
    ) -> Result<SampleRate, GpmfError> {
        let counts = self.sample_counts(key)?;
        let (first, last) = match (counts.first(), counts.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Err(GpmfError::KeyNotFound(key.to_string())),
        };
        let samples: u64 = counts.iter().map(|(_, _, n)| n).sum();

        let span = last.1 - first.0;
        let fast = SampleRate {
            rate: if span > 0.0 { samples as f64 / span } else { 0.0 },
            start: first.0,
            end: last.1,
            samples,
        };

        if precision == SampleRatePrecision::Fast || counts.len() < 2 {
            return Ok(fast)
        }

        // Fit accumulated sample count against payload end time:
        // samples(t) = rate * t + intercept
        let mut accumulated = 0;
        let points: Vec<(f64, f64)> = counts.iter()
            .map(|(_, end, n)| {
                accumulated += n;
                (*end, accumulated as f64)
            })
            .collect();

        let n = points.len() as f64;
        let mean_t = points.iter().map(|(t, _)| t).sum::<f64>() / n;
        let mean_s = points.iter().map(|(_, s)| s).sum::<f64>() / n;
        let covariance: f64 = points.iter().map(|(t, s)| (t - mean_t) * (s - mean_s)).sum();
        let variance: f64 = points.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();

        if variance <= 0.0 || covariance <= 0.0 {
            return Ok(fast)
        }

        let rate = covariance / variance;
        let intercept = mean_s - rate * mean_t;
        let start = -intercept / rate;

        tracing::debug!("'{key}' precise rate {rate:.3} Hz, first sample @ {start:.3}s");

        Ok(SampleRate {
            rate,
            start,
            end: start + samples as f64 / rate,
            samples,
        })
    }
}
