//! Synthetic GPMF payloads and minimal MP4 files.

use std::io::Write;

use tempfile::NamedTempFile;

/// GPMF node with data load padded to 4 bytes.
pub(crate) fn node(key: &[u8; 4], type_code: u8, struct_size: u8, repeat: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len() + 3);
    out.extend_from_slice(key);
    out.push(type_code);
    out.push(struct_size);
    out.extend_from_slice(&repeat.to_be_bytes());
    out.extend_from_slice(data);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

/// Nested GPMF node containing `children`.
pub(crate) fn nested(key: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let data = children.concat();
    node(key, 0, 4, (data.len() / 4) as u16, &data)
}

/// `c` node, one sample.
pub(crate) fn string(key: &[u8; 4], value: &str) -> Vec<u8> {
    node(key, b'c', value.len() as u8, 1, value.as_bytes())
}

/// `s` node with `elements` values per sample.
pub(crate) fn i16s(key: &[u8; 4], elements: usize, values: &[i16]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    node(key, b's', (elements * 2) as u8, (values.len() / elements) as u16, &data)
}

/// `l` node with `elements` values per sample.
pub(crate) fn i32s(key: &[u8; 4], elements: usize, values: &[i32]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    node(key, b'l', (elements * 4) as u8, (values.len() / elements) as u16, &data)
}

/// `d` node with `elements` values per sample.
pub(crate) fn f64s(key: &[u8; 4], elements: usize, values: &[f64]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    node(key, b'd', (elements * 8) as u8, (values.len() / elements) as u16, &data)
}

/// `L` node, one value.
pub(crate) fn u32_value(key: &[u8; 4], value: u32) -> Vec<u8> {
    node(key, b'L', 4, 1, &value.to_be_bytes())
}

/// Payload resembling GoPro output:
///
/// ```ignore
/// DEVC
///     DVID 1
///     DVNM "Camera"
///     STRM
///         STNM "Gyroscope"
///         SCAL 100
///         SIUN "rad/s"
///         GYRO 3x2
///     STRM
///         STNM "GPS"
///         GPSU "240131124559.250"
///         SCAL [1, 1, 1, 100, 1]
///         GPS5 5x3
/// ```
pub(crate) fn camera_payload() -> Vec<u8> {
    nested(b"DEVC", &[
        u32_value(b"DVID", 1),
        string(b"DVNM", "Camera"),
        nested(b"STRM", &[
            string(b"STNM", "Gyroscope"),
            i16s(b"SCAL", 1, &[100]),
            string(b"SIUN", "rad/s"),
            i16s(b"GYRO", 3, &[100, 200, 300, -100, 50, 0]),
        ]),
        nested(b"STRM", &[
            string(b"STNM", "GPS"),
            node(b"GPSU", b'U', 16, 1, b"240131124559.250"),
            i32s(b"SCAL", 1, &[1, 1, 1, 100, 1]),
            f64s(b"GPS5", 5, &[
                64.1, 19.5, 120.0, 250.0, 2.6,
                64.2, 19.6, 121.0, 300.0, 3.1,
                64.3, 19.7, 122.0, 350.0, 3.6,
            ]),
        ]),
    ])
}

/// Payload with `samples` accelerometer samples.
pub(crate) fn accl_payload(samples: usize) -> Vec<u8> {
    let values: Vec<i16> = (0 .. samples * 3).map(|v| v as i16).collect();
    nested(b"DEVC", &[
        u32_value(b"DVID", 1),
        nested(b"STRM", &[
            i16s(b"SCAL", 1, &[418]),
            i16s(b"ACCL", 3, &values),
        ]),
    ])
}

/// MP4 atom with 32-bit size.
pub(crate) fn atom(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len());
    out.extend_from_slice(&(8 + data.len() as u32).to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(data);
    out
}

/// MP4 atom with 64-bit size.
pub(crate) fn atom64(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + data.len());
    out.extend_from_slice(&1_u32.to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(&(16 + data.len() as u64).to_be_bytes());
    out.extend_from_slice(data);
    out
}

/// MP4 atom with version and flags, version 0.
fn full_atom(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    atom(name, &[&[0_u8; 4][..], data].concat())
}

fn be32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Minimal MP4 with an optional video track,
/// a telemetry track, and optional user data.
///
/// Layout: `ftyp`, `mdat` (4 filler bytes before each chunk), `moov`.
#[derive(Debug, Clone)]
pub(crate) struct Mp4Builder {
    /// Payloads grouped into chunks.
    pub(crate) chunks: Vec<Vec<Vec<u8>>>,
    pub(crate) time_scale: u32,
    /// `(SAMPLE_COUNT, SAMPLE_DURATION)`
    pub(crate) durations: Vec<(u32, u32)>,
    pub(crate) handler: [u8; 4],
    pub(crate) format: [u8; 4],
    pub(crate) video_track: bool,
    pub(crate) user_data: Option<Vec<u8>>,
    pub(crate) co64: bool,
    pub(crate) mdat64: bool,
    /// Replaces the derived `(FIRST_CHUNK, SAMPLES_PER_CHUNK)` table.
    pub(crate) stsc: Option<Vec<(u32, u32)>>,
    /// Replaces the derived sample sizes.
    pub(crate) sizes: Option<Vec<u32>>,
    /// Writes `stz2` with this field size instead of `stsz`.
    pub(crate) stz2: Option<u8>,
    /// Writes a version 1 `mdhd` with this duration.
    pub(crate) mdhd_v1_duration: Option<u64>,
    /// Seconds since 1904-01-01.
    pub(crate) creation_time: u32,
}

impl Mp4Builder {
    /// One second per payload at time scale 1000.
    pub(crate) fn new(chunks: Vec<Vec<Vec<u8>>>) -> Self {
        let samples = chunks.iter().map(|c| c.len() as u32).sum();
        Self {
            chunks,
            time_scale: 1000,
            durations: vec![(samples, 1000)],
            handler: *b"meta",
            format: *b"gpmd",
            video_track: true,
            user_data: None,
            co64: false,
            mdat64: false,
            stsc: None,
            sizes: None,
            stz2: None,
            mdhd_v1_duration: None,
            creation_time: 3_789_302_400, // 2024-01-28 16:00:00
        }
    }

    pub(crate) fn payloads(&self) -> Vec<Vec<u8>> {
        self.chunks.concat()
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let ftyp = atom(b"ftyp", b"mp41\0\0\0\0mp41isom");

        let mdat_header = if self.mdat64 { 16 } else { 8 };
        let mdat_data_offset = ftyp.len() + mdat_header;
        let mut mdat = Vec::new();
        let mut offsets = Vec::new();
        for chunk in self.chunks.iter() {
            mdat.extend_from_slice(&[0xAA; 4]);
            offsets.push((mdat_data_offset + mdat.len()) as u64);
            for payload in chunk.iter() {
                mdat.extend_from_slice(payload);
            }
        }
        let mdat = match self.mdat64 {
            true => atom64(b"mdat", &mdat),
            false => atom(b"mdat", &mdat),
        };

        [ftyp, mdat, self.moov(&offsets)].concat()
    }

    fn moov(&self, offsets: &[u64]) -> Vec<u8> {
        let duration: u32 = self.durations.iter().map(|(n, d)| n * d).sum();

        let mut mvhd = be32(&[self.creation_time, self.creation_time, self.time_scale, duration]);
        mvhd.extend_from_slice(&[0; 80]);

        let mut moov = full_atom(b"mvhd", &mvhd);
        if self.video_track {
            moov.extend(atom(b"trak", &[
                Self::tkhd(1),
                atom(b"mdia", &[
                    Self::mdhd(30000, 90000),
                    Self::hdlr(b"vide", "GoPro AVC"),
                ].concat()),
            ].concat()));
        }
        moov.extend(self.telemetry_trak(offsets, duration));
        if let Some(data) = &self.user_data {
            moov.extend(atom(b"udta", &atom(b"GPMF", data)));
        }

        atom(b"moov", &moov)
    }

    fn telemetry_trak(&self, offsets: &[u64], duration: u32) -> Vec<u8> {
        let payloads = self.payloads();

        let mut stsd_entry = be32(&[16]);
        stsd_entry.extend_from_slice(&self.format);
        stsd_entry.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
        let stsd = full_atom(b"stsd", &[be32(&[1]), stsd_entry].concat());

        let stts_entries: Vec<u32> = self.durations.iter().flat_map(|(n, d)| [*n, *d]).collect();
        let stts = full_atom(b"stts", &[be32(&[self.durations.len() as u32]), be32(&stts_entries)].concat());

        let stsc_table = self.stsc.clone().unwrap_or_else(|| {
            let mut table: Vec<(u32, u32)> = Vec::new();
            for (i, chunk) in self.chunks.iter().enumerate() {
                if table.last().map(|(_, n)| *n) != Some(chunk.len() as u32) {
                    table.push((i as u32 + 1, chunk.len() as u32));
                }
            }
            table
        });
        let stsc_entries: Vec<u32> = stsc_table.iter().flat_map(|(f, n)| [*f, *n, 1]).collect();
        let stsc = full_atom(b"stsc", &[be32(&[stsc_table.len() as u32]), be32(&stsc_entries)].concat());

        let sizes = self.sizes.clone()
            .unwrap_or_else(|| payloads.iter().map(|p| p.len() as u32).collect());
        let stsz = match self.stz2 {
            Some(field_size) => Self::stz2(field_size, &sizes),
            None => full_atom(b"stsz", &[be32(&[0, sizes.len() as u32]), be32(&sizes)].concat()),
        };

        let offsets_atom = match self.co64 {
            true => {
                let entries: Vec<u8> = offsets.iter().flat_map(|o| o.to_be_bytes()).collect();
                full_atom(b"co64", &[be32(&[offsets.len() as u32]), entries].concat())
            },
            false => {
                let entries: Vec<u32> = offsets.iter().map(|o| *o as u32).collect();
                full_atom(b"stco", &[be32(&[offsets.len() as u32]), be32(&entries)].concat())
            },
        };

        let stbl = atom(b"stbl", &[stsd, stts, stsc, stsz, offsets_atom].concat());
        atom(b"trak", &[
            Self::tkhd(2),
            atom(b"mdia", &[
                match self.mdhd_v1_duration {
                    Some(duration) => Self::mdhd_v1(self.time_scale, duration),
                    None => Self::mdhd(self.time_scale, duration),
                },
                Self::hdlr(&self.handler, "GoPro MET"),
                atom(b"minf", &stbl),
            ].concat()),
        ].concat())
    }

    fn tkhd(track_id: u32) -> Vec<u8> {
        let mut data = be32(&[0, 0, track_id]);
        data.extend_from_slice(&[0; 68]);
        full_atom(b"tkhd", &data)
    }

    fn mdhd(time_scale: u32, duration: u32) -> Vec<u8> {
        let mut data = be32(&[0, 0, time_scale, duration]);
        data.extend_from_slice(&0x55c4_u16.to_be_bytes()); // "und"
        data.extend_from_slice(&0_u16.to_be_bytes());
        full_atom(b"mdhd", &data)
    }

    fn mdhd_v1(time_scale: u32, duration: u64) -> Vec<u8> {
        let mut data = vec![1, 0, 0, 0];
        data.extend_from_slice(&[0; 16]); // creation, modification
        data.extend_from_slice(&time_scale.to_be_bytes());
        data.extend_from_slice(&duration.to_be_bytes());
        data.extend_from_slice(&0x55c4_u16.to_be_bytes());
        data.extend_from_slice(&0_u16.to_be_bytes());
        atom(b"mdhd", &data)
    }

    /// Compact sample sizes, packed as 4, 8, or 16 bit values.
    fn stz2(field_size: u8, sizes: &[u32]) -> Vec<u8> {
        let packed: Vec<u8> = match field_size {
            4 => sizes.chunks(2)
                .map(|pair| ((pair[0] as u8) << 4) | pair.get(1).map(|s| *s as u8).unwrap_or(0))
                .collect(),
            8 => sizes.iter().map(|s| *s as u8).collect(),
            _ => sizes.iter().flat_map(|s| (*s as u16).to_be_bytes()).collect(),
        };
        let mut data = vec![0, 0, 0, field_size];
        data.extend(be32(&[sizes.len() as u32]));
        data.extend(packed);
        full_atom(b"stz2", &data)
    }

    fn hdlr(sub_type: &[u8; 4], name: &str) -> Vec<u8> {
        let mut data = b"mhlr".to_vec();
        data.extend_from_slice(sub_type);
        data.extend_from_slice(&[0; 12]);
        data.push(name.len() as u8);
        data.extend_from_slice(name.as_bytes());
        full_atom(b"hdlr", &data)
    }

    /// Writes the MP4 to a temporary file,
    /// removed when dropped.
    pub(crate) fn write(&self) -> NamedTempFile {
        write_temp(&self.build())
    }
}

pub(crate) fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
