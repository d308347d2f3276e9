use std::{io::Cursor, path::Path};

use time::macros::datetime;

use crate::{
    atom_types::SampleSizes,
    gpmf::{Key, Recurse},
    track::{PayloadIndex, TrackDescriptor},
    AtomHeader,
    ErrorKind,
    FourCC,
    GpmfError,
    Mp4,
    Mp4Options,
    SampleRatePrecision,
};

use super::builder::{
    accl_payload,
    atom,
    atom64,
    camera_payload,
    node,
    u32_value,
    write_temp,
    Mp4Builder,
};

fn three_payloads() -> Mp4Builder {
    Mp4Builder::new(vec![
        vec![camera_payload(), accl_payload(10)],
        vec![accl_payload(20)],
    ])
}

#[test]
fn open_and_read_payloads() {
    let builder = three_payloads();
    let file = builder.write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.payload_count(), 3);
    assert_eq!(mp4.track().name(), "GoPro MET");
    assert_eq!(mp4.track().track_id(), 2);
    assert_eq!(mp4.track().time_scale(), 1000);
    assert_eq!(mp4.duration_secs(), 3.0);

    for (i, expected) in builder.payloads().iter().enumerate() {
        assert_eq!(mp4.payload_size(i).unwrap() as usize, expected.len());
        assert_eq!(&mp4.payload_bytes(i).unwrap(), expected);
        assert_eq!(mp4.payload_time(i).unwrap(), (i as f64, i as f64 + 1.0));
    }

    // contiguous within a chunk
    let index = mp4.index();
    let (p0, p1, p2) = (index.get(0).unwrap(), index.get(1).unwrap(), index.get(2).unwrap());
    assert_eq!(p1.offset(), p0.offset() + p0.size() as u64);
    assert_eq!(p2.offset(), p1.offset() + p1.size() as u64 + 4);
    assert_eq!(index.duration(), 3.0);
}

#[test]
fn payload_times_are_contiguous() {
    let mut builder = Mp4Builder::new(vec![vec![accl_payload(5), accl_payload(5)]]);
    builder.durations = vec![(2, 500)];
    let file = builder.write();
    let mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.payload_time(0).unwrap(), (0.0, 0.5));
    assert_eq!(mp4.payload_time(1).unwrap(), (0.5, 1.0));
    assert_eq!(mp4.duration_secs(), 1.0);
}

#[test]
fn payload_index_out_of_range() {
    let file = three_payloads().write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.payload_time(3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(mp4.payload_size(3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(mp4.payload(3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn parse_payload() {
    let file = three_payloads().write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    let payloads: Vec<_> = mp4.payloads().collect::<Result<_, _>>().unwrap();
    assert_eq!(payloads.len(), 3);
    assert_eq!(payloads[2].time(), (2.0, 3.0));

    let mut stream = payloads[0].stream().unwrap();
    stream.find_next(Key::GYRO, Recurse::Unlimited).unwrap();
    assert_eq!(stream.scaled::<f64>(0, 1).unwrap(), vec![1.0, 2.0, 3.0]);

    let mut stream = payloads[2].stream().unwrap();
    stream.find_next(Key::ACCL, Recurse::Unlimited).unwrap();
    assert_eq!(stream.repeat().unwrap(), 20);
}

#[test]
fn run_length_chunks() {
    let payloads: Vec<Vec<u8>> = (1 ..= 6).map(accl_payload).collect();
    let builder = Mp4Builder::new(vec![
        payloads[0 .. 2].to_vec(),
        payloads[2 .. 4].to_vec(),
        payloads[4 .. 5].to_vec(),
        payloads[5 .. 6].to_vec(),
    ]);
    let file = builder.write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.track().samples_per_chunk, vec![(1, 2), (3, 1)]);
    assert_eq!(mp4.payload_count(), 6);
    for (i, expected) in payloads.iter().enumerate() {
        assert_eq!(&mp4.payload_bytes(i).unwrap(), expected);
    }
}

#[test]
fn large_file_atoms() {
    let mut builder = three_payloads();
    builder.co64 = true;
    builder.mdat64 = true;
    let file = builder.write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.payload_count(), 3);
    assert_eq!(mp4.payload_bytes(2).unwrap(), builder.payloads()[2]);

    let top: Vec<FourCC> = mp4.top_level().unwrap().iter().map(|h| h.name).collect();
    assert_eq!(top, vec![FourCC::Custom(*b"ftyp"), FourCC::Mdat, FourCC::Moov]);
}

#[test]
fn track_selection() {
    let mut builder = three_payloads();
    builder.handler = *b"soun";
    let file = builder.write();

    let err = Mp4::new(file.path()).unwrap_err();
    assert!(matches!(err, GpmfError::TrackNotFound{..}));
    assert_eq!(err.kind(), ErrorKind::TrackNotFound);

    let options = Mp4Options::default().with_track(*b"soun", *b"gpmd");
    let mp4 = Mp4::with_options(file.path(), options).unwrap();
    assert_eq!(mp4.payload_count(), 3);

    let options = Mp4Options::default()
        .with_capacity(64 * 1024)
        .with_track(*b"soun", *b"abcd");
    let err = Mp4::with_options(file.path(), options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrackNotFound);
}

#[test]
fn missing_file() {
    let err = Mp4::new(Path::new("does/not/exist.mp4")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

#[test]
fn inconsistent_tables() {
    // stsc covers 6 samples, stsz lists 3
    let mut builder = three_payloads();
    builder.stsc = Some(vec![(1, 3)]);
    let err = Mp4::new(builder.write().path()).unwrap_err();
    assert!(matches!(err, GpmfError::TableMismatch(_)));
    assert_eq!(err.kind(), ErrorKind::CorruptBox);

    let mut builder = three_payloads();
    builder.stsc = Some(vec![(2, 1), (1, 2)]);
    assert_eq!(Mp4::new(builder.write().path()).unwrap_err().kind(), ErrorKind::CorruptBox);

    // chunk 5 of 2
    let mut builder = three_payloads();
    builder.stsc = Some(vec![(1, 2), (5, 1)]);
    assert_eq!(Mp4::new(builder.write().path()).unwrap_err().kind(), ErrorKind::CorruptBox);

    let mut builder = three_payloads();
    builder.durations = vec![(2, 1000)];
    assert_eq!(Mp4::new(builder.write().path()).unwrap_err().kind(), ErrorKind::CorruptBox);

    let mut builder = three_payloads();
    builder.time_scale = 0;
    assert_eq!(Mp4::new(builder.write().path()).unwrap_err().kind(), ErrorKind::CorruptBox);
}

#[test]
fn payload_outside_file() {
    let mut builder = three_payloads();
    let mut sizes: Vec<u32> = builder.payloads().iter().map(|p| p.len() as u32).collect();
    sizes[2] = 1_000_000;
    builder.sizes = Some(sizes);

    let err = Mp4::new(builder.write().path()).unwrap_err();
    assert!(matches!(err, GpmfError::BoundsError(..)));
    assert_eq!(err.kind(), ErrorKind::CorruptBox);
}

#[test]
fn truncated_file() {
    let mut bytes = three_payloads().build();
    bytes.truncate(bytes.len() - 10);
    let file = write_temp(&bytes);

    let err = Mp4::new(file.path()).unwrap_err();
    assert!(matches!(err, GpmfError::CorruptBox{..}));
}

#[test]
fn movie_metadata() {
    let mut builder = three_payloads();
    builder.user_data = Some(camera_payload());
    let file = builder.write();
    let mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.creation_time().unwrap(), datetime!(2024-01-28 16:00));

    let udta = mp4.user_data().unwrap();
    assert_eq!(udta, camera_payload());
    let stream = crate::gpmf::Stream::new(&udta).unwrap();
    assert_eq!(stream.validate().unwrap(), 13);

    let moov = mp4.atoms();
    assert_eq!(moov.children_named(FourCC::Trak).count(), 2);
    assert!(moov.path(&[FourCC::Udta, FourCC::Gpmf]).is_some());
    assert!(moov.walk().iter().any(|(depth, a)| *depth == 5 && a.name() == FourCC::Stsz));

    let file = three_payloads().write();
    let mp4 = Mp4::new(file.path()).unwrap();
    assert!(matches!(mp4.user_data().unwrap_err(), GpmfError::NoSuchAtom(_)));
}

#[test]
fn sample_rate() {
    let builder = Mp4Builder::new(vec![
        vec![accl_payload(10)],
        vec![accl_payload(10)],
        vec![camera_payload()],
        vec![accl_payload(10)],
    ]);
    let file = builder.write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    // payloads 0, 1, 3 span 0.0 - 4.0
    let fast = mp4.sample_rate(Key::ACCL, SampleRatePrecision::Fast).unwrap();
    assert_eq!(fast.samples, 30);
    assert_eq!((fast.start, fast.end), (0.0, 4.0));
    assert_eq!(fast.rate, 7.5);

    let builder = Mp4Builder::new(vec![
        vec![accl_payload(10), accl_payload(10), accl_payload(10)],
    ]);
    let file = builder.write();
    let mut mp4 = Mp4::new(file.path()).unwrap();

    let precise = mp4.sample_rate(Key::ACCL, SampleRatePrecision::Precise).unwrap();
    assert!((precise.rate - 10.0).abs() < 1e-9);
    assert!(precise.start.abs() < 1e-9);
    assert!((precise.end - 3.0).abs() < 1e-9);

    let err = mp4.sample_rate(Key::GPS5, SampleRatePrecision::Fast).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn atom_header_sizes() {
    let bytes = atom64(b"mdat", &[0; 8]);
    let hdr = AtomHeader::read(&mut Cursor::new(&bytes), 0, bytes.len() as u64, true).unwrap();
    assert_eq!(hdr.header_size(), 16);
    assert_eq!(hdr.atom_size(), 24);
    assert_eq!(hdr.data_size(), 8);

    // size 0 extends to end of file, top-level only
    let mut bytes = atom(b"mdat", &[0; 8]);
    bytes[.. 4].copy_from_slice(&[0; 4]);
    let hdr = AtomHeader::read(&mut Cursor::new(&bytes), 0, 100, true).unwrap();
    assert_eq!(hdr.atom_size(), 100);
    let err = AtomHeader::read(&mut Cursor::new(&bytes), 0, 100, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptBox);

    // smaller than header
    let mut bytes = atom(b"free", &[0; 8]);
    bytes[.. 4].copy_from_slice(&4_u32.to_be_bytes());
    let err = AtomHeader::read(&mut Cursor::new(&bytes), 0, 16, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptBox);

    // past parent
    let bytes = atom(b"free", &[0; 8]);
    let err = AtomHeader::read(&mut Cursor::new(&bytes), 0, 12, false).unwrap_err();
    assert!(matches!(err, GpmfError::CorruptBox{..}));

    let err = AtomHeader::read(&mut Cursor::new(&bytes[.. 6]), 0, 6, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptBox);
}

fn descriptor() -> TrackDescriptor {
    TrackDescriptor {
        track_id: 1,
        name: String::from("GoPro MET"),
        handler: *b"meta",
        format: *b"gpmd",
        time_scale: 1000,
        duration: 600,
        chunk_offsets: vec![100, 200, 300, 400],
        samples_per_chunk: vec![(1, 2), (3, 1)],
        sample_sizes: SampleSizes::Fixed { size: 10, count: 6 },
        sample_durations: vec![(6, 100)],
    }
}

#[test]
fn payload_index_expansion() {
    let track = descriptor();
    assert!(track.validate().is_ok());
    assert_eq!(track.chunk_sample_counts().unwrap(), vec![2, 2, 1, 1]);

    let index = PayloadIndex::new(&track, 1000).unwrap();
    let offsets: Vec<u64> = index.iter().map(|p| p.offset()).collect();
    assert_eq!(offsets, vec![100, 110, 200, 210, 300, 400]);

    for (a, b) in index.iter().zip(index.iter().skip(1)) {
        assert_eq!(a.end(), b.start());
        assert!(a.start() < a.end());
    }
    assert_eq!(index.time(0).unwrap(), (0.0, 0.1));
    assert_eq!(index.duration(), 0.6);
    assert_eq!(index.get(6).unwrap_err().kind(), ErrorKind::IndexOutOfRange);

    let total: u64 = index.iter().map(|p| p.size() as u64).sum();
    assert_eq!(total, track.sample_sizes().total());

    let err = PayloadIndex::new(&track, 405).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptBox);
}

#[test]
fn payload_index_table_mismatch() {
    let mut track = descriptor();
    track.sample_sizes = SampleSizes::Table(vec![10; 5]);
    assert_eq!(track.validate().unwrap_err().kind(), ErrorKind::CorruptBox);

    let mut track = descriptor();
    track.samples_per_chunk = vec![(0, 2)];
    assert_eq!(track.validate().unwrap_err().kind(), ErrorKind::CorruptBox);
}

#[test]
fn compact_sample_sizes() {
    // 4-bit sizes, odd entry count
    let payloads = vec![
        u32_value(b"TICK", 1),
        node(b"EMPT", b'B', 0, 0, &[]),
        u32_value(b"TICK", 2),
    ];
    let small = Mp4Builder::new(vec![payloads.clone()]);
    let medium = Mp4Builder::new(vec![
        vec![accl_payload(5), accl_payload(1)],
        vec![accl_payload(8)],
    ]);
    let large = Mp4Builder::new(vec![
        vec![accl_payload(100)],
        vec![accl_payload(2), accl_payload(300)],
    ]);

    for (field_size, mut builder) in [(4, small), (8, medium), (16, large)] {
        builder.stz2 = Some(field_size);
        let expected = builder.payloads();
        let file = builder.write();
        let mut mp4 = Mp4::new(file.path()).unwrap();

        let sizes: Vec<u32> = expected.iter().map(|p| p.len() as u32).collect();
        assert_eq!(mp4.track().sample_sizes(), &SampleSizes::Table(sizes), "stz2 field size {field_size}");
        assert_eq!(mp4.payload_count(), 3);
        for (i, payload) in expected.iter().enumerate() {
            assert_eq!(&mp4.payload_bytes(i).unwrap(), payload);
        }
    }

    assert_eq!(payloads.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![12, 8, 12]);
}

#[test]
fn media_header_version_1() {
    let mut builder = three_payloads();
    builder.mdhd_v1_duration = Some(5_000_000_000);
    let file = builder.write();
    let mp4 = Mp4::new(file.path()).unwrap();

    assert_eq!(mp4.track().time_scale(), 1000);
    assert_eq!(mp4.track().duration_unscaled(), 5_000_000_000);
    assert_eq!(mp4.duration_secs(), 5_000_000.0);
    // payload timing comes from stts
    assert_eq!(mp4.payload_time(2).unwrap(), (2.0, 3.0));
}
