use autoperf_ppk::aggregator::Statistic;
use autoperf_ppk::codec::{compress, ByteWriter};
use autoperf_ppk::parser::{Event, Hotspots};
use autoperf_ppk::store::{
    decode_document, Document, Flavor, FunctionProfile, Profile, ThreadKey, UserEventProfile,
};
use autoperf_ppk::utils::error::{CodecError, DocumentError};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// Header of a version 2 document with empty skip block and metadata
fn header(w: &mut ByteWriter) {
    for c in ['P', 'P', 'K'] {
        w.write_char(c).unwrap();
    }
    w.write_i32(2); // version
    w.write_i32(1); // compatibility
    w.write_i32(0); // pad
    w.write_count(0).unwrap(); // skip length
    w.write_count(1).unwrap(); // trial metadata
    w.write_utf("Application").unwrap();
    w.write_utf("lulesh").unwrap();
    w.write_count(0).unwrap(); // thread metadata
}

/// One metric `TIME`, two events, the same readings on every thread
fn two_thread_document(threads: &[(i32, i32, i32)]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    header(&mut w);

    w.write_count(1).unwrap();
    w.write_utf("TIME").unwrap();

    w.write_count(1).unwrap();
    w.write_utf("TAU_DEFAULT").unwrap();

    w.write_count(2).unwrap();
    w.write_utf("main").unwrap();
    w.write_count(1).unwrap();
    w.write_count(0).unwrap();
    w.write_utf("main => [CONTEXT] solve").unwrap();
    w.write_count(0).unwrap();

    w.write_count(0).unwrap(); // user events

    w.write_count(threads.len()).unwrap();
    for &(n, c, t) in threads {
        w.write_i32(n);
        w.write_i32(c);
        w.write_i32(t);
        w.write_count(2).unwrap();
        for (id, excl, incl) in [(0, 40.0, 100.0), (1, 60.0, 60.0)] {
            w.write_count(id).unwrap();
            w.write_f64(1.0);
            w.write_f64(0.0);
            w.write_f64(excl);
            w.write_f64(incl);
        }
        w.write_count(0).unwrap();
    }
    w.into_inner()
}

#[test]
fn test_decode_hand_built_document() {
    let bytes = two_thread_document(&[(0, 0, 0)]);
    let doc = decode_document(&bytes, &Hotspots::none()).unwrap();

    assert_eq!(doc.version(), 2);
    assert_eq!(doc.metadata().get("Application").map(String::as_str), Some("lulesh"));
    assert_eq!(doc.metrics(), &["TIME".to_string()]);
    assert_eq!(doc.events()[0].groups, vec!["TAU_DEFAULT".to_string()]);
    assert!(doc.events()[1].is_derived);
    assert_eq!(doc.aggregate_events(), &["main".to_string()]);
    assert_eq!(
        doc.data_point(0, "main => [CONTEXT] solve", "TIME", Flavor::Exclusive)
            .unwrap(),
        60.0
    );
}

#[test]
fn test_identical_threads_reduce_consistently() {
    let bytes = two_thread_document(&[(0, 0, 0), (0, 0, 1)]);
    let doc = decode_document(&bytes, &Hotspots::none()).unwrap();

    let stat = |s| doc.aggregate("main", "TIME", s, Flavor::Exclusive);
    assert_eq!(stat(Statistic::Sum), 80.0);
    assert_eq!(stat(Statistic::Mean), 40.0);
    assert_eq!(stat(Statistic::Max), 40.0);
    assert_eq!(stat(Statistic::Min), 40.0);
    assert_eq!(stat(Statistic::StdDev), 0.0);
    assert_eq!(
        doc.aggregate("main", "TIME", Statistic::Sum, Flavor::Inclusive),
        200.0
    );
}

#[test]
fn test_sparse_threads_pad_with_zero() {
    // Thread ids are renumbered densely per context
    let bytes = two_thread_document(&[(0, 0, 0), (1, 0, 7)]);
    let doc = decode_document(&bytes, &Hotspots::none()).unwrap();
    let [n, c, t, _, _] = doc.view().shape();
    assert_eq!((n, c, t), (2, 1, 1));
    assert_eq!(doc.aggregate("main", "TIME", Statistic::Min, Flavor::Exclusive), 40.0);

    // Shape 2x1x2 leaves cell (1,0,1) empty
    let bytes = two_thread_document(&[(0, 0, 0), (0, 0, 1), (1, 0, 0)]);
    let doc = decode_document(&bytes, &Hotspots::none()).unwrap();
    let [n, c, t, _, _] = doc.view().shape();
    assert_eq!((n, c, t), (2, 1, 2));
    assert_eq!(doc.aggregate("main", "TIME", Statistic::Min, Flavor::Exclusive), 0.0);
    assert_eq!(doc.aggregate("main", "TIME", Statistic::Sum, Flavor::Exclusive), 120.0);
    assert_eq!(doc.aggregate("main", "TIME", Statistic::Mean, Flavor::Exclusive), 30.0);
}

#[test]
fn test_gzip_file_roundtrip() {
    let bytes = two_thread_document(&[(0, 0, 0), (0, 1, 0)]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.ppk");
    std::fs::write(&path, compress(&bytes).unwrap()).unwrap();

    let doc = Document::load(&path, &Hotspots::none()).unwrap();
    let copy = dir.path().join("copy.ppk");
    doc.save(&copy).unwrap();
    let again = Document::load(&copy, &Hotspots::none()).unwrap();

    assert_eq!(again.metrics(), doc.metrics());
    assert_eq!(again.events(), doc.events());
    assert_eq!(again.metadata(), doc.metadata());
    assert_eq!(again.threads().len(), 2);
    assert!(again.thread(ThreadKey::new(0, 1, 0)).is_some());
    assert_eq!(
        again.aggregate("main", "TIME", Statistic::Sum, Flavor::Exclusive),
        80.0
    );
}

#[test]
fn test_built_document_roundtrip_keeps_threads() {
    let hot = Hotspots::none();
    let mut doc = Document::default();
    doc.insert_metadata("Application", "lulesh");
    doc.add_metric("TIME");
    doc.add_metric("PAPI_TOT_CYC");
    doc.add_event(Event::parse("main", &hot).unwrap());
    doc.add_event(Event::parse("main => solve", &hot).unwrap());
    doc.add_event(Event::parse("main => solve => exchange", &hot).unwrap());
    doc.add_user_event("Message size sent");
    doc.add_user_event("Heap memory used (KB)");

    for (t, events) in [(0, vec![0, 1, 2]), (1, vec![0, 2])] {
        let key = ThreadKey::new(0, 0, t);
        doc.thread_mut(key).insert_metadata("Hostname", format!("node{}", t));
        for event_id in events {
            let base = (event_id as f64 + 1.0) * (t as f64 + 2.0);
            let mut profile = Profile::new(event_id as f64 + 1.0, 2.0 * event_id as f64);
            profile.set("TIME", base * 10.0, base * 25.0);
            profile.set("PAPI_TOT_CYC", base * 1000.0, base * 2500.0);
            doc.add_function_profile(key, FunctionProfile { event_id, profile })
                .unwrap();
        }
        doc.add_user_event_profile(
            key,
            UserEventProfile {
                user_event_id: 1,
                num_samples: 4 + t,
                min: 12.0,
                max: 96.5,
                mean: 40.25,
                sum_squares: 9012.5,
            },
        )
        .unwrap();
    }
    doc.add_user_event_profile(
        ThreadKey::new(0, 0, 0),
        UserEventProfile {
            user_event_id: 0,
            num_samples: 3,
            min: 8.0,
            max: 64.0,
            mean: 32.0,
            sum_squares: 4160.0,
        },
    )
    .unwrap();
    doc.populate_aggregates();

    let dir = tempdir().unwrap();
    let path = dir.path().join("built.ppk");
    doc.save(&path).unwrap();
    let again = Document::load(&path, &hot).unwrap();

    assert_eq!(again.version(), doc.version());
    assert_eq!(again.metadata(), doc.metadata());
    assert_eq!(again.metrics(), doc.metrics());
    assert_eq!(again.events(), doc.events());
    assert_eq!(again.user_events(), doc.user_events());
    assert_eq!(again.threads(), doc.threads());
    assert_eq!(
        again.aggregate("exchange", "PAPI_TOT_CYC", Statistic::Sum, Flavor::Inclusive),
        doc.aggregate("exchange", "PAPI_TOT_CYC", Statistic::Sum, Flavor::Inclusive)
    );
}

#[test]
fn test_bad_cookie() {
    let mut bytes = two_thread_document(&[(0, 0, 0)]);
    bytes[1] = b'X';
    let err = decode_document(&bytes, &Hotspots::none()).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Codec(CodecError::InvalidFormat(_))
    ));
}

#[test]
fn test_truncated_metric_table() {
    let mut w = ByteWriter::new();
    header(&mut w);
    w.write_count(5).unwrap();
    w.write_utf("TIME").unwrap();

    let err = decode_document(&w.into_inner(), &Hotspots::none()).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Codec(CodecError::TruncatedBuffer { .. })
    ));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = two_thread_document(&[(0, 0, 0)]);
    bytes.push(0);
    let err = decode_document(&bytes, &Hotspots::none()).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Codec(CodecError::MalformedDocument(_))
    ));
}

#[test]
fn test_future_compatibility_rejected() {
    let mut bytes = two_thread_document(&[(0, 0, 0)]);
    // compatibility word follows the 6-byte cookie and 4-byte version
    bytes[10..14].copy_from_slice(&3i32.to_be_bytes());
    let err = decode_document(&bytes, &Hotspots::none()).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Codec(CodecError::IncompatibleVersion(3))
    ));
}

#[test]
fn test_not_gzip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.ppk");
    std::fs::write(&path, two_thread_document(&[(0, 0, 0)])).unwrap();
    assert!(Document::load(&path, &Hotspots::none()).is_err());
}
