//! Packed profile decoder.
//!
//! Field order, after the gzip layer is removed:
//!
//! ```text
//! cookie "PPK" (3 x u16) | version i32 | compatibility i32
//! v >= 2: pad i32 | skip i32 | skip bytes | trial metadata | thread metadata
//! v <  2: skip i32 | skip bytes
//! metrics | groups | events (+ group refs) | user events | thread data
//! ```

use super::document::Document;
use super::model::{FunctionProfile, Profile, ThreadKey, UserEventProfile};
use crate::codec::ByteReader;
use crate::parser::{Event, Hotspots};
use crate::utils::config::{MAX_COMPATIBILITY, METADATA_VERSION, PPK_COOKIE};
use crate::utils::error::{CodecError, DocumentError};
use log::{debug, info};

/// Decode an inflated packed profile
///
/// The whole buffer must be consumed; trailing bytes are an error.
///
/// # Errors
/// * `CodecError::InvalidFormat` - bad cookie or string
/// * `CodecError::IncompatibleVersion` - compatibility level above 2
/// * `CodecError::TruncatedBuffer` - the buffer ends early
/// * `CodecError::MalformedDocument` - bad counts, indices or trailing bytes
/// * `ParseError` - an event name cannot be classified
pub fn decode_document(buf: &[u8], hotspots: &Hotspots) -> Result<Document, DocumentError> {
    let mut r = ByteReader::new(buf);

    for expected in PPK_COOKIE {
        let c = r.read_char()?;
        if c != expected {
            return Err(CodecError::InvalidFormat(format!(
                "bad magic cookie: expected `{}`, found {:?}",
                expected, c
            ))
            .into());
        }
    }

    let version = r.read_i32()?;
    let compatibility = r.read_i32()?;
    if compatibility > MAX_COMPATIBILITY {
        return Err(CodecError::IncompatibleVersion(compatibility).into());
    }
    debug!("PPK version {} compatibility {}", version, compatibility);

    let mut doc = Document::new(version, compatibility);

    if version >= METADATA_VERSION {
        doc.pad = r.read_i32()?;
        doc.skip_len = r.read_count("skip length")?;
        r.skip(doc.skip_len)?;
        read_metadata(&mut r, &mut doc)?;
    } else {
        doc.skip_len = r.read_count("skip length")?;
        r.skip(doc.skip_len)?;
    }

    for _ in 0..r.read_count("metric count")? {
        let metric = r.read_utf()?;
        if doc.metrics().contains(&metric) {
            return Err(malformed(format!("duplicate metric `{}`", metric)));
        }
        doc.add_metric(metric);
    }

    for _ in 0..r.read_count("group count")? {
        let group = r.read_utf()?;
        if doc.groups().contains(&group) {
            return Err(malformed(format!("duplicate group `{}`", group)));
        }
        doc.add_group(group);
    }

    read_events(&mut r, &mut doc, hotspots)?;

    for _ in 0..r.read_count("user event count")? {
        let name = r.read_utf()?;
        doc.add_user_event(name);
    }

    read_thread_data(&mut r, &mut doc)?;

    if !r.is_at_end() {
        return Err(malformed(format!(
            "{} trailing bytes after offset {}",
            r.remaining(),
            r.position()
        )));
    }

    doc.populate_aggregates();
    info!(
        "Decoded {} metrics, {} events, {} threads",
        doc.metrics().len(),
        doc.events().len(),
        doc.threads().len()
    );
    Ok(doc)
}

fn malformed(msg: String) -> DocumentError {
    CodecError::MalformedDocument(msg).into()
}

fn read_thread_key(r: &mut ByteReader<'_>) -> Result<ThreadKey, CodecError> {
    Ok(ThreadKey::new(r.read_i32()?, r.read_i32()?, r.read_i32()?))
}

fn read_pairs(r: &mut ByteReader<'_>, what: &str) -> Result<Vec<(String, String)>, CodecError> {
    let count = r.read_count(what)?;
    let mut pairs = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        let name = r.read_utf()?;
        let value = r.read_utf()?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

fn read_metadata(r: &mut ByteReader<'_>, doc: &mut Document) -> Result<(), CodecError> {
    for (name, value) in read_pairs(r, "metadata count")? {
        doc.insert_metadata(name, value);
    }

    for _ in 0..r.read_count("thread metadata count")? {
        let key = read_thread_key(r)?;
        let pairs = read_pairs(r, "thread metadata entry count")?;
        let thread = doc.thread_mut(key);
        for (name, value) in pairs {
            thread.insert_metadata(name, value);
        }
    }
    Ok(())
}

fn read_events(
    r: &mut ByteReader<'_>,
    doc: &mut Document,
    hotspots: &Hotspots,
) -> Result<(), DocumentError> {
    let count = r.read_count("event count")?;
    for _ in 0..count {
        let name = r.read_utf()?;
        let mut event = Event::parse(&name, hotspots)?;

        for _ in 0..r.read_count("group reference count")? {
            let index = r.read_count("group index")?;
            let group = doc.groups().get(index).ok_or_else(|| {
                malformed(format!(
                    "event `{}` references group {} of {}",
                    name,
                    index,
                    doc.groups().len()
                ))
            })?;
            event.add_group(group.clone());
        }
        doc.add_event(event);
    }
    debug!("Read {} events", count);
    Ok(())
}

fn read_thread_data(r: &mut ByteReader<'_>, doc: &mut Document) -> Result<(), CodecError> {
    let metrics = doc.metrics().to_vec();

    for _ in 0..r.read_count("thread count")? {
        let key = read_thread_key(r)?;
        doc.thread_mut(key);

        for _ in 0..r.read_count("function profile count")? {
            let event_id = r.read_count("function id")?;
            let mut profile = Profile::new(r.read_f64()?, r.read_f64()?);
            for metric in &metrics {
                let exclusive = r.read_f64()?;
                let inclusive = r.read_f64()?;
                profile.set(metric, exclusive, inclusive);
            }
            doc.add_function_profile(key, FunctionProfile { event_id, profile })?;
        }

        for _ in 0..r.read_count("user event profile count")? {
            let profile = UserEventProfile {
                user_event_id: r.read_count("user event id")?,
                num_samples: r.read_i32()?,
                min: r.read_f64()?,
                max: r.read_f64()?,
                mean: r.read_f64()?,
                sum_squares: r.read_f64()?,
            };
            doc.add_user_event_profile(key, profile)?;
        }
    }
    Ok(())
}
