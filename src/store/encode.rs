//! Packed profile encoder, the mirror of `decode`.

use super::document::Document;
use super::model::{Profile, Thread, ThreadKey};
use crate::codec::ByteWriter;
use crate::utils::config::{METADATA_VERSION, PAD_BYTE, PPK_COOKIE};
use crate::utils::error::CodecError;
use log::debug;

/// Encode a document into an uncompressed packed profile
///
/// Every function profile is written with one value pair per document
/// metric, in metric-list order.
///
/// # Errors
/// * `CodecError::MalformedDocument` - a profile lacks one of the
///   document's metrics, or an event names an unknown group
/// * `CodecError::InvalidFormat` - a string longer than 65535 bytes
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, CodecError> {
    let mut w = ByteWriter::new();

    for c in PPK_COOKIE {
        w.write_char(c)?;
    }
    w.write_i32(doc.version);
    w.write_i32(doc.compatibility);

    if doc.version >= METADATA_VERSION {
        w.write_i32(doc.pad);
        w.write_count(doc.skip_len)?;
        w.write_padding(doc.skip_len, PAD_BYTE);

        w.write_count(doc.metadata().len())?;
        for (name, value) in doc.metadata() {
            w.write_utf(name)?;
            w.write_utf(value)?;
        }

        w.write_count(doc.threads().len())?;
        for thread in doc.threads() {
            write_thread_key(&mut w, thread.key());
            w.write_count(thread.metadata().len())?;
            for (name, value) in thread.metadata() {
                w.write_utf(name)?;
                w.write_utf(value)?;
            }
        }
    } else {
        w.write_count(doc.skip_len)?;
        w.write_padding(doc.skip_len, PAD_BYTE);
    }

    write_names(&mut w, doc.metrics())?;
    write_names(&mut w, doc.groups())?;

    w.write_count(doc.events().len())?;
    for event in doc.events() {
        w.write_utf(&event.full_name)?;
        w.write_count(event.groups.len())?;
        for group in &event.groups {
            let index = doc
                .groups()
                .iter()
                .position(|g| g == group)
                .ok_or_else(|| {
                    CodecError::MalformedDocument(format!(
                        "event `{}` names unknown group `{}`",
                        event.full_name, group
                    ))
                })?;
            w.write_count(index)?;
        }
    }

    write_names(&mut w, doc.user_events())?;

    w.write_count(doc.threads().len())?;
    for thread in doc.threads() {
        write_thread_data(&mut w, thread, doc.metrics())?;
    }

    debug!("Encoded {} bytes", w.len());
    Ok(w.into_inner())
}

fn write_names(w: &mut ByteWriter, names: &[String]) -> Result<(), CodecError> {
    w.write_count(names.len())?;
    for name in names {
        w.write_utf(name)?;
    }
    Ok(())
}

fn write_thread_key(w: &mut ByteWriter, key: ThreadKey) {
    w.write_i32(key.node);
    w.write_i32(key.context);
    w.write_i32(key.thread);
}

fn write_thread_data(
    w: &mut ByteWriter,
    thread: &Thread,
    metrics: &[String],
) -> Result<(), CodecError> {
    write_thread_key(w, thread.key());

    w.write_count(thread.function_profiles().len())?;
    for fp in thread.function_profiles() {
        w.write_count(fp.event_id)?;
        w.write_f64(fp.profile.num_calls);
        w.write_f64(fp.profile.num_subroutine_calls);
        for metric in metrics {
            let (exclusive, inclusive) = readings(&fp.profile, metric).ok_or_else(|| {
                CodecError::MalformedDocument(format!(
                    "function id {} on thread {} has no `{}` reading",
                    fp.event_id,
                    thread.key(),
                    metric
                ))
            })?;
            w.write_f64(exclusive);
            w.write_f64(inclusive);
        }
    }

    w.write_count(thread.user_event_profiles().len())?;
    for up in thread.user_event_profiles() {
        w.write_count(up.user_event_id)?;
        w.write_i32(up.num_samples);
        w.write_f64(up.min);
        w.write_f64(up.max);
        w.write_f64(up.mean);
        w.write_f64(up.sum_squares);
    }
    Ok(())
}

fn readings(profile: &Profile, metric: &str) -> Option<(f64, f64)> {
    Some((
        *profile.exclusive.get(metric)?,
        *profile.inclusive.get(metric)?,
    ))
}
