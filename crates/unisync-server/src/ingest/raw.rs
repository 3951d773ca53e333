//! Raw capture
//!
//! Every fetched payload is appended verbatim to its source's raw table,
//! whether or not it later transforms. Capture is an audit log: re-fetching
//! the same payload appends a second row.

use serde_json::Value;
use unisync_common::hashing::{stable_bounded_id, DEFAULT_ID_RANGE};

use super::config::SourceKind;
use super::error::EtlResult;
use super::models::RawRecord;
use super::sources::parse_native_id;
use super::store::EtlTransaction;

/// Provenance id used for raw ordering and the checkpoint
///
/// The remote API has no numeric sequence, so its string id is hashed into a
/// bounded range. File rows use their native integer id.
pub fn provenance_id(kind: SourceKind, payload: &Value) -> Option<i64> {
    let field = payload.get(kind.identifier_field());
    match kind {
        SourceKind::Api => {
            let id = match field {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            Some(stable_bounded_id(&id, DEFAULT_ID_RANGE))
        },
        SourceKind::Csv1 | SourceKind::Csv2 => field.and_then(Value::as_str).and_then(parse_native_id),
    }
}

/// Append every payload to the raw table and return their provenance ids
pub async fn persist(
    tx: &mut dyn EtlTransaction,
    kind: SourceKind,
    payloads: &[Value],
) -> EtlResult<Vec<i64>> {
    let mut ids = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let record = RawRecord::new(provenance_id(kind, payload), payload.clone());
        tx.insert_raw(kind, &record).await?;
        ids.extend(record.external_id);
    }
    Ok(ids)
}

/// Watermark after a run: the highest captured id, or the previous value
/// when nothing with an id was captured
pub fn next_watermark(previous: Option<i64>, captured: &[i64]) -> Option<i64> {
    captured.iter().copied().max().or(previous)
}
