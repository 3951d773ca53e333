//! Raw payload to canonical draft mapping
//!
//! [`Transformer::map_one`] handles exactly one payload and reports problems as
//! a [`SkipReason`]. [`Transformer::map_all`] applies the source's
//! [`MalformedPolicy`] to decide whether a bad record is dropped or ends the
//! attempt.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;
use unisync_common::time::parse_iso8601;

use super::config::{MalformedPolicy, SourceConfig, SourceKind};
use super::error::{EtlError, EtlResult, SkipReason};
use super::models::UnifiedRecordDraft;
use super::sources::parse_native_id;

/// Drafts produced from one fetch
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub drafts: Vec<UnifiedRecordDraft>,
    pub skipped: usize,
}

pub struct Transformer {
    source_name: String,
    kind: SourceKind,
    tag: String,
    policy: MalformedPolicy,
}

impl Transformer {
    pub fn for_source(source: &SourceConfig) -> Self {
        Self {
            source_name: source.name.clone(),
            kind: source.kind,
            tag: source.tag.clone(),
            policy: source.on_malformed,
        }
    }

    /// Map a single payload
    pub fn map_one(&self, raw: &Value) -> Result<UnifiedRecordDraft, SkipReason> {
        let obj = raw.as_object().ok_or(SkipReason::NotAnObject)?;
        match self.kind {
            SourceKind::Api => map_market_entry(&self.tag, obj),
            SourceKind::Csv1 => map_csv1_row(&self.tag, obj),
            SourceKind::Csv2 => map_csv2_row(&self.tag, obj),
        }
    }

    /// Map a batch under the configured malformed-record policy
    pub fn map_all(&self, payloads: &[Value]) -> EtlResult<TransformOutput> {
        let mut output = TransformOutput::default();

        for raw in payloads {
            match self.map_one(raw) {
                Ok(draft) => output.drafts.push(draft),
                Err(reason) => match self.policy {
                    MalformedPolicy::Skip => {
                        warn!(source = %self.source_name, %reason, "Skipping malformed record");
                        output.skipped += 1;
                    },
                    MalformedPolicy::Abort => {
                        return Err(EtlError::Malformed {
                            source_name: self.source_name.clone(),
                            reason,
                        });
                    },
                },
            }
        }

        Ok(output)
    }
}

fn map_market_entry(tag: &str, obj: &Map<String, Value>) -> Result<UnifiedRecordDraft, SkipReason> {
    let external_id = match obj.get("id") {
        None => "unknown".to_string(),
        Some(Value::Null) => "none".to_string(),
        Some(Value::String(id)) => id.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
    };

    let symbol = non_empty_str(obj, "symbol").map(str::to_uppercase);
    let name = non_empty_str(obj, "name").unwrap_or("Unknown");
    let display = match symbol {
        Some(symbol) => format!("{name} ({symbol})"),
        None => name.to_string(),
    };

    // Numbers truncate; strings must hold a whole number
    let value = match obj.get("current_price") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => 0,
        Some(Value::Bool(true)) => 1,
        Some(Value::Number(n)) => n.as_f64().map(truncate).unwrap_or(0),
        Some(Value::String(s)) if s.is_empty() => 0,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| SkipReason::InvalidField {
            field: "current_price",
            value: s.clone(),
        })?,
        Some(other) => {
            return Err(SkipReason::InvalidField {
                field: "current_price",
                value: other.to_string(),
            })
        },
    };

    let timestamp = non_empty_str(obj, "last_updated")
        .and_then(|raw| parse_iso8601(raw).ok())
        .unwrap_or_else(Utc::now);

    Ok(UnifiedRecordDraft::new(tag, external_id, Some(display), Some(value), timestamp))
}

fn map_csv1_row(tag: &str, obj: &Map<String, Value>) -> Result<UnifiedRecordDraft, SkipReason> {
    let external_id = required_native_id(obj, "id")?;
    let name = text(obj, "name").unwrap_or_default();
    let value = match text(obj, "value") {
        None => 0,
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| SkipReason::InvalidField {
            field: "value",
            value: raw.clone(),
        })?,
    };
    let timestamp = required_timestamp(obj, "timestamp")?;

    Ok(UnifiedRecordDraft::new(tag, external_id, Some(name), Some(value), timestamp))
}

fn map_csv2_row(tag: &str, obj: &Map<String, Value>) -> Result<UnifiedRecordDraft, SkipReason> {
    let external_id = required_native_id(obj, "record_id")?;
    let name = text(obj, "full_name").unwrap_or_default();
    let value = match text(obj, "score") {
        None => 0,
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(truncate)
            .ok_or(SkipReason::InvalidField {
                field: "score",
                value: raw.clone(),
            })?,
    };
    let timestamp = required_timestamp(obj, "created_at")?;

    Ok(UnifiedRecordDraft::new(tag, external_id, Some(name), Some(value), timestamp))
}

/// Drop the fractional part
fn truncate(f: f64) -> i64 {
    f.trunc() as i64
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// String or number field rendered as text
fn text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(obj: &Map<String, Value>, field: &'static str) -> Result<String, SkipReason> {
    text(obj, field).ok_or(SkipReason::MissingField(field))
}

/// File identifiers double as watermarks, so they must be integers
fn required_native_id(obj: &Map<String, Value>, field: &'static str) -> Result<String, SkipReason> {
    let raw = required_text(obj, field)?;
    match parse_native_id(&raw) {
        Some(_) => Ok(raw),
        None => Err(SkipReason::InvalidField { field, value: raw }),
    }
}

fn required_timestamp(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<DateTime<Utc>, SkipReason> {
    let raw = required_text(obj, field)?;
    parse_iso8601(&raw).map_err(|_| SkipReason::InvalidField { field, value: raw })
}
