//! Data models for ingestion
//!
//! Raw captures, canonical drafts, checkpoints and the run-tracker state
//! machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{EtlError, EtlResult};

/// A fetched payload as captured for audit, before any transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Provenance id: native row id for files, bounded hash for the API
    pub external_id: Option<i64>,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl RawRecord {
    pub fn new(external_id: Option<i64>, payload: Value) -> Self {
        Self {
            external_id,
            payload,
            received_at: Utc::now(),
        }
    }
}

/// Canonical record shape produced by the transformer
///
/// Fields are private so the source tag can only enter lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedRecordDraft {
    source: String,
    external_id: String,
    name: Option<String>,
    value: Option<i64>,
    timestamp: DateTime<Utc>,
}

impl UnifiedRecordDraft {
    pub fn new(
        source: &str,
        external_id: impl Into<String>,
        name: Option<String>,
        value: Option<i64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.to_lowercase(),
            external_id: external_id.into(),
            name,
            value,
            timestamp,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> Option<i64> {
        self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Stored unified row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnifiedRecord {
    pub id: i64,
    pub source: String,
    pub external_id: String,
    pub name: Option<String>,
    pub value: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Result of loading one draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Per-source watermark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Checkpoint {
    pub source: String,
    pub last_external_id: Option<i64>,
    pub last_run_at: DateTime<Utc>,
}

/// Persisted run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RUNNING" => Ok(RunStatus::Running),
            "SUCCESS" => Ok(RunStatus::Success),
            "FAILURE" => Ok(RunStatus::Failure),
            _ => Err(anyhow::anyhow!("Invalid run status: {}", s)),
        }
    }
}

/// Lifecycle of one synchronization attempt
///
/// ```text
/// Running ──succeed(n)──> Success { records_processed: n }
///    └─────fail(msg)────> Failure { message: msg }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Success { records_processed: i64 },
    Failure { message: String },
}

impl RunState {
    pub fn status(&self) -> RunStatus {
        match self {
            RunState::Running => RunStatus::Running,
            RunState::Success { .. } => RunStatus::Success,
            RunState::Failure { .. } => RunStatus::Failure,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }

    pub fn succeed(self, records_processed: i64) -> EtlResult<RunState> {
        match self {
            RunState::Running => Ok(RunState::Success { records_processed }),
            other => Err(EtlError::InvalidTransition {
                from: other.status().as_str(),
                to: RunStatus::Success.as_str(),
            }),
        }
    }

    pub fn fail(self, message: impl Into<String>) -> EtlResult<RunState> {
        match self {
            RunState::Running => Ok(RunState::Failure {
                message: message.into(),
            }),
            other => Err(EtlError::InvalidTransition {
                from: other.status().as_str(),
                to: RunStatus::Failure.as_str(),
            }),
        }
    }
}

/// One row of run history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlRun {
    pub id: i64,
    pub source: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl EtlRun {
    /// Mark the run successful; valid only while running
    pub fn succeed(&mut self, records_processed: i64) -> EtlResult<()> {
        self.state = self.state.clone().succeed(records_processed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run failed; valid only while running
    pub fn fail(&mut self, message: impl Into<String>) -> EtlResult<()> {
        self.state = self.state.clone().fail(message)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        self.state.status()
    }

    pub fn records_processed(&self) -> i64 {
        match self.state {
            RunState::Success { records_processed } => records_processed,
            _ => 0,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            RunState::Failure { message } => Some(message),
            _ => None,
        }
    }
}

/// Run history row as read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EtlRunRow {
    pub id: i64,
    pub source: String,
    pub status: String,
    pub records_processed: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&EtlRun> for EtlRunRow {
    fn from(run: &EtlRun) -> Self {
        Self {
            id: run.id,
            source: run.source.clone(),
            status: run.status().as_str().to_string(),
            records_processed: run.records_processed(),
            error_message: run.error_message().map(str::to_string),
            started_at: run.started_at,
            finished_at: run.finished_at,
        }
    }
}

/// Outcome of one successful source attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: i64,
    pub source: String,
    /// Payloads returned by the adapter
    pub fetched: usize,
    /// Raw rows appended
    pub captured: usize,
    /// Drafts upserted (the run's records_processed)
    pub loaded: usize,
    /// Records dropped under the skip policy
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
    pub checkpoint_before: Option<i64>,
    pub checkpoint_after: Option<i64>,
}
