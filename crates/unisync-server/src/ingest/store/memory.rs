//! In-process store
//!
//! Transactions buffer their writes and apply them to the shared state on
//! commit; dropping or rolling back discards them. Leases live in the shared
//! state and are released when the transaction goes away.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{EtlStore, EtlTransaction};
use crate::ingest::config::SourceKind;
use crate::ingest::error::EtlResult;
use crate::ingest::models::{
    Checkpoint, EtlRun, EtlRunRow, RawRecord, RunState, UnifiedRecord, UnifiedRecordDraft,
    UpsertOutcome,
};

type UnifiedKey = (String, String);

#[derive(Default)]
struct MemoryState {
    raw: HashMap<SourceKind, Vec<RawRecord>>,
    unified: BTreeMap<UnifiedKey, UnifiedRecord>,
    checkpoints: BTreeMap<String, Checkpoint>,
    runs: Vec<EtlRun>,
    leases: HashSet<String>,
    next_unified_id: i64,
    next_run_id: i64,
}

impl MemoryState {
    fn save_run(&mut self, run: &EtlRun) {
        match self.runs.iter_mut().find(|r| r.id == run.id) {
            Some(existing) => *existing = run.clone(),
            None => self.runs.push(run.clone()),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryEtlStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryEtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_state(&self.state)
    }

    /// Unified rows ordered by id
    pub fn unified_records(&self) -> Vec<UnifiedRecord> {
        let mut rows: Vec<_> = self.lock().unified.values().cloned().collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    pub fn raw_records(&self, kind: SourceKind) -> Vec<RawRecord> {
        self.lock().raw.get(&kind).cloned().unwrap_or_default()
    }

    /// Full run history in insertion order
    pub fn runs(&self) -> Vec<EtlRunRow> {
        self.lock().runs.iter().map(EtlRunRow::from).collect()
    }

    pub fn checkpoint(&self, source: &str) -> Option<Checkpoint> {
        self.lock().checkpoints.get(source).cloned()
    }
}

fn lock_state(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl EtlStore for MemoryEtlStore {
    async fn begin(&self) -> EtlResult<Box<dyn EtlTransaction>> {
        Ok(Box::new(MemoryEtlTransaction {
            state: Arc::clone(&self.state),
            leases: Vec::new(),
            raw: Vec::new(),
            unified: BTreeMap::new(),
            checkpoints: BTreeMap::new(),
            runs: Vec::new(),
        }))
    }

    async fn start_run(&self, source: &str) -> EtlResult<EtlRun> {
        let mut state = self.lock();
        state.next_run_id += 1;
        let run = EtlRun {
            id: state.next_run_id,
            source: source.to_string(),
            state: RunState::Running,
            started_at: Utc::now(),
            finished_at: None,
        };
        state.runs.push(run.clone());
        Ok(run)
    }

    async fn finish_run(&self, run: &EtlRun) -> EtlResult<()> {
        self.lock().save_run(run);
        Ok(())
    }

    async fn latest_runs(&self) -> EtlResult<Vec<EtlRunRow>> {
        let state = self.lock();
        let mut latest: BTreeMap<&str, &EtlRun> = BTreeMap::new();
        for run in &state.runs {
            latest.insert(run.source.as_str(), run);
        }
        let rows = latest.into_values().map(EtlRunRow::from).collect();
        Ok(rows)
    }

    async fn checkpoints(&self) -> EtlResult<Vec<Checkpoint>> {
        Ok(self.lock().checkpoints.values().cloned().collect())
    }
}

struct PendingUnified {
    name: Option<String>,
    value: Option<i64>,
    timestamp: DateTime<Utc>,
}

pub struct MemoryEtlTransaction {
    state: Arc<Mutex<MemoryState>>,
    leases: Vec<String>,
    raw: Vec<(SourceKind, RawRecord)>,
    unified: BTreeMap<UnifiedKey, PendingUnified>,
    checkpoints: BTreeMap<String, Option<i64>>,
    runs: Vec<EtlRun>,
}

impl MemoryEtlTransaction {
    fn apply(&mut self) {
        let mut guard = lock_state(&self.state);
        let state = &mut *guard;
        let now = Utc::now();

        for (kind, record) in self.raw.drain(..) {
            state.raw.entry(kind).or_default().push(record);
        }

        for ((source, external_id), pending) in std::mem::take(&mut self.unified) {
            let key = (source.clone(), external_id.clone());
            match state.unified.get_mut(&key) {
                Some(row) => {
                    row.name = pending.name;
                    row.value = pending.value;
                    row.timestamp = pending.timestamp;
                },
                None => {
                    state.next_unified_id += 1;
                    let row = UnifiedRecord {
                        id: state.next_unified_id,
                        source,
                        external_id,
                        name: pending.name,
                        value: pending.value,
                        timestamp: pending.timestamp,
                    };
                    state.unified.insert(key, row);
                },
            }
        }

        for (source, last_external_id) in std::mem::take(&mut self.checkpoints) {
            state.checkpoints.insert(
                source.clone(),
                Checkpoint {
                    source,
                    last_external_id,
                    last_run_at: now,
                },
            );
        }

        for run in self.runs.drain(..) {
            state.save_run(&run);
        }
    }
}

impl Drop for MemoryEtlTransaction {
    fn drop(&mut self) {
        if self.leases.is_empty() {
            return;
        }
        let mut state = lock_state(&self.state);
        for source in self.leases.drain(..) {
            state.leases.remove(&source);
        }
    }
}

#[async_trait]
impl EtlTransaction for MemoryEtlTransaction {
    async fn try_lock_source(&mut self, source: &str) -> EtlResult<bool> {
        if self.leases.iter().any(|s| s == source) {
            return Ok(true);
        }
        let acquired = lock_state(&self.state).leases.insert(source.to_string());
        if acquired {
            self.leases.push(source.to_string());
        }
        Ok(acquired)
    }

    async fn read_checkpoint(&mut self, source: &str) -> EtlResult<Option<i64>> {
        if let Some(pending) = self.checkpoints.get(source) {
            return Ok(*pending);
        }
        Ok(lock_state(&self.state)
            .checkpoints
            .get(source)
            .and_then(|c| c.last_external_id))
    }

    async fn write_checkpoint(
        &mut self,
        source: &str,
        last_external_id: Option<i64>,
    ) -> EtlResult<()> {
        self.checkpoints.insert(source.to_string(), last_external_id);
        Ok(())
    }

    async fn insert_raw(&mut self, kind: SourceKind, record: &RawRecord) -> EtlResult<()> {
        self.raw.push((kind, record.clone()));
        Ok(())
    }

    async fn upsert_unified(&mut self, draft: &UnifiedRecordDraft) -> EtlResult<UpsertOutcome> {
        let key = (draft.source().to_string(), draft.external_id().to_string());
        let exists = self.unified.contains_key(&key)
            || lock_state(&self.state).unified.contains_key(&key);

        self.unified.insert(
            key,
            PendingUnified {
                name: draft.name().map(str::to_string),
                value: draft.value(),
                timestamp: draft.timestamp(),
            },
        );

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn complete_run(&mut self, run: &EtlRun) -> EtlResult<()> {
        self.runs.push(run.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> EtlResult<()> {
        let mut this = self;
        this.apply();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> EtlResult<()> {
        Ok(())
    }
}
