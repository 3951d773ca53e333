//! Per-request response metadata

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// `meta` block returned with list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub request_id: Uuid,
    pub api_latency_ms: f64,
}

/// Started when a handler begins; finished into a [`RequestMeta`]
pub struct RequestTimer {
    request_id: Uuid,
    started: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    pub fn finish(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id,
            api_latency_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
