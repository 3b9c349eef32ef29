use serde::{Deserialize, Serialize};

/// Current version of the trace log format.
pub const TRACE_LOG_VERSION: u32 = 1;

const MAX_SUPPORTED_VERSION: u32 = 1;

/// One scheduler or simulator step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    TaskStarted { task: u64 },
    TaskRejected { active: u64 },
    MicrotaskQueued { task: u64, queued: usize },
    MicrotaskRan { task: u64 },
    TaskResumed { task: u64 },
    TaskCompleted { task: u64, microtasks: usize },
    TaskFailed { task: u64, error: String },
    EventDispatched {
        sequence: u64,
        target: u64,
        event_type: String,
        unique: bool,
    },
    EventCoalesced { replaced: u64, by: u64 },
    WorkLoopStarted { batch: usize },
    EventDelivered { sequence: u64, task: u64 },
    EventSkipped { sequence: u64 },
}

/// Ordered record of everything the harness did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceLog {
    #[serde(default = "default_version")]
    version: u32,
    events: Vec<TraceEvent>,
}

fn default_version() -> u32 {
    TRACE_LOG_VERSION
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceLog {
    pub fn new() -> Self {
        TraceLog {
            version: TRACE_LOG_VERSION,
            events: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }

    /// Rejects logs newer than this build understands.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let log: TraceLog = serde_json::from_str(json).map_err(|e| e.to_string())?;
        if log.version > MAX_SUPPORTED_VERSION {
            return Err(format!(
                "unsupported trace log version {}: max supported is {}",
                log.version, MAX_SUPPORTED_VERSION
            ));
        }
        Ok(log)
    }

    /// Compare two runs event by event.
    pub fn verify(original: &TraceLog, replay: &TraceLog) -> TraceComparison {
        let orig = original.events();
        let repl = replay.events();

        for (i, (o, r)) in orig.iter().zip(repl.iter()).enumerate() {
            if o != r {
                return TraceComparison::Diverged {
                    reason: format!("event #{i} differs: {o:?} vs {r:?}"),
                };
            }
        }

        if orig.len() != repl.len() {
            return TraceComparison::Diverged {
                reason: format!("different event count: {} vs {}", orig.len(), repl.len()),
            };
        }

        TraceComparison::Identical
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceComparison {
    Identical,
    Diverged { reason: String },
}
