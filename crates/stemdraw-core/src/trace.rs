use crate::error::DiagramError;
use crate::types::RequestId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Success,
    Skipped,
    Warn,
    Failed,
}

impl PhaseStatus {
    fn severity(self) -> u8 {
        match self {
            PhaseStatus::Success => 0,
            PhaseStatus::Skipped => 1,
            PhaseStatus::Warn => 2,
            PhaseStatus::Failed => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::Success => "success",
            PhaseStatus::Skipped => "skipped",
            PhaseStatus::Warn => "warn",
            PhaseStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceErrorInfo {
    pub kind: String,
    pub message: String,
    pub detail: Option<String>,
}

impl TraceErrorInfo {
    pub fn from_error(error: &DiagramError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub name: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: PhaseStatus,
    pub input_summary: String,
    pub output_summary: String,
    pub logs: Vec<String>,
    pub error: Option<TraceErrorInfo>,
}

/// The per-request structured trace. One of these exists per pipeline run;
/// it is serialized to `{log_dir}/{request_id}_trace.json` and mirrored as
/// one human-readable line per phase in `{log_dir}/{request_id}.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTrace {
    pub request_id: RequestId,
    pub started_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub status: PhaseStatus,
    pub phases: Vec<PhaseEntry>,
    pub error: Option<TraceErrorInfo>,
}

struct TracerState {
    trace: RequestTrace,
    human_lines: Vec<String>,
    started: Instant,
    log_dir: Option<PathBuf>,
}

/// Handle shared across pipeline phases. Cloning is cheap; one writer per
/// request is the expected discipline.
#[derive(Clone)]
pub struct Tracer {
    state: Arc<Mutex<TracerState>>,
}

impl Tracer {
    pub fn new(request_id: RequestId, log_dir: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TracerState {
                trace: RequestTrace {
                    request_id,
                    started_at: Utc::now(),
                    total_duration_ms: 0,
                    status: PhaseStatus::Success,
                    phases: Vec::new(),
                    error: None,
                },
                human_lines: Vec::new(),
                started: Instant::now(),
                log_dir,
            })),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.state.lock().trace.request_id
    }

    /// Open a phase span. Call `finish` (or one of its shorthands) on the
    /// returned recorder; a dropped recorder records nothing.
    pub fn begin(&self, name: &str, description: &str) -> PhaseRecorder {
        PhaseRecorder {
            tracer: self.clone(),
            name: name.to_string(),
            description: description.to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
            logs: Vec::new(),
            input_summary: String::new(),
        }
    }

    fn record(&self, entry: PhaseEntry) {
        let mut state = self.state.lock();
        let line = format!(
            "{} {} phase={} status={} duration_ms={} {}",
            entry.started_at.to_rfc3339(),
            match entry.status {
                PhaseStatus::Failed => "ERROR",
                PhaseStatus::Warn => "WARN",
                _ => "INFO",
            },
            entry.name,
            entry.status.as_str(),
            entry.duration_ms,
            entry.output_summary,
        );
        tracing::info!(
            phase = %entry.name,
            status = entry.status.as_str(),
            duration_ms = entry.duration_ms,
            "{}",
            entry.output_summary
        );
        state.human_lines.push(line);
        state.trace.phases.push(entry);
    }

    /// Close the trace, compute the aggregate status and persist both
    /// artifacts. Persistence failures are logged, never propagated.
    pub fn finalize(&self, error: Option<&DiagramError>) -> RequestTrace {
        let mut state = self.state.lock();
        state.trace.total_duration_ms = state.started.elapsed().as_millis() as u64;
        state.trace.error = error.map(TraceErrorInfo::from_error);
        state.trace.status = if error.is_some() {
            PhaseStatus::Failed
        } else {
            state
                .trace
                .phases
                .iter()
                .map(|p| p.status)
                .max_by_key(|s| s.severity())
                .map(|s| if s == PhaseStatus::Failed { PhaseStatus::Warn } else { s })
                .unwrap_or(PhaseStatus::Success)
        };

        let snapshot = state.trace.clone();
        if let Some(dir) = state.log_dir.clone() {
            let lines = state.human_lines.join("\n");
            drop(state);
            if let Err(e) = persist(&dir, &snapshot, &lines) {
                tracing::warn!(request_id = %snapshot.request_id, "failed to persist trace: {}", e);
            }
        }
        snapshot
    }

    pub fn snapshot(&self) -> RequestTrace {
        self.state.lock().trace.clone()
    }
}

fn persist(dir: &PathBuf, trace: &RequestTrace, lines: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(format!("{}.log", trace.request_id)), lines)?;
    let json = serde_json::to_string_pretty(trace)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(dir.join(format!("{}_trace.json", trace.request_id)), json)
}

/// In-flight phase span. Accumulates log lines, then records exactly one
/// `PhaseEntry` on finish.
pub struct PhaseRecorder {
    tracer: Tracer,
    name: String,
    description: String,
    started_at: DateTime<Utc>,
    started: Instant,
    logs: Vec<String>,
    input_summary: String,
}

impl PhaseRecorder {
    pub fn input(mut self, summary: impl Into<String>) -> Self {
        self.input_summary = summary.into();
        self
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    pub fn finish(self, status: PhaseStatus, output_summary: impl Into<String>) {
        self.finish_inner(status, output_summary.into(), None);
    }

    pub fn success(self, output_summary: impl Into<String>) {
        self.finish(PhaseStatus::Success, output_summary);
    }

    pub fn skip(self, reason: impl Into<String>) {
        self.finish(PhaseStatus::Skipped, reason);
    }

    pub fn warn(self, output_summary: impl Into<String>) {
        self.finish(PhaseStatus::Warn, output_summary);
    }

    pub fn fail(self, error: &DiagramError) {
        let info = TraceErrorInfo::from_error(error);
        self.finish_inner(PhaseStatus::Failed, error.to_string(), Some(info));
    }

    fn finish_inner(self, status: PhaseStatus, output_summary: String, error: Option<TraceErrorInfo>) {
        let entry = PhaseEntry {
            name: self.name,
            description: self.description,
            started_at: self.started_at,
            duration_ms: self.started.elapsed().as_millis() as u64,
            status,
            input_summary: self.input_summary,
            output_summary,
            logs: self.logs,
            error,
        };
        self.tracer.record(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn aggregate_status_reflects_worst_phase() {
        let tracer = Tracer::new(Uuid::new_v4(), None);
        tracer.begin("nlp", "extract").success("7 tools");
        tracer.begin("enrich", "llm").skip("disabled");
        tracer.begin("layout", "solve").warn("dropped 1 constraint");
        let trace = tracer.finalize(None);
        assert_eq!(trace.status, PhaseStatus::Warn);
        assert_eq!(trace.phases.len(), 3);
    }

    #[test]
    fn failed_request_carries_error_info() {
        let tracer = Tracer::new(Uuid::new_v4(), None);
        let err = DiagramError::LayoutUnsat("no tier succeeded".to_string());
        tracer.begin("layout", "solve").fail(&err);
        let trace = tracer.finalize(Some(&err));
        assert_eq!(trace.status, PhaseStatus::Failed);
        assert_eq!(trace.error.as_ref().unwrap().kind, "LAYOUT_UNSAT");
    }

    #[test]
    fn persists_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let tracer = Tracer::new(id, Some(dir.path().to_path_buf()));
        tracer.begin("render", "svg").success("812 bytes");
        tracer.finalize(None);

        assert!(dir.path().join(format!("{}.log", id)).exists());
        let json = std::fs::read_to_string(dir.path().join(format!("{}_trace.json", id))).unwrap();
        let parsed: RequestTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, id);
    }

    #[test]
    fn total_duration_covers_phase_sum() {
        let tracer = Tracer::new(Uuid::new_v4(), None);
        tracer.begin("a", "").success("");
        tracer.begin("b", "").success("");
        let trace = tracer.finalize(None);
        let phase_sum: u64 = trace.phases.iter().map(|p| p.duration_ms).sum();
        assert!(trace.total_duration_ms + 5 >= phase_sum);
    }
}
