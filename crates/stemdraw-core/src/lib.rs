pub mod config;
pub mod constraint;
pub mod error;
pub mod trace;
pub mod traits;
pub mod types;

pub use config::{
    ConfigPatch, GeneratorConfig, LlmBackendConfig, PhaseTimeouts, PrimitiveLibraryConfig,
    ValidationMode,
};
pub use constraint::{Axis, Constraint, ConstraintKind, DistanceSpec, Priority};
pub use error::{DiagramError, Result};
pub use trace::{PhaseEntry, PhaseRecorder, PhaseStatus, RequestTrace, TraceErrorInfo, Tracer};
pub use traits::*;
pub use types::*;
