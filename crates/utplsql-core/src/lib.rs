//! utPLSQL Runner Core Library
//!
//! Maps project files onto database objects, initializes reporters against a
//! session, runs the suite once and drains every reporter to its sinks.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod mapping;
pub mod obs;
pub mod plan;
pub mod reporter;
pub mod telemetry;

pub use config::RunConfig;
pub use coordinator::{RunCoordinator, RunOutcome, RunReport, RunState};
pub use error::{DrainError, MappingError, Result, RunError, RunFailure, SinkError};
pub use mapping::{
    CustomTypeMapping, MappingConfig, ObjectMapper, PathResolver, ResourceSpec, Role,
    RoleDefaults, RoleMappings,
};
pub use plan::{PlannedReport, RunPlan};
pub use reporter::{
    Console, CoreReporter, DrainSummary, OutputBuffer, ReportRegistry, ReportRequest,
    ReporterHandle, SinkTarget, SinkWriter,
};

pub use obs::{
    emit_reporter_drain_failed, emit_reporter_drained, emit_run_finished, emit_run_started,
    emit_session_close_failed, emit_state_changed, run_span,
};
pub use telemetry::init_tracing;

pub use utplsql_session::{DatabaseSession, MappingOptions, SessionConnector, SessionError};
