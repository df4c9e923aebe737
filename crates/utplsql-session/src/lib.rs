//! utplsql-session: the database session boundary for the utPLSQL runner
//!
//! The runner never talks to a database driver directly. Everything it needs
//! from the server goes through the traits defined here, so a live Oracle
//! session and the in-memory fakes are interchangeable.
//!
//! ## Key Components
//!
//! - `DatabaseSession`: one open session (version query, reporter factory,
//!   suite execution, output retrieval, close)
//! - `SessionConnector`: acquires exactly one session per run
//! - `MappingOptions` / `SuiteRequest`: the data handed to suite execution

mod error;
pub mod fakes;
pub mod session_traits;

pub use error::SessionError;
pub use session_traits::{
    DatabaseSession, FrameworkVersion, MappingOptions, OutputChannel, Reporter, ReporterId,
    SessionConnector, SessionResult, SuiteRequest, SuiteVerdict, TypeMapping,
};
