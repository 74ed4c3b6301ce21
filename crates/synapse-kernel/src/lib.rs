//! Synapse kernel.
//!
//! Shared vocabulary for every other crate in the workspace:
//!
//! - **[`service`]** -- The closed set of services Synapse can talk to.
//! - **[`command`]** -- The structured [`Command`] produced by the intent
//!   parser and consumed by the dispatcher, plus its parameter map.
//! - **[`outcome`]** -- The uniform success/error envelope returned by every
//!   connector and by the dispatcher, and the per-service status report.
//! - **[`router`]** -- Generic ordered rule engine.  Service rule sets are
//!   declared as static data and compiled into a [`RuleTable`].
//! - **[`error`]** -- Kernel error types via [`thiserror`].

pub mod command;
pub mod error;
pub mod outcome;
pub mod router;
pub mod service;

pub use command::{Command, ParamValue, Params};
pub use error::{KernelError, Result};
pub use outcome::{FailureKind, Outcome, StatusReport, StatusState};
pub use router::{
    ExtractorSpec, RuleMatch, RuleSetSpec, RuleSpec, RuleTable, Source, ValueKind,
};
pub use service::ServiceId;
