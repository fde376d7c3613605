//! The attendance reconciliation engine.
//!
//! Raw punches flow device → [`ingest`] → [`buffer`] → normalizer →
//! check-ins → reconciliation → open attendance → auto-submission. The
//! regularization processor applies approved corrections out of band.
//!
//! Everything here is generic over the collaborator traits in
//! [`punchcard_core::store`]; [`sync`] wires the stages into the batch jobs
//! the scheduler runs.

pub mod buffer;
pub mod device;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod http_device;
pub mod ingest;
pub mod normalize;
pub mod notify;
pub mod reconcile;
pub mod regularize;
pub mod report;
pub mod submit;
pub mod sync;

pub use engine::Engine;
pub use error::{Error, Result};
