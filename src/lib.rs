//! Screening and variety sampling for curated content digests.
//!
//! Records are drawn from per-type pools by [`sampler::VarietySampler`],
//! screened field by field by [`admission::AdmissionController`] and
//! collected into a [`pipeline::CurationBatch`]. Rejections land in the
//! quarantine log of the caller's [`run::RunContext`].

pub mod admission;
pub mod config;
pub mod error;
pub mod finding;
pub mod links;
pub mod logging;
pub mod pipeline;
pub mod pool;
pub mod record;
pub mod run;
pub mod sampler;
pub mod sanitize;
pub mod scan;

pub use admission::{Admission, AdmissionController};
pub use error::{DigestGateError, Result};
pub use finding::{Finding, FindingKind, ScanResult, Severity};
pub use pipeline::{CurationBatch, CurationPipeline};
pub use record::{ContentRecord, SourceType};
pub use run::RunContext;
