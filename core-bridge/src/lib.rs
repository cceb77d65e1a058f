//! # Core Bridge
//!
//! Transport-independent half of the host capability bridge.
//!
//! ## Overview
//!
//! Every host adapter plugs into the same pipeline:
//!
//! ```text
//! UI -> CapabilityFacade -> normalize -> CapabilityBackend -> host
//!                                         (Correlator or deadline guard)
//! UI <- CapabilityFacade <- reshape   <-
//! ```
//!
//! ## Components
//!
//! - **Facade** (`facade`): implements `FilesApi` and `GitHubApi` over any backend
//! - **Correlator** (`correlator`): pending-request table for message channels
//! - **Deadline guard** (`deadline`): timeout and cancel hook for direct transports
//! - **Timeout policy** (`timeouts`): per-operation-class budgets
//! - **Normalizer** (`normalize`): separators, option aliases, search limits
//! - **Reshaper** (`reshape`): default-filling of host results

pub mod cancel;
pub mod correlator;
pub mod deadline;
pub mod facade;
pub mod normalize;
pub mod reshape;
pub mod timeouts;

pub use cancel::{CancelEvent, CancelHook, CancelReason};
pub use correlator::{Correlator, DispatchOptions};
pub use deadline::run_with_deadline;
pub use facade::CapabilityFacade;
pub use normalize::{apply_aliases, normalize_path};
pub use timeouts::{OperationClass, TimeoutPolicy, TimeoutPolicyError};
