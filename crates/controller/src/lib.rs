//! Reconcilers B/C/D, the finalizer/cascade manager (E), and the
//! backend-kind registry for the MaaS gateway control plane (spec.md §4.2,
//! §4.3).

pub mod backend;
pub mod context;
pub mod error;
pub mod finalizer;
pub mod recompute;
pub mod reconcile;

pub use backend::{BackendHandler, BackendRegistry, RouteRef};
pub use context::Context;
pub use error::ControllerError;
