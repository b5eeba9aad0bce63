//! HTTP API for the MaaS gateway control plane: Subscription Selector (F),
//! Model-List Access Filter (G), Identity Extractor (H), and API-Key
//! Service (I) (spec.md §4.4-§4.7, §6). Grounded throughout on
//! `acteon-server`'s module layout.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod probe;
pub mod telemetry;

pub use api::AppState;
pub use config::AppConfig;
pub use error::ServerError;
