//! HTTP API handlers
//!
//! Each submodule handles one domain of the REST surface.

pub mod chat;
pub mod health;
pub mod router;
pub mod state;
pub mod todos;
pub mod types;

pub use router::build_router;
pub use state::{AppContext, AppState};
pub use types::*;
