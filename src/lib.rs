//! Amora - retrieval-augmented companion chat server
//!
//! Proxies chat requests to the Gemini API, optionally grounding the model
//! with stored todo records ranked by embedding similarity, and streams
//! replies over SSE.

pub mod chat;
pub mod config;
pub mod errors;
pub mod gemini;
pub mod handlers;
pub mod similarity;
pub mod store;
pub mod validation;
