//! Designset Core Library
//!
//! Settings, error handling, character-encoding normalisation and the page
//! context model shared by the renderer and the server.

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod value;

pub use config::Settings;
pub use context::PageContext;
pub use encoding::Encoding;
pub use error::{CoreError, Result};
pub use value::{MergeError, deep_merge};
