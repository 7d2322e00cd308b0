//! Core types and utilities for the vessel patch pipeline.
//!
//! This crate provides the error type, configuration structures and small
//! value types shared by the data crate and the workspace tools.

pub mod cli;
pub mod config;
pub mod error;
pub mod types;

pub use cli::*;
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
