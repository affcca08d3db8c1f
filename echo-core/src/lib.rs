//! # Echo Core
//!
//! Shared pieces used across the echo backend crates.
//!
//! ## Modules
//!
//! - [`error`] – Error taxonomy (`EchoError`) and crate-wide `Result`
//! - [`logger`] – tracing subscriber initialization

mod error;
mod logger;

pub use error::{EchoError, Result};
pub use logger::init_tracing;
