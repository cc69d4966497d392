//! volfetch library
//!
//! Resumable downloads onto a persistent volume, atomic publication of the
//! finished file, and extraction of downloaded archives in place.

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::core::config::{Config, ExistingPolicy, TransferJob};
pub use crate::core::download::{FetchOutcome, Fetcher};
pub use crate::core::runner::{JobRunner, RunSummary};
pub use crate::error::{Result, VolfetchError};
