//! Common utilities module
//!
//! This module contains the error type and the non-fatal diagnostics channel
//! shared by every stage of the development pipeline.

pub mod diagnostics;
pub mod error;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{DevelopError, Result};
