//! Histogram-driven tone mapping

pub mod gamma;
pub mod histogram;

pub use gamma::{GammaCurve, GammaFilter, ToneConfig};
pub use histogram::{Histogram, DEFAULT_COARSENESS};
