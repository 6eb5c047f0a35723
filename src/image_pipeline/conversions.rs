//! Pipeline orchestration
//!
//! Chains reading, scaling, demosaicing, colour conversion, tone mapping,
//! orientation and encoding, with per-stage timings and cancellation.

mod cancel;
mod config;
mod develop;
mod timing;


pub use cancel::CancelFlag;
pub use config::{DevelopConfig, DevelopConfigBuilder};
pub use develop::{DevelopedImage, RawDevelopPipeline};
pub use timing::{PipelineTimings, StageTiming, Timer};
