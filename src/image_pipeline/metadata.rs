//! Capture metadata access
//!
//! Every stage reads sensor geometry, levels, white balance, colour and
//! orientation data through the [`MetadataProvider`] trait, whatever library
//! extracted it from the capture.

pub mod keys;
mod in_memory;
mod provider;
mod rawloader_metadata;

pub use in_memory::InMemoryMetadata;
pub use provider::{MetadataProvider, MetadataValue};
pub use rawloader_metadata::RawLoaderMetadata;
