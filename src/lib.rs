//! Normalizes per-page crawl observations into a design token and pattern
//! model plus a brand and information architecture model.

pub mod architecture;
pub mod assemble;
pub mod config;
pub mod error;
pub mod legacy;
pub mod model;
pub mod normalize;
pub mod patterns;
pub mod pipeline;
pub mod scoring;

pub use config::ExtractionConfig;
pub use error::{Diagnostic, Error, Result};
pub use legacy::{Conversion, LegacyBridge, LegacySchema};
pub use pipeline::{run_extraction, Extraction};
