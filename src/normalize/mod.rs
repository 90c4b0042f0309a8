pub mod color;
pub mod custom;
pub mod spacing;
pub mod typography;

pub use color::normalize_colors;
pub use custom::collect_custom_tokens;
pub use spacing::normalize_spacing;
pub use typography::{heading_monotonicity, normalize_typography};
