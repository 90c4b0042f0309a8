pub mod accessibility;
pub mod modernity;
pub mod performance;
pub mod quality;

pub use modernity::{modernity_score, ModernitySignals};
pub use quality::{score_quality, QualityInputs};
