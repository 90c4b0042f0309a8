pub mod content;
pub mod patterns;
pub mod reports;
pub mod result;
pub mod samples;
pub mod tokens;

pub use content::*;
pub use patterns::*;
pub use reports::*;
pub use result::*;
pub use samples::*;
pub use tokens::*;
