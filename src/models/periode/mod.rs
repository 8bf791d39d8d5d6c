pub mod types;
pub mod queries;
pub mod registry;

pub use types::*;
pub use queries::*;
pub use registry::*;
