pub mod types;
pub mod transitions;
pub mod eligibility;
pub mod totals;
pub mod queries;

pub use types::*;
pub use transitions::*;
pub use eligibility::*;
pub use totals::*;
pub use queries::*;
