pub mod edit;
pub mod expected;
pub mod history;
pub mod revision_detail;

pub use edit::*;
pub use expected::*;
pub use history::*;
pub use revision_detail::*;
