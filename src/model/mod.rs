pub mod common;
pub mod detail;
pub mod entity;
pub mod revision;
pub mod user;
pub mod user_context;

pub use common::*;
pub use detail::*;
pub use entity::*;
pub use revision::*;
pub use user::*;
pub use user_context::*;
