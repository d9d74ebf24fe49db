pub mod extract;
pub mod handlers;
pub mod history_handlers;
pub mod routes;
pub mod user_extractor;
pub mod wiki_handlers;

pub use extract::{WikiJson, WikiPath, WikiQuery};
pub use handlers::*;
pub use history_handlers::*;
pub use routes::*;
pub use wiki_handlers::*;
