pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::WikiError;

// Export logic entry points
pub use logic::{
    check_expected, edit_character, edit_entity, edit_person, edit_subject, family_history,
    load_revision_detail, query_history, EditOutcome, EditRequest, ExpectedFieldSet,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

