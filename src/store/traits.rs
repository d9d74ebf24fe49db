use crate::model::{Character, Id, NewRevision, Person, Revision, RevisionText, RevisionType, Subject, User};
use anyhow::Result;
use std::collections::HashMap;

/// Point reads of wiki entities
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_person(&self, id: Id) -> Result<Option<Person>>;
    async fn get_character(&self, id: Id) -> Result<Option<Character>>;
    async fn get_subject(&self, id: Id) -> Result<Option<Subject>>;
}

/// Read access to the append-only revision log and its text blobs
#[async_trait::async_trait]
pub trait RevisionStore: Send + Sync {
    /// Number of distinct revisions of `target_id` having one of `types`
    async fn count_revisions(&self, target_id: Id, types: &[RevisionType]) -> Result<i64>;
    /// Matching revisions ordered by id descending
    async fn list_revisions(
        &self,
        target_id: Id,
        types: &[RevisionType],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Revision>>;
    async fn get_revision(&self, id: Id) -> Result<Option<Revision>>;
    async fn get_revision_text(&self, text_id: Id) -> Result<Option<RevisionText>>;
}

/// Bulk name lookups. Ids that do not resolve are absent from the result.
#[async_trait::async_trait]
pub trait NameStore: Send + Sync {
    async fn fetch_users(&self, ids: &[Id]) -> Result<HashMap<Id, User>>;
    async fn fetch_subject_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>>;
    async fn fetch_person_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>>;
    async fn fetch_character_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>>;
}

/// Unit of work for the edit path. Rows returned by `lock_*` stay locked
/// until the transaction commits or is dropped; dropping without
/// [`EditTransaction::commit`] discards every write.
#[async_trait::async_trait]
pub trait EditTransaction: Send {
    async fn lock_person(&mut self, id: Id) -> Result<Option<Person>>;
    async fn update_person(&mut self, person: &Person) -> Result<()>;
    async fn lock_character(&mut self, id: Id) -> Result<Option<Character>>;
    async fn update_character(&mut self, character: &Character) -> Result<()>;
    async fn lock_subject(&mut self, id: Id) -> Result<Option<Subject>>;
    async fn update_subject(&mut self, subject: &Subject) -> Result<()>;
    /// Allocate a revision id, store its text blob and append the revision row
    async fn insert_revision(&mut self, revision: NewRevision) -> Result<Id>;
    async fn commit(self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait EditStore: Send + Sync {
    type Tx: EditTransaction;

    async fn begin(&self) -> Result<Self::Tx>;
}

pub trait Store: EntityStore + RevisionStore + NameStore + EditStore + Send + Sync {}
