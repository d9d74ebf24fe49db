use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::model::{
    Character, Id, NewRevision, Person, Revision, RevisionText, RevisionType, Subject, User,
};
use crate::store::traits::{
    EditStore, EditTransaction, EntityStore, NameStore, RevisionStore, Store,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    persons: BTreeMap<Id, Person>,
    characters: BTreeMap<Id, Character>,
    subjects: BTreeMap<Id, Subject>,
    users: BTreeMap<Id, User>,
    revisions: BTreeMap<Id, Revision>,
    texts: BTreeMap<Id, RevisionText>,
}

impl MemoryState {
    fn next_revision_id(&self) -> Id {
        self.revisions.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_text_id(&self) -> Id {
        self.texts.keys().next_back().map_or(1, |id| id + 1)
    }

    fn matching_revisions<'a>(
        &'a self,
        target_id: Id,
        types: &'a [RevisionType],
    ) -> impl Iterator<Item = &'a Revision> + 'a {
        self.revisions
            .values()
            .rev()
            .filter(move |r| r.target_id == target_id && types.contains(&r.rev_type))
    }

    /// Store `content` under a fresh revision id and a fresh single-entry blob
    fn append_revision(
        &mut self,
        target_id: Id,
        rev_type: RevisionType,
        creator_id: Id,
        created_at: i64,
        commit_message: String,
        content: serde_json::Value,
    ) -> Result<Id> {
        let id = self.next_revision_id();
        let text_id = self.next_text_id();
        let data = RevisionText::encode(&BTreeMap::from([(id, content)]))
            .context("Failed to encode revision text")?;

        self.texts.insert(text_id, RevisionText { id: text_id, data });
        self.revisions.insert(
            id,
            Revision {
                id,
                target_id,
                rev_type,
                creator_id,
                created_at,
                commit_message,
                text_id,
            },
        );
        Ok(id)
    }
}

fn names<T>(rows: &BTreeMap<Id, T>, ids: &[Id], name: impl Fn(&T) -> String) -> HashMap<Id, String> {
    ids.iter()
        .filter_map(|id| rows.get(id).map(|row| (*id, name(row))))
        .collect()
}

/// In-process store used by tests and local runs without PostgreSQL.
///
/// Readers share the lock; an edit transaction holds the write guard from
/// `begin` until commit or drop, which serializes concurrent editors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_person(&self, person: Person) {
        self.state.write().await.persons.insert(person.id, person);
    }

    pub async fn insert_character(&self, character: Character) {
        self.state.write().await.characters.insert(character.id, character);
    }

    pub async fn insert_subject(&self, subject: Subject) {
        self.state.write().await.subjects.insert(subject.id, subject);
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Append a revision the way the relation editors do, with an explicit timestamp.
    ///
    /// The revision id is one past the highest stored revision and the text id
    /// one past the highest stored blob, so the two sequences are independent.
    /// Rows added by [`insert_raw_revision`](Self::insert_raw_revision) whose
    /// `text_id` has no blob yet can end up sharing a text id with a later
    /// recorded revision; insert their blobs first.
    pub async fn record_revision(
        &self,
        target_id: Id,
        rev_type: RevisionType,
        creator_id: Id,
        created_at: i64,
        commit_message: &str,
        content: serde_json::Value,
    ) -> Result<Id> {
        self.state.write().await.append_revision(
            target_id,
            rev_type,
            creator_id,
            created_at,
            commit_message.to_string(),
            content,
        )
    }

    /// Insert a revision row as-is, without touching blobs.
    ///
    /// Ids are not checked against [`record_revision`](Self::record_revision)'s
    /// sequences; see there.
    pub async fn insert_raw_revision(&self, revision: Revision) {
        self.state.write().await.revisions.insert(revision.id, revision);
    }

    pub async fn insert_revision_text(&self, text: RevisionText) {
        self.state.write().await.texts.insert(text.id, text);
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn get_person(&self, id: Id) -> Result<Option<Person>> {
        Ok(self.state.read().await.persons.get(&id).cloned())
    }

    async fn get_character(&self, id: Id) -> Result<Option<Character>> {
        Ok(self.state.read().await.characters.get(&id).cloned())
    }

    async fn get_subject(&self, id: Id) -> Result<Option<Subject>> {
        Ok(self.state.read().await.subjects.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl RevisionStore for MemoryStore {
    async fn count_revisions(&self, target_id: Id, types: &[RevisionType]) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.matching_revisions(target_id, types).count() as i64)
    }

    async fn list_revisions(
        &self,
        target_id: Id,
        types: &[RevisionType],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .matching_revisions(target_id, types)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_revision(&self, id: Id) -> Result<Option<Revision>> {
        Ok(self.state.read().await.revisions.get(&id).cloned())
    }

    async fn get_revision_text(&self, text_id: Id) -> Result<Option<RevisionText>> {
        Ok(self.state.read().await.texts.get(&text_id).cloned())
    }
}

#[async_trait::async_trait]
impl NameStore for MemoryStore {
    async fn fetch_users(&self, ids: &[Id]) -> Result<HashMap<Id, User>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }

    async fn fetch_subject_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        Ok(names(&self.state.read().await.subjects, ids, |s| s.name.clone()))
    }

    async fn fetch_person_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        Ok(names(&self.state.read().await.persons, ids, |p| p.name.clone()))
    }

    async fn fetch_character_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        Ok(names(&self.state.read().await.characters, ids, |c| c.name.clone()))
    }
}

/// Writes go to a staged copy that replaces the shared state on commit.
pub struct MemoryEditTransaction {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait::async_trait]
impl EditTransaction for MemoryEditTransaction {
    async fn lock_person(&mut self, id: Id) -> Result<Option<Person>> {
        Ok(self.staged.persons.get(&id).cloned())
    }

    async fn update_person(&mut self, person: &Person) -> Result<()> {
        self.staged.persons.insert(person.id, person.clone());
        Ok(())
    }

    async fn lock_character(&mut self, id: Id) -> Result<Option<Character>> {
        Ok(self.staged.characters.get(&id).cloned())
    }

    async fn update_character(&mut self, character: &Character) -> Result<()> {
        self.staged.characters.insert(character.id, character.clone());
        Ok(())
    }

    async fn lock_subject(&mut self, id: Id) -> Result<Option<Subject>> {
        Ok(self.staged.subjects.get(&id).cloned())
    }

    async fn update_subject(&mut self, subject: &Subject) -> Result<()> {
        self.staged.subjects.insert(subject.id, subject.clone());
        Ok(())
    }

    async fn insert_revision(&mut self, revision: NewRevision) -> Result<Id> {
        self.staged.append_revision(
            revision.target_id,
            revision.rev_type,
            revision.creator_id,
            chrono::Utc::now().timestamp(),
            revision.commit_message,
            revision.content,
        )
    }

    async fn commit(self) -> Result<()> {
        let MemoryEditTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EditStore for MemoryStore {
    type Tx = MemoryEditTransaction;

    async fn begin(&self) -> Result<MemoryEditTransaction> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(MemoryEditTransaction { guard, staged })
    }
}

impl Store for MemoryStore {}
