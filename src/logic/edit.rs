use serde::Serialize;

use crate::error::WikiError;
use crate::logic::expected::{check_expected, ExpectedFieldSet};
use crate::model::{
    ensure_positive_id, Character, Id, MonoPatch, NewRevision, Person, Subject, SubjectPatch,
    UserContext, WikiEntity,
};
use crate::store::{EditStore, EditTransaction};

/// A wiki edit as submitted by a client
#[derive(Debug, Clone)]
pub struct EditRequest<P> {
    pub commit_message: String,
    /// Values the client loaded before editing; empty skips the check
    pub expected: ExpectedFieldSet,
    pub patch: P,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome<E> {
    pub revision_id: Id,
    pub entity: E,
}

/// Row access inside an edit transaction, per entity kind
#[async_trait::async_trait]
pub trait TransactionalEntity: WikiEntity + Sized {
    async fn lock<T: EditTransaction>(tx: &mut T, id: Id) -> anyhow::Result<Option<Self>>;
    async fn update<T: EditTransaction>(tx: &mut T, entity: &Self) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl TransactionalEntity for Person {
    async fn lock<T: EditTransaction>(tx: &mut T, id: Id) -> anyhow::Result<Option<Self>> {
        tx.lock_person(id).await
    }

    async fn update<T: EditTransaction>(tx: &mut T, entity: &Self) -> anyhow::Result<()> {
        tx.update_person(entity).await
    }
}

#[async_trait::async_trait]
impl TransactionalEntity for Character {
    async fn lock<T: EditTransaction>(tx: &mut T, id: Id) -> anyhow::Result<Option<Self>> {
        tx.lock_character(id).await
    }

    async fn update<T: EditTransaction>(tx: &mut T, entity: &Self) -> anyhow::Result<()> {
        tx.update_character(entity).await
    }
}

#[async_trait::async_trait]
impl TransactionalEntity for Subject {
    async fn lock<T: EditTransaction>(tx: &mut T, id: Id) -> anyhow::Result<Option<Self>> {
        tx.lock_subject(id).await
    }

    async fn update<T: EditTransaction>(tx: &mut T, entity: &Self) -> anyhow::Result<()> {
        tx.update_subject(entity).await
    }
}

fn ensure_editor(ctx: &UserContext) -> Result<Id, WikiError> {
    ctx.wiki_editor_id()
        .ok_or_else(|| WikiError::NotAllowed("edit wiki".to_string()))
}

fn ensure_commit_message(message: &str) -> Result<(), WikiError> {
    if message.trim().is_empty() {
        return Err(WikiError::InvalidArgument(
            "commit message must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Lock-state and expectation checks, then the in-memory mutation.
fn prepare_edit<E: WikiEntity>(
    entity: &mut E,
    expected: &ExpectedFieldSet,
    patch: E::Patch,
) -> Result<(), WikiError> {
    if entity.locked() {
        return Err(WikiError::Locked(format!("{} {}", E::KIND, entity.id())));
    }
    if entity.redirect() != 0 {
        return Err(WikiError::NotAllowed(format!(
            "edit {} {} merged into {}",
            E::KIND,
            entity.id(),
            entity.redirect()
        )));
    }

    check_expected(expected, &entity.current_fields())?;
    entity.apply_patch(patch)
}

/// Apply an edit and record its revision in one transaction.
///
/// The row stays locked from load to commit, so a concurrent editor either
/// sees the committed result or waits. Any error before commit drops the
/// transaction and leaves nothing behind.
pub async fn edit_entity<S, E>(
    store: &S,
    ctx: &UserContext,
    id: Id,
    request: EditRequest<E::Patch>,
) -> Result<EditOutcome<E>, WikiError>
where
    S: EditStore + ?Sized,
    E: TransactionalEntity,
{
    let editor_id = ensure_editor(ctx)?;
    ensure_positive_id("id", id)?;
    ensure_commit_message(&request.commit_message)?;

    let mut tx = store.begin().await?;

    let mut entity = E::lock(&mut tx, id)
        .await?
        .ok_or_else(|| WikiError::NotFound(format!("{} {}", E::KIND, id)))?;

    prepare_edit(&mut entity, &request.expected, request.patch)?;

    E::update(&mut tx, &entity).await?;
    let revision_id = tx
        .insert_revision(NewRevision {
            target_id: id,
            rev_type: E::EDIT_REVISION,
            creator_id: editor_id,
            commit_message: request.commit_message,
            content: entity.snapshot(),
        })
        .await?;
    tx.commit().await?;

    log::info!(
        "user {} edited {} {} (revision {})",
        editor_id,
        E::KIND,
        id,
        revision_id
    );

    Ok(EditOutcome { revision_id, entity })
}

pub async fn edit_person<S: EditStore + ?Sized>(
    store: &S,
    ctx: &UserContext,
    id: Id,
    request: EditRequest<MonoPatch>,
) -> Result<EditOutcome<Person>, WikiError> {
    edit_entity::<S, Person>(store, ctx, id, request).await
}

pub async fn edit_character<S: EditStore + ?Sized>(
    store: &S,
    ctx: &UserContext,
    id: Id,
    request: EditRequest<MonoPatch>,
) -> Result<EditOutcome<Character>, WikiError> {
    edit_entity::<S, Character>(store, ctx, id, request).await
}

pub async fn edit_subject<S: EditStore + ?Sized>(
    store: &S,
    ctx: &UserContext,
    id: Id,
    request: EditRequest<SubjectPatch>,
) -> Result<EditOutcome<Subject>, WikiError> {
    edit_entity::<S, Subject>(store, ctx, id, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::revision_detail::decode_revision;
    use crate::model::{MonoSnapshot, RevisionDetail, RevisionFamily, RevisionType};
    use crate::store::{EntityStore, MemoryStore, RevisionStore};

    fn person(id: Id) -> Person {
        Person {
            id,
            name: "Satoshi Kon".to_string(),
            infobox: "{{Infobox Crt}}".to_string(),
            summary: "".to_string(),
            locked: false,
            redirect: 0,
        }
    }

    fn rename(to: &str, expected: ExpectedFieldSet) -> EditRequest<MonoPatch> {
        EditRequest {
            commit_message: "rename".to_string(),
            expected,
            patch: MonoPatch {
                name: Some(to.to_string()),
                ..Default::default()
            },
        }
    }

    async fn revision_count(store: &MemoryStore, id: Id) -> i64 {
        store
            .count_revisions(id, &[RevisionType::PersonEdit])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_edit_persists_and_records_revision() {
        let store = MemoryStore::new();
        store.insert_person(person(1)).await;

        let outcome = edit_person(
            &store,
            &UserContext::editor(5),
            1,
            rename("今敏", ExpectedFieldSet::new().with("name", "Satoshi Kon")),
        )
        .await
        .unwrap();

        assert_eq!(outcome.entity.name, "今敏");
        assert_eq!(store.get_person(1).await.unwrap().unwrap().name, "今敏");

        let revision = store.get_revision(outcome.revision_id).await.unwrap().unwrap();
        assert_eq!(revision.creator_id, 5);
        assert_eq!(revision.rev_type, RevisionType::PersonEdit);

        let detail = decode_revision(&store, outcome.revision_id, RevisionFamily::Person)
            .await
            .unwrap();
        assert_eq!(
            detail,
            RevisionDetail::PersonEdit(MonoSnapshot {
                name: "今敏".to_string(),
                infobox: "{{Infobox Crt}}".to_string(),
                summary: "".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_stale_expectation_leaves_no_trace() {
        let store = MemoryStore::new();
        store.insert_person(person(1)).await;

        edit_person(&store, &UserContext::editor(5), 1, rename("B", ExpectedFieldSet::new()))
            .await
            .unwrap();

        // second editor still believes the old name is stored
        let err = edit_person(
            &store,
            &UserContext::editor(6),
            1,
            rename("C", ExpectedFieldSet::new().with("name", "Satoshi Kon")),
        )
        .await
        .unwrap_err();

        match err {
            WikiError::ConcurrentModification { diff } => {
                assert!(diff.contains("-Satoshi Kon\n"));
                assert!(diff.contains("+B\n"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.get_person(1).await.unwrap().unwrap().name, "B");
        assert_eq!(revision_count(&store, 1).await, 1);
    }

    #[tokio::test]
    async fn test_permission_and_lock_state() {
        let store = MemoryStore::new();
        store.insert_person(person(1)).await;
        store
            .insert_person(Person {
                locked: true,
                ..person(2)
            })
            .await;
        store
            .insert_person(Person {
                redirect: 1,
                ..person(3)
            })
            .await;

        let err = edit_person(&store, &UserContext::anonymous(), 1, rename("x", ExpectedFieldSet::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::NotAllowed(_)));

        let err = edit_person(&store, &UserContext::editor(5), 2, rename("x", ExpectedFieldSet::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::Locked(_)));

        let err = edit_person(&store, &UserContext::editor(5), 3, rename("x", ExpectedFieldSet::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::NotAllowed(_)));

        let err = edit_person(&store, &UserContext::editor(5), 4, rename("x", ExpectedFieldSet::new()))
            .await
            .unwrap_err();
        match err {
            WikiError::NotFound(what) => assert_eq!(what, "person 4"),
            other => panic!("unexpected error: {:?}", other),
        }

        for id in 1..=3 {
            assert_eq!(revision_count(&store, id).await, 0);
        }
    }

    #[tokio::test]
    async fn test_empty_commit_message_rejected() {
        let store = MemoryStore::new();
        store.insert_person(person(1)).await;
        let mut request = rename("x", ExpectedFieldSet::new());
        request.commit_message = "  ".to_string();

        let err = edit_person(&store, &UserContext::editor(5), 1, request)
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_concurrent_editors_are_serialized() {
        let store = MemoryStore::new();
        store.insert_person(person(1)).await;

        let expected = ExpectedFieldSet::new().with("name", "Satoshi Kon");
        let first = UserContext::editor(5);
        let second = UserContext::editor(6);
        let (a, b) = tokio::join!(
            edit_person(&store, &first, 1, rename("A", expected.clone())),
            edit_person(&store, &second, 1, rename("B", expected.clone())),
        );

        // exactly one editor wins; the other sees the winner's value
        assert!(a.is_ok() != b.is_ok());
        let loser = a.err().or(b.err()).unwrap();
        assert!(matches!(loser, WikiError::ConcurrentModification { .. }));
        assert_eq!(revision_count(&store, 1).await, 1);
    }

    #[tokio::test]
    async fn test_subject_edit() {
        let store = MemoryStore::new();
        store
            .insert_subject(Subject {
                id: 8,
                name: "Paprika".to_string(),
                infobox: String::new(),
                summary: String::new(),
                platform: 2,
                nsfw: false,
                locked: false,
                redirect: 0,
            })
            .await;

        let outcome = edit_subject(
            &store,
            &UserContext::editor(5),
            8,
            EditRequest {
                commit_message: "platform".to_string(),
                expected: ExpectedFieldSet::new().with("platform", "2"),
                patch: SubjectPatch {
                    platform: Some(3),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.entity.platform, 3);
        assert_eq!(store.get_subject(8).await.unwrap().unwrap().platform, 3);
    }
}
