use itertools::Itertools;
use std::collections::HashMap;

use crate::error::WikiError;
use crate::model::{
    ensure_positive_id, CharacterCastRelation, CharacterSubjectRelation, Id, PersonCastRelation,
    PersonSubjectRelation, RevisionDetail, RevisionDetailResponse, RevisionFamily, SlimRef,
};
use crate::store::{NameStore, RevisionStore};

/// Load one revision of `family`, decode its stored content and resolve
/// referenced subjects, persons and characters to names.
///
/// A revision of another family is reported as not found.
pub async fn load_revision_detail<S>(
    store: &S,
    revision_id: Id,
    family: RevisionFamily,
) -> Result<RevisionDetailResponse, WikiError>
where
    S: RevisionStore + NameStore + ?Sized,
{
    let detail = decode_revision(store, revision_id, family).await?;
    enrich(store, detail).await
}

/// Revision content without name resolution
pub async fn decode_revision<S>(
    store: &S,
    revision_id: Id,
    family: RevisionFamily,
) -> Result<RevisionDetail, WikiError>
where
    S: RevisionStore + ?Sized,
{
    ensure_positive_id("revision id", revision_id)?;
    let not_found = || WikiError::NotFound(format!("revision {}", revision_id));

    let revision = store
        .get_revision(revision_id)
        .await?
        .filter(|r| family.contains(r.rev_type))
        .ok_or_else(not_found)?;

    let text = store
        .get_revision_text(revision.text_id)
        .await?
        .ok_or_else(|| WikiError::NotFound(format!("revision text {}", revision.text_id)))?;

    let raw = text.entry(revision.id)?.ok_or_else(not_found)?;
    RevisionDetail::decode(revision.rev_type, raw)
}

fn slim(names: &HashMap<Id, String>, id: Id) -> SlimRef {
    let name = names.get(&id).cloned().unwrap_or_else(|| {
        log::debug!("no name for referenced id {}", id);
        String::new()
    });
    SlimRef { id, name }
}

fn unique_ids(ids: impl Iterator<Item = Id>) -> Vec<Id> {
    ids.unique().collect()
}

async fn enrich<S>(store: &S, detail: RevisionDetail) -> Result<RevisionDetailResponse, WikiError>
where
    S: NameStore + ?Sized,
{
    let response = match detail {
        RevisionDetail::SubjectEdit(snapshot) => RevisionDetailResponse::Subject(snapshot),
        RevisionDetail::CharacterEdit(snapshot) | RevisionDetail::PersonEdit(snapshot) => {
            RevisionDetailResponse::Mono(snapshot)
        }
        RevisionDetail::Merge { redirect } => RevisionDetailResponse::Merge { redirect },
        RevisionDetail::Erase => RevisionDetailResponse::Erase {},
        RevisionDetail::CharacterSubjects(facts) => {
            let subjects = store
                .fetch_subject_names(&unique_ids(facts.iter().map(|f| f.subject_id)))
                .await?;
            RevisionDetailResponse::CharacterSubjects(
                facts
                    .into_iter()
                    .map(|f| CharacterSubjectRelation {
                        subject: slim(&subjects, f.subject_id),
                        relation_type: f.relation_type,
                    })
                    .collect(),
            )
        }
        RevisionDetail::CharacterCasts(facts) => {
            let subjects = store
                .fetch_subject_names(&unique_ids(facts.iter().map(|f| f.subject_id)))
                .await?;
            let persons = store
                .fetch_person_names(&unique_ids(facts.iter().map(|f| f.person_id)))
                .await?;
            RevisionDetailResponse::CharacterCasts(
                facts
                    .into_iter()
                    .map(|f| CharacterCastRelation {
                        subject: slim(&subjects, f.subject_id),
                        person: slim(&persons, f.person_id),
                    })
                    .collect(),
            )
        }
        RevisionDetail::PersonCasts(facts) => {
            let subjects = store
                .fetch_subject_names(&unique_ids(facts.iter().map(|f| f.subject_id)))
                .await?;
            let characters = store
                .fetch_character_names(&unique_ids(facts.iter().map(|f| f.character_id)))
                .await?;
            RevisionDetailResponse::PersonCasts(
                facts
                    .into_iter()
                    .map(|f| PersonCastRelation {
                        subject: slim(&subjects, f.subject_id),
                        character: slim(&characters, f.character_id),
                    })
                    .collect(),
            )
        }
        RevisionDetail::PersonSubjects(facts) => {
            let subjects = store
                .fetch_subject_names(&unique_ids(facts.iter().map(|f| f.subject_id)))
                .await?;
            RevisionDetailResponse::PersonSubjects(
                facts
                    .into_iter()
                    .map(|f| PersonSubjectRelation {
                        subject: slim(&subjects, f.subject_id),
                        position: f.position,
                    })
                    .collect(),
            )
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Character, Person, Revision, RevisionText, RevisionType, Subject};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_subject(Subject {
                id: 10,
                name: "Mononoke".to_string(),
                infobox: String::new(),
                summary: String::new(),
                platform: 3,
                nsfw: false,
                locked: false,
                redirect: 0,
            })
            .await;
        store
            .insert_person(Person {
                id: 20,
                name: "Yoji".to_string(),
                infobox: String::new(),
                summary: String::new(),
                locked: false,
                redirect: 0,
            })
            .await;
        store
            .insert_character(Character {
                id: 30,
                name: "San".to_string(),
                infobox: String::new(),
                summary: String::new(),
                locked: false,
                redirect: 0,
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_missing_revision_is_not_found() {
        let store = seeded_store().await;
        let err = load_revision_detail(&store, 500, RevisionFamily::PersonCasts)
            .await
            .unwrap_err();
        match err {
            WikiError::NotFound(what) => assert_eq!(what, "revision 500"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_revision_of_other_family_is_not_found() {
        let store = seeded_store().await;
        let id = store
            .record_revision(30, RevisionType::CharacterCastRelation, 1, 0, "cv", json!([]))
            .await
            .unwrap();
        let err = load_revision_detail(&store, id, RevisionFamily::PersonCasts)
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_character_cast_names_resolved_with_empty_fallback() {
        let store = seeded_store().await;
        let id = store
            .record_revision(
                30,
                RevisionType::CharacterCastRelation,
                1,
                0,
                "cv",
                json!([
                    {"character_id": 30, "subject_id": 10, "person_id": 20},
                    {"character_id": 30, "subject_id": 11, "person_id": 21}
                ]),
            )
            .await
            .unwrap();

        let detail = load_revision_detail(&store, id, RevisionFamily::CharacterCasts)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            json!([
                {"subject": {"id": 10, "name": "Mononoke"}, "person": {"id": 20, "name": "Yoji"}},
                {"subject": {"id": 11, "name": ""}, "person": {"id": 21, "name": ""}}
            ])
        );
    }

    #[tokio::test]
    async fn test_shared_blob_selects_requested_revision() {
        let store = seeded_store().await;
        let entries = BTreeMap::from([
            (41, json!([{"person_id": 20, "subject_id": 10, "position": 1}])),
            (42, json!([{"person_id": 20, "subject_id": 10, "position": 2}])),
        ]);
        store
            .insert_revision_text(RevisionText {
                id: 7,
                data: RevisionText::encode(&entries).unwrap(),
            })
            .await;
        for id in [41, 42] {
            store
                .insert_raw_revision(Revision {
                    id,
                    target_id: 20,
                    rev_type: RevisionType::PersonSubjectRelation,
                    creator_id: 1,
                    created_at: 0,
                    commit_message: "staff".to_string(),
                    text_id: 7,
                })
                .await;
        }

        let detail = load_revision_detail(&store, 42, RevisionFamily::PersonSubjects)
            .await
            .unwrap();
        assert_eq!(
            detail,
            RevisionDetailResponse::PersonSubjects(vec![PersonSubjectRelation {
                subject: SlimRef {
                    id: 10,
                    name: "Mononoke".to_string()
                },
                position: 2,
            }])
        );
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = seeded_store().await;
        store
            .insert_raw_revision(Revision {
                id: 9,
                target_id: 30,
                rev_type: RevisionType::CharacterSubjectRelation,
                creator_id: 1,
                created_at: 0,
                commit_message: String::new(),
                text_id: 404,
            })
            .await;
        let err = load_revision_detail(&store, 9, RevisionFamily::CharacterSubjects)
            .await
            .unwrap_err();
        match err {
            WikiError::NotFound(what) => assert_eq!(what, "revision text 404"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decoded_pairs_survive_reencoding() {
        let store = seeded_store().await;
        let raw = json!([
            {"subject_id": 10, "character_id": 30, "type": 1},
            {"subject_id": 12, "character_id": 30, "type": 2}
        ]);
        let id = store
            .record_revision(30, RevisionType::CharacterSubjectRelation, 1, 0, "", raw.clone())
            .await
            .unwrap();

        let detail = decode_revision(&store, id, RevisionFamily::CharacterSubjects)
            .await
            .unwrap();
        assert_eq!(detail.encode(), raw);
    }
}
