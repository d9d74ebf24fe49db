use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::WikiError;
use crate::model::{Id, RevisionType, SlimRef};

/// Person or character wiki fields as recorded by an edit revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonoSnapshot {
    pub name: String,
    pub infobox: String,
    #[serde(default)]
    pub summary: String,
}

impl MonoSnapshot {
    pub fn to_value(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "infobox": self.infobox,
            "summary": self.summary,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    pub name: String,
    pub infobox: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub platform: i16,
    #[serde(default)]
    pub nsfw: bool,
}

impl SubjectSnapshot {
    pub fn to_value(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "infobox": self.infobox,
            "summary": self.summary,
            "platform": self.platform,
            "nsfw": self.nsfw,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSubjectFact {
    pub subject_id: Id,
    pub character_id: Id,
    #[serde(rename = "type")]
    pub relation_type: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCastFact {
    pub character_id: Id,
    pub subject_id: Id,
    pub person_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonCastFact {
    pub person_id: Id,
    pub subject_id: Id,
    pub character_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSubjectFact {
    pub person_id: Id,
    pub subject_id: Id,
    pub position: i16,
}

/// Decoded content of a single revision, one variant per revision type family.
#[derive(Debug, Clone, PartialEq)]
pub enum RevisionDetail {
    SubjectEdit(SubjectSnapshot),
    CharacterEdit(MonoSnapshot),
    PersonEdit(MonoSnapshot),
    Merge { redirect: Id },
    Erase,
    CharacterSubjects(Vec<CharacterSubjectFact>),
    CharacterCasts(Vec<CharacterCastFact>),
    PersonCasts(Vec<PersonCastFact>),
    PersonSubjects(Vec<PersonSubjectFact>),
}

#[derive(Deserialize)]
struct MergeContent {
    redirect: Id,
}

fn decode_as<T: DeserializeOwned>(rev_type: RevisionType, raw: serde_json::Value) -> Result<T, WikiError> {
    serde_json::from_value(raw)
        .with_context(|| format!("malformed content for revision type {}", rev_type))
        .map_err(WikiError::from)
}

impl RevisionDetail {
    /// Pick the decoder for `rev_type` and apply it to the raw stored entry.
    pub fn decode(rev_type: RevisionType, raw: serde_json::Value) -> Result<Self, WikiError> {
        let detail = match rev_type {
            RevisionType::SubjectEdit => RevisionDetail::SubjectEdit(decode_as(rev_type, raw)?),
            RevisionType::CharacterEdit => RevisionDetail::CharacterEdit(decode_as(rev_type, raw)?),
            RevisionType::PersonEdit => RevisionDetail::PersonEdit(decode_as(rev_type, raw)?),
            RevisionType::SubjectMerge | RevisionType::CharacterMerge | RevisionType::PersonMerge => {
                let content: MergeContent = decode_as(rev_type, raw)?;
                RevisionDetail::Merge {
                    redirect: content.redirect,
                }
            }
            RevisionType::CharacterErase | RevisionType::PersonErase => RevisionDetail::Erase,
            RevisionType::CharacterSubjectRelation => {
                RevisionDetail::CharacterSubjects(decode_as(rev_type, raw)?)
            }
            RevisionType::CharacterCastRelation => {
                RevisionDetail::CharacterCasts(decode_as(rev_type, raw)?)
            }
            RevisionType::PersonCastRelation => RevisionDetail::PersonCasts(decode_as(rev_type, raw)?),
            RevisionType::PersonSubjectRelation => {
                RevisionDetail::PersonSubjects(decode_as(rev_type, raw)?)
            }
        };
        Ok(detail)
    }

    /// Inverse of [`RevisionDetail::decode`]: the stored JSON shape.
    pub fn encode(&self) -> serde_json::Value {
        match self {
            RevisionDetail::SubjectEdit(snapshot) => snapshot.to_value(),
            RevisionDetail::CharacterEdit(snapshot) | RevisionDetail::PersonEdit(snapshot) => {
                snapshot.to_value()
            }
            RevisionDetail::Merge { redirect } => json!({ "redirect": redirect }),
            RevisionDetail::Erase => json!({}),
            RevisionDetail::CharacterSubjects(facts) => facts
                .iter()
                .map(|f| json!({"subject_id": f.subject_id, "character_id": f.character_id, "type": f.relation_type}))
                .collect(),
            RevisionDetail::CharacterCasts(facts) => facts
                .iter()
                .map(|f| json!({"character_id": f.character_id, "subject_id": f.subject_id, "person_id": f.person_id}))
                .collect(),
            RevisionDetail::PersonCasts(facts) => facts
                .iter()
                .map(|f| json!({"person_id": f.person_id, "subject_id": f.subject_id, "character_id": f.character_id}))
                .collect(),
            RevisionDetail::PersonSubjects(facts) => facts
                .iter()
                .map(|f| json!({"person_id": f.person_id, "subject_id": f.subject_id, "position": f.position}))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSubjectRelation {
    pub subject: SlimRef,
    #[serde(rename = "type")]
    pub relation_type: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterCastRelation {
    pub subject: SlimRef,
    pub person: SlimRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonCastRelation {
    pub subject: SlimRef,
    pub character: SlimRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSubjectRelation {
    pub subject: SlimRef,
    pub position: i16,
}

/// Revision content with cross-references resolved to names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RevisionDetailResponse {
    Subject(SubjectSnapshot),
    Mono(MonoSnapshot),
    Merge { redirect: Id },
    Erase {},
    CharacterSubjects(Vec<CharacterSubjectRelation>),
    CharacterCasts(Vec<CharacterCastRelation>),
    PersonCasts(Vec<PersonCastRelation>),
    PersonSubjects(Vec<PersonSubjectRelation>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_decode_dispatches_on_revision_type() {
        let raw = json!([{"subject_id": 12, "character_id": 3, "type": 1}]);
        let detail = RevisionDetail::decode(RevisionType::CharacterSubjectRelation, raw).unwrap();
        assert_eq!(
            detail,
            RevisionDetail::CharacterSubjects(vec![CharacterSubjectFact {
                subject_id: 12,
                character_id: 3,
                relation_type: 1,
            }])
        );

        let merge = RevisionDetail::decode(RevisionType::PersonMerge, json!({"redirect": 9})).unwrap();
        assert_eq!(merge, RevisionDetail::Merge { redirect: 9 });

        let erase = RevisionDetail::decode(RevisionType::CharacterErase, json!(null)).unwrap();
        assert_eq!(erase, RevisionDetail::Erase);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = RevisionDetail::decode(RevisionType::PersonCastRelation, json!({"name": "x"}))
            .unwrap_err();
        assert!(matches!(err, WikiError::Internal(_)));
    }

    #[test]
    fn test_reencode_preserves_relation_pairs() {
        let raw = json!([
            {"person_id": 1, "subject_id": 10, "character_id": 100},
            {"person_id": 1, "subject_id": 11, "character_id": 101},
            {"person_id": 1, "subject_id": 11, "character_id": 102}
        ]);
        let pairs = |value: &serde_json::Value| -> BTreeSet<(i64, i64)> {
            value
                .as_array()
                .unwrap()
                .iter()
                .map(|f| (f["subject_id"].as_i64().unwrap(), f["character_id"].as_i64().unwrap()))
                .collect()
        };

        let detail = RevisionDetail::decode(RevisionType::PersonCastRelation, raw.clone()).unwrap();
        let reencoded = detail.encode();
        assert_eq!(pairs(&raw), pairs(&reencoded));
        assert_eq!(
            RevisionDetail::decode(RevisionType::PersonCastRelation, reencoded).unwrap(),
            detail
        );
    }

    #[test]
    fn test_snapshot_summary_defaults_to_empty() {
        let detail =
            RevisionDetail::decode(RevisionType::PersonEdit, json!({"name": "a", "infobox": "b"})).unwrap();
        assert_eq!(
            detail,
            RevisionDetail::PersonEdit(MonoSnapshot {
                name: "a".to_string(),
                infobox: "b".to_string(),
                summary: String::new(),
            })
        );
    }
}
