use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::WikiError;
use crate::model::Id;

/// What kind of edit a revision recorded. Stored as `smallint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RevisionType {
    SubjectEdit,
    CharacterEdit,
    PersonEdit,
    CharacterSubjectRelation,
    CharacterCastRelation,
    PersonCastRelation,
    PersonSubjectRelation,
    SubjectMerge,
    CharacterMerge,
    PersonMerge,
    CharacterErase,
    PersonErase,
}

impl RevisionType {
    pub const ALL: [RevisionType; 12] = [
        RevisionType::SubjectEdit,
        RevisionType::CharacterEdit,
        RevisionType::PersonEdit,
        RevisionType::CharacterSubjectRelation,
        RevisionType::CharacterCastRelation,
        RevisionType::PersonCastRelation,
        RevisionType::PersonSubjectRelation,
        RevisionType::SubjectMerge,
        RevisionType::CharacterMerge,
        RevisionType::PersonMerge,
        RevisionType::CharacterErase,
        RevisionType::PersonErase,
    ];

    pub fn as_i16(self) -> i16 {
        match self {
            RevisionType::SubjectEdit => 1,
            RevisionType::CharacterEdit => 2,
            RevisionType::PersonEdit => 3,
            RevisionType::CharacterSubjectRelation => 4,
            RevisionType::CharacterCastRelation => 5,
            RevisionType::PersonCastRelation => 6,
            RevisionType::PersonSubjectRelation => 10,
            RevisionType::SubjectMerge => 11,
            RevisionType::CharacterMerge => 12,
            RevisionType::PersonMerge => 13,
            RevisionType::CharacterErase => 14,
            RevisionType::PersonErase => 15,
        }
    }

    pub fn family(self) -> RevisionFamily {
        match self {
            RevisionType::SubjectEdit | RevisionType::SubjectMerge => RevisionFamily::Subject,
            RevisionType::CharacterEdit
            | RevisionType::CharacterMerge
            | RevisionType::CharacterErase => RevisionFamily::Character,
            RevisionType::PersonEdit | RevisionType::PersonMerge | RevisionType::PersonErase => {
                RevisionFamily::Person
            }
            RevisionType::CharacterSubjectRelation => RevisionFamily::CharacterSubjects,
            RevisionType::CharacterCastRelation => RevisionFamily::CharacterCasts,
            RevisionType::PersonCastRelation => RevisionFamily::PersonCasts,
            RevisionType::PersonSubjectRelation => RevisionFamily::PersonSubjects,
        }
    }
}

impl TryFrom<i16> for RevisionType {
    type Error = WikiError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        RevisionType::ALL
            .into_iter()
            .find(|t| t.as_i16() == value)
            .ok_or_else(|| WikiError::InvalidArgument(format!("unknown revision type {}", value)))
    }
}

impl fmt::Display for RevisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_i16())
    }
}

/// Group of revision types that all describe edits to the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionFamily {
    Subject,
    Character,
    Person,
    CharacterSubjects,
    CharacterCasts,
    PersonCasts,
    PersonSubjects,
}

impl RevisionFamily {
    pub fn tags(self) -> &'static [RevisionType] {
        match self {
            RevisionFamily::Subject => &[RevisionType::SubjectEdit, RevisionType::SubjectMerge],
            RevisionFamily::Character => &[
                RevisionType::CharacterEdit,
                RevisionType::CharacterMerge,
                RevisionType::CharacterErase,
            ],
            RevisionFamily::Person => &[
                RevisionType::PersonEdit,
                RevisionType::PersonMerge,
                RevisionType::PersonErase,
            ],
            RevisionFamily::CharacterSubjects => &[RevisionType::CharacterSubjectRelation],
            RevisionFamily::CharacterCasts => &[RevisionType::CharacterCastRelation],
            RevisionFamily::PersonCasts => &[RevisionType::PersonCastRelation],
            RevisionFamily::PersonSubjects => &[RevisionType::PersonSubjectRelation],
        }
    }

    pub fn contains(self, rev_type: RevisionType) -> bool {
        rev_type.family() == self
    }
}

/// A row of the append-only revision log
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub id: Id,
    pub target_id: Id,
    pub rev_type: RevisionType,
    pub creator_id: Id,
    /// Unix seconds
    pub created_at: i64,
    pub commit_message: String,
    /// Blob holding the revision content, see [`RevisionText`]
    pub text_id: Id,
}

/// Revision to be recorded alongside an applied mutation
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    pub target_id: Id,
    pub rev_type: RevisionType,
    pub creator_id: Id,
    pub commit_message: String,
    pub content: serde_json::Value,
}

/// Summary of one edit, as listed by the history endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionHistoryEntry {
    pub id: Id,
    pub creator: Creator,
    pub created_at: i64,
    pub commit_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub username: String,
}

/// Stored revision content. Several revisions may share one blob, so the
/// payload is a JSON object keyed by revision id, gzip-compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionText {
    pub id: Id,
    pub data: Vec<u8>,
}

impl RevisionText {
    /// Serialize and compress a revision-id keyed mapping of contents
    pub fn encode(entries: &BTreeMap<Id, serde_json::Value>) -> anyhow::Result<Vec<u8>> {
        let serialized = serde_json::to_vec(entries)?;
        Self::compress_data(&serialized)
    }

    /// Decompress and deserialize the whole blob
    pub fn decode(&self) -> anyhow::Result<BTreeMap<Id, serde_json::Value>> {
        let decompressed = Self::decompress_data(&self.data)?;
        let entries = serde_json::from_slice(&decompressed)?;
        Ok(entries)
    }

    /// Content recorded for `revision_id`, if this blob has it
    pub fn entry(&self, revision_id: Id) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.decode()?.remove(&revision_id))
    }

    fn compress_data(data: &[u8]) -> anyhow::Result<Vec<u8>> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn decompress_data(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        use flate2::read::GzDecoder;
        use std::io::Read;

        // gzip magic bytes (1f 8b); anything else is a legacy plain-JSON blob
        if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok(decompressed)
        } else {
            Ok(data.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_revision_type_roundtrip_through_smallint() {
        for rev_type in RevisionType::ALL {
            assert_eq!(RevisionType::try_from(rev_type.as_i16()).unwrap(), rev_type);
        }
        assert!(matches!(
            RevisionType::try_from(99),
            Err(WikiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_every_type_belongs_to_its_family() {
        for rev_type in RevisionType::ALL {
            let family = rev_type.family();
            assert!(family.tags().contains(&rev_type), "{} missing from {:?}", rev_type, family);
        }
        assert!(!RevisionFamily::PersonCasts.contains(RevisionType::CharacterCastRelation));
    }

    #[test]
    fn test_history_entry_json_shape() {
        let entry = RevisionHistoryEntry {
            id: 7,
            creator: Creator {
                username: "sai".to_string(),
            },
            created_at: 1_700_000_000,
            commit_message: "fix infobox".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "id": 7,
                "creator": {"username": "sai"},
                "createdAt": 1_700_000_000,
                "commitMessage": "fix infobox"
            })
        );
    }

    #[test]
    fn test_revision_text_selects_entry() {
        let mut entries = BTreeMap::new();
        entries.insert(10, json!({"name": "first"}));
        entries.insert(11, json!({"name": "second"}));

        let text = RevisionText {
            id: 1,
            data: RevisionText::encode(&entries).unwrap(),
        };
        assert_eq!(&text.data[..2], &[0x1f, 0x8b]);
        assert_eq!(text.entry(11).unwrap(), Some(json!({"name": "second"})));
        assert_eq!(text.entry(12).unwrap(), None);
    }

    #[test]
    fn test_revision_text_accepts_uncompressed_blob() {
        let text = RevisionText {
            id: 2,
            data: br#"{"5": {"name": "plain"}}"#.to_vec(),
        };
        assert_eq!(text.entry(5).unwrap(), Some(json!({"name": "plain"})));
    }
}
