use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::WikiError;
use crate::model::{Id, MonoSnapshot, RevisionType, SubjectSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Person,
    Character,
    Subject,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Character => "character",
            EntityKind::Subject => "subject",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Id,
    pub name: String,
    pub infobox: String,
    pub summary: String,
    pub locked: bool,
    /// Non-zero when this person was merged into another one
    pub redirect: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: Id,
    pub name: String,
    pub infobox: String,
    pub summary: String,
    pub locked: bool,
    pub redirect: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Id,
    pub name: String,
    pub infobox: String,
    pub summary: String,
    pub platform: i16,
    pub nsfw: bool,
    pub locked: bool,
    pub redirect: Id,
}

/// Partial update of a person or character wiki page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonoPatch {
    pub name: Option<String>,
    pub infobox: Option<String>,
    pub summary: Option<String>,
}

/// Partial update of a subject wiki page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub infobox: Option<String>,
    pub summary: Option<String>,
    pub platform: Option<i16>,
    pub nsfw: Option<bool>,
}

/// Behaviour shared by every editable wiki row.
pub trait WikiEntity: Clone + Send + Sync {
    type Patch: Send;

    const KIND: EntityKind;
    const EDIT_REVISION: RevisionType;

    fn id(&self) -> Id;
    fn locked(&self) -> bool;
    fn redirect(&self) -> Id;

    /// Field name -> stored value, used to check client expectations.
    fn current_fields(&self) -> BTreeMap<String, String>;

    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), WikiError>;

    /// Revision content recorded after an edit
    fn snapshot(&self) -> serde_json::Value;
}

fn check_name(name: Option<&String>) -> Result<(), WikiError> {
    match name {
        Some(name) if name.trim().is_empty() => Err(WikiError::InvalidArgument(
            "name must not be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

fn mono_fields(name: &str, infobox: &str, summary: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("name".to_string(), name.to_string()),
        ("infobox".to_string(), infobox.to_string()),
        ("summary".to_string(), summary.to_string()),
    ])
}

macro_rules! impl_mono_entity {
    ($ty:ty, $kind:expr, $rev:expr) => {
        impl WikiEntity for $ty {
            type Patch = MonoPatch;

            const KIND: EntityKind = $kind;
            const EDIT_REVISION: RevisionType = $rev;

            fn id(&self) -> Id {
                self.id
            }

            fn locked(&self) -> bool {
                self.locked
            }

            fn redirect(&self) -> Id {
                self.redirect
            }

            fn current_fields(&self) -> BTreeMap<String, String> {
                mono_fields(&self.name, &self.infobox, &self.summary)
            }

            fn apply_patch(&mut self, patch: MonoPatch) -> Result<(), WikiError> {
                check_name(patch.name.as_ref())?;
                if let Some(name) = patch.name {
                    self.name = name;
                }
                if let Some(infobox) = patch.infobox {
                    self.infobox = infobox;
                }
                if let Some(summary) = patch.summary {
                    self.summary = summary;
                }
                Ok(())
            }

            fn snapshot(&self) -> serde_json::Value {
                MonoSnapshot {
                    name: self.name.clone(),
                    infobox: self.infobox.clone(),
                    summary: self.summary.clone(),
                }
                .to_value()
            }
        }
    };
}

impl_mono_entity!(Person, EntityKind::Person, RevisionType::PersonEdit);
impl_mono_entity!(Character, EntityKind::Character, RevisionType::CharacterEdit);

impl WikiEntity for Subject {
    type Patch = SubjectPatch;

    const KIND: EntityKind = EntityKind::Subject;
    const EDIT_REVISION: RevisionType = RevisionType::SubjectEdit;

    fn id(&self) -> Id {
        self.id
    }

    fn locked(&self) -> bool {
        self.locked
    }

    fn redirect(&self) -> Id {
        self.redirect
    }

    fn current_fields(&self) -> BTreeMap<String, String> {
        let mut fields = mono_fields(&self.name, &self.infobox, &self.summary);
        fields.insert("platform".to_string(), self.platform.to_string());
        fields.insert("nsfw".to_string(), self.nsfw.to_string());
        fields
    }

    fn apply_patch(&mut self, patch: SubjectPatch) -> Result<(), WikiError> {
        check_name(patch.name.as_ref())?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(infobox) = patch.infobox {
            self.infobox = infobox;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
        if let Some(nsfw) = patch.nsfw {
            self.nsfw = nsfw;
        }
        Ok(())
    }

    fn snapshot(&self) -> serde_json::Value {
        SubjectSnapshot {
            name: self.name.clone(),
            infobox: self.infobox.clone(),
            summary: self.summary.clone(),
            platform: self.platform,
            nsfw: self.nsfw,
        }
        .to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Person {
        Person {
            id: 1,
            name: "Hayao".to_string(),
            infobox: "{{Infobox}}".to_string(),
            summary: "".to_string(),
            locked: false,
            redirect: 0,
        }
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut p = person();
        p.apply_patch(MonoPatch {
            summary: Some("director".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(p.name, "Hayao");
        assert_eq!(p.summary, "director");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut p = person();
        let err = p
            .apply_patch(MonoPatch {
                name: Some("  ".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, WikiError::InvalidArgument(_)));
        assert_eq!(p.name, "Hayao");
    }

    #[test]
    fn test_subject_fields_and_snapshot() {
        let subject = Subject {
            id: 3,
            name: "Nausicaa".to_string(),
            infobox: "".to_string(),
            summary: "".to_string(),
            platform: 1,
            nsfw: false,
            locked: false,
            redirect: 0,
        };
        let fields = subject.current_fields();
        assert_eq!(fields["platform"], "1");
        assert_eq!(fields["nsfw"], "false");
        assert_eq!(
            subject.snapshot(),
            json!({"name": "Nausicaa", "infobox": "", "summary": "", "platform": 1, "nsfw": false})
        );
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result = serde_json::from_value::<MonoPatch>(json!({"nmae": "typo"}));
        assert!(result.is_err());
    }
}
