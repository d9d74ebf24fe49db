use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    Character, Id, NewRevision, Person, Revision, RevisionText, RevisionType, Subject, User,
};
use crate::store::traits::{
    EditStore, EditTransaction, EntityStore, NameStore, RevisionStore, Store,
};

const PERSON_COLUMNS: &str = "id, name, infobox, summary, locked, redirect";
const CHARACTER_COLUMNS: &str = "id, name, infobox, summary, locked, redirect";
const SUBJECT_COLUMNS: &str = "id, name, infobox, summary, platform, nsfw, locked, redirect";
const REVISION_COLUMNS: &str = "id, target_id, rev_type, creator_id, created_at, commit_message, text_id";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_names(&self, table: &str, ids: &[Id]) -> Result<HashMap<Id, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(&format!("SELECT id, name FROM {} WHERE id = ANY($1)", table))
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch names from {}", table))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("id"), row.get("name")))
            .collect())
    }
}

fn person_from_row(row: &PgRow) -> Person {
    Person {
        id: row.get("id"),
        name: row.get("name"),
        infobox: row.get("infobox"),
        summary: row.get("summary"),
        locked: row.get("locked"),
        redirect: row.get("redirect"),
    }
}

fn character_from_row(row: &PgRow) -> Character {
    Character {
        id: row.get("id"),
        name: row.get("name"),
        infobox: row.get("infobox"),
        summary: row.get("summary"),
        locked: row.get("locked"),
        redirect: row.get("redirect"),
    }
}

fn subject_from_row(row: &PgRow) -> Subject {
    Subject {
        id: row.get("id"),
        name: row.get("name"),
        infobox: row.get("infobox"),
        summary: row.get("summary"),
        platform: row.get("platform"),
        nsfw: row.get("nsfw"),
        locked: row.get("locked"),
        redirect: row.get("redirect"),
    }
}

fn revision_from_row(row: &PgRow) -> Result<Revision> {
    let rev_type: i16 = row.get("rev_type");
    Ok(Revision {
        id: row.get("id"),
        target_id: row.get("target_id"),
        rev_type: RevisionType::try_from(rev_type)?,
        creator_id: row.get("creator_id"),
        created_at: row.get("created_at"),
        commit_message: row.get("commit_message"),
        text_id: row.get("text_id"),
    })
}

fn type_codes(types: &[RevisionType]) -> Vec<i16> {
    types.iter().map(|t| t.as_i16()).collect()
}

#[async_trait::async_trait]
impl EntityStore for PostgresStore {
    async fn get_person(&self, id: Id) -> Result<Option<Person>> {
        let row = sqlx::query(&format!("SELECT {} FROM persons WHERE id = $1", PERSON_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person")?;

        Ok(row.as_ref().map(person_from_row))
    }

    async fn get_character(&self, id: Id) -> Result<Option<Character>> {
        let row = sqlx::query(&format!("SELECT {} FROM characters WHERE id = $1", CHARACTER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch character")?;

        Ok(row.as_ref().map(character_from_row))
    }

    async fn get_subject(&self, id: Id) -> Result<Option<Subject>> {
        let row = sqlx::query(&format!("SELECT {} FROM subjects WHERE id = $1", SUBJECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch subject")?;

        Ok(row.as_ref().map(subject_from_row))
    }
}

#[async_trait::async_trait]
impl RevisionStore for PostgresStore {
    async fn count_revisions(&self, target_id: Id, types: &[RevisionType]) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT id) FROM revisions WHERE target_id = $1 AND rev_type = ANY($2)",
        )
        .bind(target_id)
        .bind(type_codes(types))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count revisions")?;

        Ok(count)
    }

    async fn list_revisions(
        &self,
        target_id: Id,
        types: &[RevisionType],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Revision>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM revisions
            WHERE target_id = $1 AND rev_type = ANY($2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
            REVISION_COLUMNS
        ))
        .bind(target_id)
        .bind(type_codes(types))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list revisions")?;

        rows.iter().map(revision_from_row).collect()
    }

    async fn get_revision(&self, id: Id) -> Result<Option<Revision>> {
        let row = sqlx::query(&format!("SELECT {} FROM revisions WHERE id = $1", REVISION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch revision")?;

        row.as_ref().map(revision_from_row).transpose()
    }

    async fn get_revision_text(&self, text_id: Id) -> Result<Option<RevisionText>> {
        let row = sqlx::query("SELECT id, data FROM revision_texts WHERE id = $1")
            .bind(text_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch revision text")?;

        Ok(row.map(|row| RevisionText {
            id: row.get("id"),
            data: row.get("data"),
        }))
    }
}

#[async_trait::async_trait]
impl NameStore for PostgresStore {
    async fn fetch_users(&self, ids: &[Id]) -> Result<HashMap<Id, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT id, username, nickname FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch users")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = User {
                    id: row.get("id"),
                    username: row.get("username"),
                    nickname: row.get("nickname"),
                };
                (user.id, user)
            })
            .collect())
    }

    async fn fetch_subject_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        self.fetch_names("subjects", ids).await
    }

    async fn fetch_person_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        self.fetch_names("persons", ids).await
    }

    async fn fetch_character_names(&self, ids: &[Id]) -> Result<HashMap<Id, String>> {
        self.fetch_names("characters", ids).await
    }
}

/// Edit transaction backed by a PostgreSQL transaction; rolled back on drop.
pub struct PgEditTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl EditTransaction for PgEditTransaction {
    async fn lock_person(&mut self, id: Id) -> Result<Option<Person>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM persons WHERE id = $1 FOR UPDATE",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to lock person")?;

        Ok(row.as_ref().map(person_from_row))
    }

    async fn update_person(&mut self, person: &Person) -> Result<()> {
        sqlx::query("UPDATE persons SET name = $2, infobox = $3, summary = $4 WHERE id = $1")
            .bind(person.id)
            .bind(&person.name)
            .bind(&person.infobox)
            .bind(&person.summary)
            .execute(&mut *self.tx)
            .await
            .context("Failed to update person")?;
        Ok(())
    }

    async fn lock_character(&mut self, id: Id) -> Result<Option<Character>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM characters WHERE id = $1 FOR UPDATE",
            CHARACTER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to lock character")?;

        Ok(row.as_ref().map(character_from_row))
    }

    async fn update_character(&mut self, character: &Character) -> Result<()> {
        sqlx::query("UPDATE characters SET name = $2, infobox = $3, summary = $4 WHERE id = $1")
            .bind(character.id)
            .bind(&character.name)
            .bind(&character.infobox)
            .bind(&character.summary)
            .execute(&mut *self.tx)
            .await
            .context("Failed to update character")?;
        Ok(())
    }

    async fn lock_subject(&mut self, id: Id) -> Result<Option<Subject>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subjects WHERE id = $1 FOR UPDATE",
            SUBJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to lock subject")?;

        Ok(row.as_ref().map(subject_from_row))
    }

    async fn update_subject(&mut self, subject: &Subject) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE subjects
            SET name = $2, infobox = $3, summary = $4, platform = $5, nsfw = $6
            WHERE id = $1
            "#,
        )
        .bind(subject.id)
        .bind(&subject.name)
        .bind(&subject.infobox)
        .bind(&subject.summary)
        .bind(subject.platform)
        .bind(subject.nsfw)
        .execute(&mut *self.tx)
        .await
        .context("Failed to update subject")?;
        Ok(())
    }

    async fn insert_revision(&mut self, revision: NewRevision) -> Result<Id> {
        // The blob is keyed by revision id, so the id is reserved up front.
        let revision_id = sqlx::query_scalar::<_, i64>(
            "SELECT nextval(pg_get_serial_sequence('revisions', 'id'))",
        )
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to allocate revision id")?;

        let data = RevisionText::encode(&BTreeMap::from([(revision_id, revision.content)]))
            .context("Failed to encode revision text")?;

        let text_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO revision_texts (data) VALUES ($1) RETURNING id",
        )
        .bind(data)
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to insert revision text")?;

        sqlx::query(
            r#"
            INSERT INTO revisions (id, target_id, rev_type, creator_id, created_at, commit_message, text_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(revision_id)
        .bind(revision.target_id)
        .bind(revision.rev_type.as_i16())
        .bind(revision.creator_id)
        .bind(chrono::Utc::now().timestamp())
        .bind(&revision.commit_message)
        .bind(text_id)
        .execute(&mut *self.tx)
        .await
        .context("Failed to insert revision")?;

        Ok(revision_id)
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit edit transaction")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EditStore for PostgresStore {
    type Tx = PgEditTransaction;

    async fn begin(&self) -> Result<PgEditTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin edit transaction")?;
        Ok(PgEditTransaction { tx })
    }
}

impl Store for PostgresStore {}
