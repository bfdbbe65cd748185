use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{
    migrate::MigrateDatabase, query, query_as, types::Json, FromRow, Pool, Sqlite, SqlitePool,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// A saved word together with the lookup result the user kept for it.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: i64,
    pub word: String,
    pub result: Json<Value>,
    pub tags: Json<Vec<String>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub word: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Kept when a client uploads its local list; otherwise now.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields left `None` are not touched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub word: Option<String>,
    pub result: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomTag {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Cloud copy of the user's saved vocabulary and custom tags.
///
/// Replacing a collection deletes every row and inserts the given items; it
/// makes no promises to concurrent writers.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Newest first.
    async fn list_entries(&self) -> Result<Vec<VocabularyEntry>, StoreError>;
    async fn list_tags(&self) -> Result<Vec<CustomTag>, StoreError>;
    async fn replace_entries(
        &self,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<VocabularyEntry>, StoreError>;
    async fn replace_tags(&self, tags: Vec<NewTag>) -> Result<Vec<CustomTag>, StoreError>;
    async fn insert_entry(&self, entry: NewEntry) -> Result<VocabularyEntry, StoreError>;
    async fn insert_tag(&self, tag: NewTag) -> Result<CustomTag, StoreError>;
    /// Returns true if a row was removed.
    async fn delete_entry(&self, id: i64) -> Result<bool, StoreError>;
    /// Returns true if a row was removed.
    async fn delete_tag(&self, id: i64) -> Result<bool, StoreError>;
    async fn update_entry(
        &self,
        id: i64,
        patch: EntryPatch,
    ) -> Result<Option<VocabularyEntry>, StoreError>;
}

const INSERT_ENTRY: &str = "INSERT INTO vocabulary(word, result, tags, notes, created_at) VALUES(?, ?, ?, ?, ?) RETURNING *";
const INSERT_TAG: &str = "INSERT INTO custom_tags(name, color, created_at) VALUES(?, ?, ?) RETURNING *";

pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }
        let pool = SqlitePool::connect(url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, StoreError> {
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl VocabularyStore for Storage {
    async fn list_entries(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        let entries =
            query_as("SELECT * FROM vocabulary ORDER BY julianday(created_at) DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(entries)
    }

    async fn list_tags(&self) -> Result<Vec<CustomTag>, StoreError> {
        let tags = query_as("SELECT * FROM custom_tags ORDER BY julianday(created_at), id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn replace_entries(
        &self,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<VocabularyEntry>, StoreError> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM vocabulary").execute(&mut *tx).await?;
        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let row: VocabularyEntry = query_as(INSERT_ENTRY)
                .bind(entry.word)
                .bind(Json(entry.result))
                .bind(Json(entry.tags))
                .bind(entry.notes)
                .bind(entry.created_at.unwrap_or_else(Utc::now))
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn replace_tags(&self, tags: Vec<NewTag>) -> Result<Vec<CustomTag>, StoreError> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM custom_tags").execute(&mut *tx).await?;
        let mut inserted = Vec::with_capacity(tags.len());
        for tag in tags {
            let row: CustomTag = query_as(INSERT_TAG)
                .bind(tag.name)
                .bind(tag.color)
                .bind(tag.created_at.unwrap_or_else(Utc::now))
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_entry(&self, entry: NewEntry) -> Result<VocabularyEntry, StoreError> {
        let row = query_as(INSERT_ENTRY)
            .bind(entry.word)
            .bind(Json(entry.result))
            .bind(Json(entry.tags))
            .bind(entry.notes)
            .bind(entry.created_at.unwrap_or_else(Utc::now))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_tag(&self, tag: NewTag) -> Result<CustomTag, StoreError> {
        let row = query_as(INSERT_TAG)
            .bind(tag.name)
            .bind(tag.color)
            .bind(tag.created_at.unwrap_or_else(Utc::now))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_entry(&self, id: i64) -> Result<bool, StoreError> {
        let result = query("DELETE FROM vocabulary WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_tag(&self, id: i64) -> Result<bool, StoreError> {
        let result = query("DELETE FROM custom_tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_entry(
        &self,
        id: i64,
        patch: EntryPatch,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        let row = query_as(
            "
            UPDATE vocabulary SET
                word = COALESCE(?, word),
                result = COALESCE(?, result),
                tags = COALESCE(?, tags),
                notes = COALESCE(?, notes)
            WHERE id = ?
            RETURNING *;
            ",
        )
        .bind(patch.word)
        .bind(patch.result.map(Json))
        .bind(patch.tags.map(Json))
        .bind(patch.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
