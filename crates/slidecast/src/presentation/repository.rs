//! Presentation database repository.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use crate::db::{Database, StoreError, StoreResult};

use super::models::{
    CreatePresentationRequest, Presentation, PresentationListQuery, UpdatePresentationRequest,
};

/// Repository for presentation persistence.
#[derive(Debug, Clone)]
pub struct PresentationRepository {
    db: Database,
}

impl PresentationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// Create a new presentation.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreatePresentationRequest) -> StoreResult<Presentation> {
        let name = validate_name(&request.name)?;
        let owner = request.owner.unwrap_or_default();
        let now = chrono::Utc::now().to_rfc3339();

        let id = self
            .db
            .timed(async {
                let result = sqlx::query(
                    r#"
                    INSERT INTO presentations (name, owner, created_at, modified_at)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(name)
                .bind(&owner)
                .bind(&now)
                .bind(&now)
                .execute(self.pool())
                .await?;
                Ok::<_, StoreError>(result.last_insert_rowid())
            })
            .await?;

        debug!(presentation_id = id, "Created presentation");

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::Inconsistent(format!("presentation {id} missing after insert")))
    }

    /// Get a presentation by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Presentation>> {
        self.db
            .timed(async {
                let presentation = sqlx::query_as::<_, Presentation>(
                    r#"
                    SELECT id, name, owner, created_at, modified_at
                    FROM presentations
                    WHERE id = ?
                    "#,
                )
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
                Ok::<_, StoreError>(presentation)
            })
            .await
    }

    /// List presentations, optionally restricted to one owner.
    #[instrument(skip(self))]
    pub async fn list(&self, query: PresentationListQuery) -> StoreResult<Vec<Presentation>> {
        self.db
            .timed(async {
                let presentations = match query.owner {
                    Some(owner) => {
                        sqlx::query_as::<_, Presentation>(
                            r#"
                            SELECT id, name, owner, created_at, modified_at
                            FROM presentations
                            WHERE owner = ?
                            ORDER BY id
                            "#,
                        )
                        .bind(owner)
                        .fetch_all(self.pool())
                        .await?
                    }
                    None => {
                        sqlx::query_as::<_, Presentation>(
                            r#"
                            SELECT id, name, owner, created_at, modified_at
                            FROM presentations
                            ORDER BY id
                            "#,
                        )
                        .fetch_all(self.pool())
                        .await?
                    }
                };
                Ok::<_, StoreError>(presentations)
            })
            .await
    }

    /// Rename a presentation and bump its modification time.
    #[instrument(skip(self, request))]
    pub async fn rename(
        &self,
        id: i64,
        request: UpdatePresentationRequest,
    ) -> StoreResult<Presentation> {
        let name = validate_name(&request.name)?;
        let now = chrono::Utc::now().to_rfc3339();

        let affected = self
            .db
            .timed(async {
                let result =
                    sqlx::query("UPDATE presentations SET name = ?, modified_at = ? WHERE id = ?")
                        .bind(name)
                        .bind(&now)
                        .bind(id)
                        .execute(self.pool())
                        .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
            .await?;

        if affected == 0 {
            return Err(StoreError::no_rows(format!("presentation {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::no_rows(format!("presentation {id}")))
    }

    /// Delete a presentation and, through the schema's cascades, its slides.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let affected = self
            .db
            .timed(async {
                let result = sqlx::query("DELETE FROM presentations WHERE id = ?")
                    .bind(id)
                    .execute(self.pool())
                    .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
            .await?;

        if affected == 0 {
            return Err(StoreError::no_rows(format!("presentation {id}")));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid("presentation name must not be empty"));
    }
    if trimmed.chars().count() > 200 {
        return Err(StoreError::invalid(
            "presentation name must be at most 200 characters",
        ));
    }
    Ok(trimmed)
}
