//! Vote counting.

use sqlx::SqlitePool;
use tracing::instrument;

use crate::db::{Database, StoreError, StoreResult};

use super::models::{OptionTally, Tally};

/// Atomic vote increments and tally reads.
#[derive(Debug, Clone)]
pub struct VoteStore {
    db: Database,
}

impl VoteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// Add one vote to `option_id` under `content_id`.
    ///
    /// The increment happens inside a single `UPDATE`, so concurrent votes
    /// never lose writes. Returns the number of rows touched; zero means the
    /// option does not exist under that content.
    #[instrument(skip(self))]
    pub async fn submit_vote(&self, content_id: i64, option_id: i64) -> StoreResult<u64> {
        self.db
            .timed(async {
                let result = sqlx::query(
                    "UPDATE options SET total_votes = total_votes + 1 WHERE id = ? AND content_id = ?",
                )
                .bind(option_id)
                .bind(content_id)
                .execute(self.pool())
                .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
            .await
    }

    /// Presentation that owns a content row, if the content exists.
    #[instrument(skip(self))]
    pub async fn content_presentation(&self, content_id: i64) -> StoreResult<Option<i64>> {
        self.db
            .timed(async {
                let row: Option<(i64,)> = sqlx::query_as(
                    r#"
                    SELECT s.pres_id
                    FROM contents c
                    JOIN slides s ON s.id = c.slide_id
                    WHERE c.id = ?
                    "#,
                )
                .bind(content_id)
                .fetch_optional(self.pool())
                .await?;
                Ok::<_, StoreError>(row.map(|(id,)| id))
            })
            .await
    }

    /// Current counts for every option under a content, in option id order.
    #[instrument(skip(self))]
    pub async fn tally(&self, presentation_id: i64, content_id: i64) -> StoreResult<Tally> {
        let options = self
            .db
            .timed(async {
                let options: Vec<OptionTally> = sqlx::query_as(
                    "SELECT id, name, total_votes FROM options WHERE content_id = ? ORDER BY id",
                )
                .bind(content_id)
                .fetch_all(self.pool())
                .await?;
                Ok::<_, StoreError>(options)
            })
            .await?;

        Ok(Tally {
            presentation_id,
            content_id,
            options,
        })
    }
}
