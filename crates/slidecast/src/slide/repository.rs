//! Slide, content and sub-content persistence.

use std::collections::HashMap;

use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, instrument};

use crate::db::{Database, StoreError, StoreResult};

use super::models::{
    Content, ContentBody, DraftBody, Heading, Paragraph, PollOption, Slide, SlideDraft, SlideKind,
};

/// Repository for slides and their typed content.
///
/// Every multi-row write runs inside one transaction, so a failure part way
/// through a create or update leaves no orphaned content rows behind.
#[derive(Debug, Clone)]
pub struct SlideRepository {
    db: Database,
}

#[derive(Debug, FromRow)]
struct SlideRow {
    slide_id: i64,
    slide_type: i64,
    content_id: i64,
    title: String,
    meta: String,
}

impl SlideRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// All slides of a presentation in id order, with content fully populated.
    #[instrument(skip(self))]
    pub async fn find_all_slides(&self, presentation_id: i64) -> StoreResult<Vec<Slide>> {
        self.db
            .timed(async {
                let mut tx = self.pool().begin().await?;
                let slides = load_slides(&mut tx, presentation_id, None).await?;
                tx.commit().await?;
                Ok::<_, StoreError>(slides)
            })
            .await
    }

    /// A single slide of a presentation.
    #[instrument(skip(self))]
    pub async fn get_slide(&self, presentation_id: i64, slide_id: i64) -> StoreResult<Option<Slide>> {
        self.db
            .timed(async {
                let mut tx = self.pool().begin().await?;
                let slides = load_slides(&mut tx, presentation_id, Some(slide_id)).await?;
                tx.commit().await?;
                Ok::<_, StoreError>(slides.into_iter().next())
            })
            .await
    }

    /// Persist a slide, its content row and the sub-content its kind calls for.
    ///
    /// Poll options always start at zero votes.
    #[instrument(skip(self, draft), fields(kind = %draft.kind()))]
    pub async fn create_slide(&self, presentation_id: i64, draft: SlideDraft) -> StoreResult<Slide> {
        let slide = self
            .db
            .timed(async {
                let mut tx = self.pool().begin().await?;

                let presentation: Option<(i64,)> =
                    sqlx::query_as("SELECT id FROM presentations WHERE id = ?")
                        .bind(presentation_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                if presentation.is_none() {
                    return Err(StoreError::not_found(format!(
                        "presentation {presentation_id}"
                    )));
                }

                let slide_id = sqlx::query("INSERT INTO slides (pres_id, slide_type) VALUES (?, ?)")
                    .bind(presentation_id)
                    .bind(draft.kind().code())
                    .execute(&mut *tx)
                    .await?
                    .last_insert_rowid();

                let content_id =
                    sqlx::query("INSERT INTO contents (slide_id, title, meta) VALUES (?, ?, ?)")
                        .bind(slide_id)
                        .bind(&draft.title)
                        .bind(&draft.meta)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid();

                let body = match draft.body {
                    DraftBody::Poll(inputs) => {
                        let mut options = Vec::with_capacity(inputs.len());
                        for input in inputs {
                            let name = input.name.trim().to_string();
                            let id = sqlx::query(
                                "INSERT INTO options (name, image, content_id, total_votes) VALUES (?, ?, ?, 0)",
                            )
                            .bind(&name)
                            .bind(&input.image)
                            .bind(content_id)
                            .execute(&mut *tx)
                            .await?
                            .last_insert_rowid();
                            options.push(PollOption {
                                id,
                                content_id,
                                name,
                                image: input.image,
                                total_votes: 0,
                            });
                        }
                        ContentBody::Poll(options)
                    }
                    DraftBody::Heading(input) => {
                        let id = sqlx::query(
                            "INSERT INTO headings (heading, sub_heading, image, content_id) VALUES (?, ?, ?, ?)",
                        )
                        .bind(&input.heading)
                        .bind(&input.sub_heading)
                        .bind(&input.image)
                        .bind(content_id)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid();
                        ContentBody::Heading(Heading {
                            id,
                            content_id,
                            heading: input.heading,
                            sub_heading: input.sub_heading,
                            image: input.image,
                        })
                    }
                    DraftBody::Paragraph(input) => {
                        let id = sqlx::query(
                            "INSERT INTO paragraphs (heading, text, image, content_id) VALUES (?, ?, ?, ?)",
                        )
                        .bind(&input.heading)
                        .bind(&input.text)
                        .bind(&input.image)
                        .bind(content_id)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid();
                        ContentBody::Paragraph(Paragraph {
                            id,
                            content_id,
                            heading: input.heading,
                            text: input.text,
                            image: input.image,
                        })
                    }
                };

                tx.commit().await?;

                Ok::<_, StoreError>(Slide::new(
                    slide_id,
                    presentation_id,
                    Content {
                        id: content_id,
                        slide_id,
                        title: draft.title,
                        meta: draft.meta,
                        body,
                    },
                ))
            })
            .await?;

        debug!(slide_id = slide.id, content_id = slide.content.id, "Created slide");
        Ok(slide)
    }

    /// Update a slide's content in place.
    ///
    /// The slide keeps its kind. Options are matched by id within the slide's
    /// content; an id that does not match aborts the whole update.
    #[instrument(skip(self, draft), fields(kind = %draft.kind()))]
    pub async fn update_slide(
        &self,
        presentation_id: i64,
        slide_id: i64,
        draft: SlideDraft,
    ) -> StoreResult<Slide> {
        self.db
            .timed(async {
                let mut tx = self.pool().begin().await?;

                let target: Option<(i64, i64)> = sqlx::query_as(
                    r#"
                    SELECT s.slide_type, c.id
                    FROM slides s
                    JOIN contents c ON c.slide_id = s.id
                    WHERE s.pres_id = ? AND s.id = ?
                    "#,
                )
                .bind(presentation_id)
                .bind(slide_id)
                .fetch_optional(&mut *tx)
                .await?;

                let Some((slide_type, content_id)) = target else {
                    return Err(StoreError::no_rows(format!(
                        "slide {slide_id} in presentation {presentation_id}"
                    )));
                };

                let stored = SlideKind::try_from(slide_type)?;
                if stored != draft.kind() {
                    return Err(StoreError::invalid(format!(
                        "slide {slide_id} is a {stored} slide and cannot become a {}",
                        draft.kind()
                    )));
                }

                sqlx::query("UPDATE contents SET title = ?, meta = ? WHERE id = ?")
                    .bind(&draft.title)
                    .bind(&draft.meta)
                    .bind(content_id)
                    .execute(&mut *tx)
                    .await?;

                match &draft.body {
                    DraftBody::Poll(inputs) => {
                        for (position, input) in inputs.iter().enumerate() {
                            let option_id = input.id.ok_or_else(|| {
                                StoreError::invalid(format!("option {position} needs an id"))
                            })?;
                            let affected = sqlx::query(
                                "UPDATE options SET name = ?, image = ? WHERE content_id = ? AND id = ?",
                            )
                            .bind(input.name.trim())
                            .bind(&input.image)
                            .bind(content_id)
                            .bind(option_id)
                            .execute(&mut *tx)
                            .await?
                            .rows_affected();
                            if affected == 0 {
                                return Err(StoreError::no_rows(format!(
                                    "option {option_id} in content {content_id}"
                                )));
                            }
                        }
                    }
                    DraftBody::Heading(input) => {
                        let affected = sqlx::query(
                            "UPDATE headings SET heading = ?, sub_heading = ?, image = ? WHERE content_id = ?",
                        )
                        .bind(&input.heading)
                        .bind(&input.sub_heading)
                        .bind(&input.image)
                        .bind(content_id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                        if affected == 0 {
                            return Err(StoreError::Inconsistent(format!(
                                "heading slide {slide_id} has no heading row"
                            )));
                        }
                    }
                    DraftBody::Paragraph(input) => {
                        let affected = sqlx::query(
                            "UPDATE paragraphs SET heading = ?, text = ?, image = ? WHERE content_id = ?",
                        )
                        .bind(&input.heading)
                        .bind(&input.text)
                        .bind(&input.image)
                        .bind(content_id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                        if affected == 0 {
                            return Err(StoreError::Inconsistent(format!(
                                "paragraph slide {slide_id} has no paragraph row"
                            )));
                        }
                    }
                }

                let slide = load_slides(&mut tx, presentation_id, Some(slide_id))
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        StoreError::Inconsistent(format!("slide {slide_id} vanished during update"))
                    })?;

                tx.commit().await?;
                Ok::<_, StoreError>(slide)
            })
            .await
    }

    /// Delete a slide; its content and sub-content go with it.
    #[instrument(skip(self))]
    pub async fn delete_slide(&self, presentation_id: i64, slide_id: i64) -> StoreResult<()> {
        let affected = self
            .db
            .timed(async {
                let result = sqlx::query("DELETE FROM slides WHERE pres_id = ? AND id = ?")
                    .bind(presentation_id)
                    .bind(slide_id)
                    .execute(self.pool())
                    .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
            .await?;

        if affected == 0 {
            return Err(StoreError::no_rows(format!(
                "slide {slide_id} in presentation {presentation_id}"
            )));
        }
        Ok(())
    }
}

/// Load slides with their sub-content.
///
/// Sub-content rows are fetched per table and grouped by their `content_id`,
/// so assembly never depends on the order rows come back in.
async fn load_slides(
    conn: &mut SqliteConnection,
    presentation_id: i64,
    slide_id: Option<i64>,
) -> StoreResult<Vec<Slide>> {
    let rows: Vec<SlideRow> = sqlx::query_as(
        r#"
        SELECT s.id AS slide_id, s.slide_type, c.id AS content_id, c.title, c.meta
        FROM slides s
        JOIN contents c ON c.slide_id = s.id
        WHERE s.pres_id = ? AND (? IS NULL OR s.id = ?)
        ORDER BY s.id
        "#,
    )
    .bind(presentation_id)
    .bind(slide_id)
    .bind(slide_id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let options: Vec<PollOption> = sqlx::query_as(
        r#"
        SELECT o.id, o.content_id, o.name, o.image, o.total_votes
        FROM options o
        JOIN contents c ON c.id = o.content_id
        JOIN slides s ON s.id = c.slide_id
        WHERE s.pres_id = ? AND (? IS NULL OR s.id = ?)
        ORDER BY o.id
        "#,
    )
    .bind(presentation_id)
    .bind(slide_id)
    .bind(slide_id)
    .fetch_all(&mut *conn)
    .await?;

    let headings: Vec<Heading> = sqlx::query_as(
        r#"
        SELECT h.id, h.content_id, h.heading, h.sub_heading, h.image
        FROM headings h
        JOIN contents c ON c.id = h.content_id
        JOIN slides s ON s.id = c.slide_id
        WHERE s.pres_id = ? AND (? IS NULL OR s.id = ?)
        "#,
    )
    .bind(presentation_id)
    .bind(slide_id)
    .bind(slide_id)
    .fetch_all(&mut *conn)
    .await?;

    let paragraphs: Vec<Paragraph> = sqlx::query_as(
        r#"
        SELECT p.id, p.content_id, p.heading, p.text, p.image
        FROM paragraphs p
        JOIN contents c ON c.id = p.content_id
        JOIN slides s ON s.id = c.slide_id
        WHERE s.pres_id = ? AND (? IS NULL OR s.id = ?)
        "#,
    )
    .bind(presentation_id)
    .bind(slide_id)
    .bind(slide_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut options_by_content: HashMap<i64, Vec<PollOption>> = HashMap::new();
    for option in options {
        options_by_content
            .entry(option.content_id)
            .or_default()
            .push(option);
    }
    let mut headings: HashMap<i64, Heading> =
        headings.into_iter().map(|h| (h.content_id, h)).collect();
    let mut paragraphs: HashMap<i64, Paragraph> =
        paragraphs.into_iter().map(|p| (p.content_id, p)).collect();

    rows.into_iter()
        .map(|row| {
            let body = match SlideKind::try_from(row.slide_type)? {
                SlideKind::Poll => ContentBody::Poll(
                    options_by_content
                        .remove(&row.content_id)
                        .unwrap_or_default(),
                ),
                SlideKind::Heading => {
                    ContentBody::Heading(headings.remove(&row.content_id).ok_or_else(|| {
                        StoreError::Inconsistent(format!(
                            "heading slide {} has no heading row",
                            row.slide_id
                        ))
                    })?)
                }
                SlideKind::Paragraph => {
                    ContentBody::Paragraph(paragraphs.remove(&row.content_id).ok_or_else(|| {
                        StoreError::Inconsistent(format!(
                            "paragraph slide {} has no paragraph row",
                            row.slide_id
                        ))
                    })?)
                }
            };
            Ok::<_, StoreError>(Slide::new(
                row.slide_id,
                presentation_id,
                Content {
                    id: row.content_id,
                    slide_id: row.slide_id,
                    title: row.title,
                    meta: row.meta,
                    body,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{CreatePresentationRequest, PresentationRepository};
    use crate::slide::models::{HeadingInput, OptionInput, ParagraphInput};

    async fn setup() -> (Database, SlideRepository, i64) {
        let db = Database::in_memory().await.unwrap();
        let presentation = PresentationRepository::new(db.clone())
            .create(CreatePresentationRequest {
                name: "Deck".to_string(),
                owner: None,
            })
            .await
            .unwrap();
        (db.clone(), SlideRepository::new(db), presentation.id)
    }

    fn option(name: &str) -> OptionInput {
        OptionInput {
            id: None,
            name: name.to_string(),
            image: String::new(),
        }
    }

    fn poll(names: &[&str]) -> SlideDraft {
        SlideDraft {
            title: "Poll".to_string(),
            meta: String::new(),
            body: DraftBody::Poll(names.iter().map(|n| option(n)).collect()),
        }
    }

    fn heading(text: &str) -> SlideDraft {
        SlideDraft {
            title: "Heading".to_string(),
            meta: String::new(),
            body: DraftBody::Heading(HeadingInput {
                heading: text.to_string(),
                sub_heading: "sub".to_string(),
                image: String::new(),
            }),
        }
    }

    fn paragraph(text: &str) -> SlideDraft {
        SlideDraft {
            title: "Paragraph".to_string(),
            meta: "m".to_string(),
            body: DraftBody::Paragraph(ParagraphInput {
                heading: "h".to_string(),
                text: text.to_string(),
                image: String::new(),
            }),
        }
    }

    async fn count(db: &Database, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_create_poll_persists_options_at_zero() {
        let (db, repo, pres) = setup().await;
        let slide = repo.create_slide(pres, poll(&["A", "B", "C"])).await.unwrap();
        assert_eq!(slide.kind, SlideKind::Poll);
        assert_eq!(count(&db, "options").await, 3);

        let slides = repo.find_all_slides(pres).await.unwrap();
        assert_eq!(slides.len(), 1);
        let options = slides[0].content.body.options().unwrap();
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.total_votes == 0));
        assert!(options.iter().all(|o| o.content_id == slide.content.id));
        assert_eq!(slides[0], slide);
    }

    #[tokio::test]
    async fn test_read_groups_sub_content_by_slide() {
        let (_db, repo, pres) = setup().await;
        let first = repo.create_slide(pres, poll(&["a1", "a2"])).await.unwrap();
        let middle = repo.create_slide(pres, heading("Intro")).await.unwrap();
        let last = repo.create_slide(pres, poll(&["b1", "b2", "b3"])).await.unwrap();
        let text = repo.create_slide(pres, paragraph("Body")).await.unwrap();

        let slides = repo.find_all_slides(pres).await.unwrap();
        let ids: Vec<i64> = slides.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, middle.id, last.id, text.id]);

        let names = |s: &Slide| -> Vec<String> {
            s.content
                .body
                .options()
                .unwrap()
                .iter()
                .map(|o| o.name.clone())
                .collect()
        };
        assert_eq!(names(&slides[0]), vec!["a1", "a2"]);
        assert_eq!(names(&slides[2]), vec!["b1", "b2", "b3"]);
        assert!(matches!(&slides[1].content.body, ContentBody::Heading(h) if h.heading == "Intro"));
        assert!(matches!(&slides[3].content.body, ContentBody::Paragraph(p) if p.text == "Body"));
    }

    #[tokio::test]
    async fn test_create_under_missing_presentation_leaves_no_rows() {
        let (db, repo, pres) = setup().await;
        let err = repo.create_slide(pres + 1, poll(&["x"])).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(count(&db, "slides").await, 0);
        assert_eq!(count(&db, "contents").await, 0);
    }

    #[tokio::test]
    async fn test_failed_sub_content_insert_rolls_back() {
        let (db, repo, pres) = setup().await;
        sqlx::query("DROP TABLE headings")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.create_slide(pres, heading("boom")).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(count(&db, "slides").await, 0);
        assert_eq!(count(&db, "contents").await, 0);
    }

    #[tokio::test]
    async fn test_update_poll_matches_options_by_id() {
        let (_db, repo, pres) = setup().await;
        let slide = repo.create_slide(pres, poll(&["Red", "Blue"])).await.unwrap();
        let options = slide.content.body.options().unwrap().to_vec();

        let draft = SlideDraft {
            title: "Favourite colour".to_string(),
            meta: String::new(),
            body: DraftBody::Poll(vec![OptionInput {
                id: Some(options[1].id),
                name: "Green".to_string(),
                image: "green.png".to_string(),
            }]),
        };
        let updated = repo.update_slide(pres, slide.id, draft).await.unwrap();
        assert_eq!(updated.content.title, "Favourite colour");
        let names: Vec<&str> = updated
            .content
            .body
            .options()
            .unwrap()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["Red", "Green"]);
    }

    #[tokio::test]
    async fn test_update_with_foreign_option_writes_nothing() {
        let (_db, repo, pres) = setup().await;
        let slide = repo.create_slide(pres, poll(&["Yes", "No"])).await.unwrap();
        let other = repo.create_slide(pres, poll(&["Other"])).await.unwrap();
        let foreign_id = other.content.body.options().unwrap()[0].id;
        let own_id = slide.content.body.options().unwrap()[0].id;

        let draft = SlideDraft {
            title: "changed".to_string(),
            meta: String::new(),
            body: DraftBody::Poll(vec![
                OptionInput {
                    id: Some(own_id),
                    name: "Renamed".to_string(),
                    image: String::new(),
                },
                OptionInput {
                    id: Some(foreign_id),
                    name: "Hijack".to_string(),
                    image: String::new(),
                },
            ]),
        };
        let err = repo.update_slide(pres, slide.id, draft).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRowsAffected(_)));

        let unchanged = repo.get_slide(pres, slide.id).await.unwrap().unwrap();
        assert_eq!(unchanged, slide);
        let other_after = repo.get_slide(pres, other.id).await.unwrap().unwrap();
        assert_eq!(other_after, other);
    }

    #[tokio::test]
    async fn test_update_rejects_kind_change_and_missing_ids() {
        let (_db, repo, pres) = setup().await;
        let slide = repo.create_slide(pres, heading("Title")).await.unwrap();

        let err = repo
            .update_slide(pres, slide.id, paragraph("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let poll_slide = repo.create_slide(pres, poll(&["x"])).await.unwrap();
        let err = repo
            .update_slide(pres, poll_slide.id, poll(&["no id"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_update_heading_and_paragraph() {
        let (_db, repo, pres) = setup().await;
        let h = repo.create_slide(pres, heading("Old")).await.unwrap();
        let p = repo.create_slide(pres, paragraph("Old text")).await.unwrap();

        let h = repo.update_slide(pres, h.id, heading("New")).await.unwrap();
        let p = repo.update_slide(pres, p.id, paragraph("New text")).await.unwrap();

        assert!(matches!(&h.content.body, ContentBody::Heading(x) if x.heading == "New"));
        assert!(matches!(&p.content.body, ContentBody::Paragraph(x) if x.text == "New text"));
    }

    #[tokio::test]
    async fn test_update_missing_slide_reports_no_rows() {
        let (_db, repo, pres) = setup().await;
        let err = repo.update_slide(pres, 999, heading("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRowsAffected(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_content_rows() {
        let (db, repo, pres) = setup().await;
        let slide = repo.create_slide(pres, poll(&["a", "b"])).await.unwrap();
        repo.create_slide(pres, heading("keep")).await.unwrap();

        repo.delete_slide(pres, slide.id).await.unwrap();
        assert_eq!(count(&db, "slides").await, 1);
        assert_eq!(count(&db, "contents").await, 1);
        assert_eq!(count(&db, "options").await, 0);

        let err = repo.delete_slide(pres, slide.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRowsAffected(_)));
    }

    #[tokio::test]
    async fn test_slides_are_scoped_to_presentation() {
        let (db, repo, pres) = setup().await;
        let other = PresentationRepository::new(db.clone())
            .create(CreatePresentationRequest {
                name: "Other".to_string(),
                owner: None,
            })
            .await
            .unwrap();
        let slide = repo.create_slide(pres, heading("mine")).await.unwrap();

        assert!(repo.find_all_slides(other.id).await.unwrap().is_empty());
        assert!(repo.get_slide(other.id, slide.id).await.unwrap().is_none());
        let err = repo.delete_slide(other.id, slide.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRowsAffected(_)));
    }
}
