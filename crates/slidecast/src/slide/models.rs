//! Slide and content data models.
//!
//! Stored slides carry an integer type code; in memory the code is lifted into
//! [`SlideKind`] and the sub-content into the closed [`ContentBody`] /
//! [`DraftBody`] sum types, so every create/update path matches exhaustively.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{StoreError, StoreResult};

/// The three slide shapes a deck can mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SlideKind {
    Poll,
    Heading,
    Paragraph,
}

impl SlideKind {
    /// Type code persisted in `slides.slide_type` and used on the wire.
    pub const fn code(self) -> i64 {
        match self {
            SlideKind::Poll => 1,
            SlideKind::Heading => 8,
            SlideKind::Paragraph => 9,
        }
    }
}

impl TryFrom<i64> for SlideKind {
    type Error = StoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(SlideKind::Poll),
            8 => Ok(SlideKind::Heading),
            9 => Ok(SlideKind::Paragraph),
            other => Err(StoreError::UnsupportedSlideType(other)),
        }
    }
}

impl From<SlideKind> for i64 {
    fn from(kind: SlideKind) -> Self {
        kind.code()
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlideKind::Poll => write!(f, "poll"),
            SlideKind::Heading => write!(f, "heading"),
            SlideKind::Paragraph => write!(f, "paragraph"),
        }
    }
}

// ============================================================================
// Stored records
// ============================================================================

/// One answer of a poll slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PollOption {
    pub id: i64,
    pub content_id: i64,
    pub name: String,
    pub image: String,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Heading {
    pub id: i64,
    pub content_id: i64,
    pub heading: String,
    pub sub_heading: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Paragraph {
    pub id: i64,
    pub content_id: i64,
    pub heading: String,
    pub text: String,
    pub image: String,
}

/// The populated sub-content of a [`Content`]. Serializes as exactly one of
/// `options`, `heading` or `paragraph`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContentBody {
    #[serde(rename = "options")]
    Poll(Vec<PollOption>),
    #[serde(rename = "heading")]
    Heading(Heading),
    #[serde(rename = "paragraph")]
    Paragraph(Paragraph),
}

impl ContentBody {
    pub fn kind(&self) -> SlideKind {
        match self {
            ContentBody::Poll(_) => SlideKind::Poll,
            ContentBody::Heading(_) => SlideKind::Heading,
            ContentBody::Paragraph(_) => SlideKind::Paragraph,
        }
    }

    pub fn options(&self) -> Option<&[PollOption]> {
        match self {
            ContentBody::Poll(options) => Some(options),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub id: i64,
    pub slide_id: i64,
    pub title: String,
    pub meta: String,
    #[serde(flatten)]
    pub body: ContentBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slide {
    pub id: i64,
    pub presentation_id: i64,
    #[serde(rename = "type")]
    pub kind: SlideKind,
    pub content: Content,
}

impl Slide {
    /// Build a slide whose type is taken from its body, so the two cannot disagree.
    pub fn new(id: i64, presentation_id: i64, content: Content) -> Self {
        Self {
            id,
            presentation_id,
            kind: content.body.kind(),
            content,
        }
    }
}

/// Post-write vote counts of every option under one poll content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub presentation_id: i64,
    pub content_id: i64,
    pub options: Vec<OptionTally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OptionTally {
    pub id: i64,
    pub name: String,
    pub total_votes: i64,
}

// ============================================================================
// Requests
// ============================================================================

/// Create/update body as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideRequest {
    #[serde(rename = "type")]
    pub slide_type: i64,
    #[serde(default)]
    pub content: ContentRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub options: Option<Vec<OptionInput>>,
    #[serde(default)]
    pub heading: Option<HeadingInput>,
    #[serde(default)]
    pub paragraph: Option<ParagraphInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionInput {
    /// Required when updating, ignored when creating.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadingInput {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub sub_heading: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParagraphInput {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: String,
}

/// Sub-content to write, one variant per slide kind.
#[derive(Debug, Clone)]
pub enum DraftBody {
    Poll(Vec<OptionInput>),
    Heading(HeadingInput),
    Paragraph(ParagraphInput),
}

impl DraftBody {
    pub fn kind(&self) -> SlideKind {
        match self {
            DraftBody::Poll(_) => SlideKind::Poll,
            DraftBody::Heading(_) => SlideKind::Heading,
            DraftBody::Paragraph(_) => SlideKind::Paragraph,
        }
    }
}

/// A validated slide body ready to be persisted.
#[derive(Debug, Clone)]
pub struct SlideDraft {
    pub title: String,
    pub meta: String,
    pub body: DraftBody,
}

impl SlideDraft {
    pub fn kind(&self) -> SlideKind {
        self.body.kind()
    }
}

impl TryFrom<SlideRequest> for SlideDraft {
    type Error = StoreError;

    fn try_from(request: SlideRequest) -> StoreResult<Self> {
        let kind = SlideKind::try_from(request.slide_type)?;
        let ContentRequest {
            title,
            meta,
            options,
            heading,
            paragraph,
        } = request.content;

        let options = options.filter(|o| !o.is_empty());

        let body = match kind {
            SlideKind::Poll => {
                reject_extra(kind, heading.is_some(), "heading")?;
                reject_extra(kind, paragraph.is_some(), "paragraph")?;
                let options =
                    options.ok_or_else(|| StoreError::invalid("poll slide needs at least one option"))?;
                if let Some(position) = options.iter().position(|o| o.name.trim().is_empty()) {
                    return Err(StoreError::invalid(format!(
                        "option {position} must have a name"
                    )));
                }
                DraftBody::Poll(options)
            }
            SlideKind::Heading => {
                reject_extra(kind, options.is_some(), "options")?;
                reject_extra(kind, paragraph.is_some(), "paragraph")?;
                DraftBody::Heading(
                    heading.ok_or_else(|| StoreError::invalid("heading slide needs a heading"))?,
                )
            }
            SlideKind::Paragraph => {
                reject_extra(kind, options.is_some(), "options")?;
                reject_extra(kind, heading.is_some(), "heading")?;
                DraftBody::Paragraph(
                    paragraph
                        .ok_or_else(|| StoreError::invalid("paragraph slide needs a paragraph"))?,
                )
            }
        };

        Ok(SlideDraft { title, meta, body })
    }
}

fn reject_extra(kind: SlideKind, present: bool, field: &str) -> StoreResult<()> {
    if present {
        return Err(StoreError::invalid(format!(
            "{kind} slide must not carry {field}"
        )));
    }
    Ok(())
}
