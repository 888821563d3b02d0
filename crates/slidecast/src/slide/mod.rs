//! Slides, their typed content, and votes.

mod models;
mod repository;
mod service;
mod votes;

pub use models::{
    Content, ContentBody, ContentRequest, DraftBody, Heading, HeadingInput, OptionInput,
    OptionTally, Paragraph, ParagraphInput, PollOption, Slide, SlideDraft, SlideKind,
    SlideRequest, Tally,
};
pub use repository::SlideRepository;
pub use service::SlideService;
pub use votes::VoteStore;
