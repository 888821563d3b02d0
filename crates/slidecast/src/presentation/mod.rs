//! Presentation records.
//!
//! A presentation owns an ordered deck of slides and names the live room
//! its viewers join.

mod models;
mod repository;

pub use models::{
    CreatePresentationRequest, Presentation, PresentationListQuery, UpdatePresentationRequest,
    room_for,
};
pub use repository::PresentationRepository;
