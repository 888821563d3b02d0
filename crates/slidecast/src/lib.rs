//! Slidecast Server Library
//!
//! Presentation decks with live audience polling. Votes are tallied in SQLite
//! and fanned out to connected viewers through an in-process room hub.

pub mod api;
pub mod config;
pub mod db;
pub mod presentation;
pub mod slide;
pub mod ws;
