//! HTTP API module.
//!
//! REST endpoints for presentations, slides and votes, plus the `/ws`
//! upgrade that joins a viewer to a presentation room.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{HealthResponse, VoteQuery};
pub use routes::create_router;
pub use state::AppState;
