//! HTTP API module.
//!
//! Account and session endpoints under `/api`.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{HealthResponse, LoginRequest, SessionResponse};
pub use routes::create_router;
pub use state::AppState;
