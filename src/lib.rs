// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod publish;
pub mod search;
pub mod store;
pub mod trend;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Settings;
pub use crate::draft::{DraftGenerator, DraftResult};
pub use crate::error::ApiError;
pub use crate::search::{CanonicalArticle, ProviderConfig};
