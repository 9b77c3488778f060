//! Axum HTTP surface for the Railbook reservation engine.
//!
//! This crate keeps the "Functional Core, Imperative Shell" split: handlers
//! parse requests, call the [`railbook_core::ReservationStore`] behind
//! [`AppState`], and serialize the result. No business rules live here.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON body, query parameters)
//! 3. **Call the store**: one atomic operation per request
//! 4. **Map errors** through [`AppError`] to structured JSON
//! 5. **Return response** to the client
//!
//! # Example
//!
//! ```ignore
//! use railbook_web::{routes, AppState};
//! use std::sync::Arc;
//!
//! let state = AppState::new(Arc::new(store));
//! let app = routes::router(state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use routes::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
