//! cardstack: flashcard sets, review sessions and AI elaborations
//!
//! Sets live either in the hosted tables or, in demo mode, in local JSON
//! slots. Elaborations go through a small relay that holds the completion
//! API key.

pub mod app;
pub mod config;
pub mod editor;
pub mod elaborate;
pub mod flashcards;
pub mod review;
pub mod session;
pub mod store;

pub use app::{AppContext, AppError, Route, ViewScope};
pub use config::{Config, RelayConfig};
pub use editor::SetEditor;
pub use review::ReviewSession;
pub use store::{CardStore, PersistenceError};
