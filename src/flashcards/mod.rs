//! Flashcard sets for cardstack
//!
//! This module provides:
//! - Card set and card models (wire-compatible with the hosted tables)
//! - Kind-prefixed id generation
//! - Draft cards used by the set editor

pub mod models;

pub use models::*;
