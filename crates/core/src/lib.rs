//! Pagewright core: the file-backed content versioning and publication
//! engine behind the page-builder admin UI.
//!
//! The [`engine::ContentEngine`] façade is the single entry point; it owns
//! all document mutation and combines the document store, block registry,
//! revision manager, redirect resolver and publication state machine.

pub mod blocks;
pub mod document;
pub mod engine;
pub mod error;
pub mod events;
pub mod publish;
pub mod redirect;
pub mod revision;
pub mod store;

pub use engine::ContentEngine;
pub use error::{EngineError, EngineResult};
