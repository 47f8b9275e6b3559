//! Core library for the "Guess the Prompt" party game: session and round
//! data model, derived phase inference, setter rotation, readiness, and
//! scoring, synchronized through an external document store. Rendering,
//! navigation, and authentication live in the consuming presentation
//! layer.

pub mod error;
pub mod imagegen;
pub mod phase;
pub mod session;
pub mod store;
pub mod types;
