//! Narrative Player: branching visual-novel playback.
//!
//! Loads a story graph of scenes, text blocks and choices from RON, plays it
//! back on a virtual clock with typewriter text reveal, and derives the
//! visuals a renderer needs from each playback snapshot.

pub mod core;
pub mod presentation;
pub mod schema;
