pub mod config;
pub mod graph;
pub mod observer;
pub mod playback;
pub mod reveal;
pub mod timer;
