//! duet: keeps an audio-only stream and an immersive 360° video stream of the
//! same track in step, with only one of them ever audible.

pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod media;
pub mod player;
pub mod runtime;
