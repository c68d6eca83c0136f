//! Track and playlist model plus feed ingestion.

mod feed;
mod model;

pub use feed::{FeedFormat, load_feed, load_or_default, parse_feed};
pub use model::{Cursor, Playlist, PlaylistGroup, Track};

#[cfg(test)]
mod tests;
