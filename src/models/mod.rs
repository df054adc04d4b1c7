pub mod video;

pub use video::{rank_and_truncate, Feed, FeedSource, VideoItem, VideoLinks};
