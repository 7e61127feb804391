//! Infinite poetry feed: concurrent remote acquisition with local fallback
//! and a paginating feed controller.

pub mod cache;
pub mod config;
pub mod controller;
pub mod corpus;
pub mod decoration;
pub mod engine;
pub mod model;
pub mod remote;
pub mod util;

pub use cache::{JsonFileCache, NoopCache, PoemCache};
pub use config::Config;
pub use controller::{FeedController, FeedError, FeedOptions, FeedSnapshot, FeedStatus};
pub use corpus::{PoemSource, SampleCorpus};
pub use decoration::DecorationPicker;
pub use engine::{BatchSource, FeedEngine};
pub use model::{Category, Poem, Poet};
