//! Text helpers shared by the decoder and the CLI.
//!
//! - **HTML synthesis**: escaping and paragraph wrapping for poems that arrive
//!   without an `htmlText` field
//! - **Terminal safety**: control-character stripping and width-aware
//!   truncation for printing remote text

mod text;

pub use text::{escape_html, paragraph_html, strip_control_chars, truncate_to_width};
