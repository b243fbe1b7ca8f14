//! Document model: line tracking, snapshots and the mutable document holder.
//!
//! ```text
//! TextDocument ──snapshot()──▶ DocumentSnapshot
//!      │                            │
//!      └──────── LineIndex ◀────────┘   (shared, copy-on-write)
//!                    │
//!                delimiter
//! ```

mod delimiter;
mod line_index;
mod snapshot;
mod text_document;
pub mod text_utils;

pub use delimiter::{DelimiterMatch, LineDelimiter, next_delimiter, split_lines};
pub use line_index::{LineIndex, LineInfo, LineRegion, Lines};
pub use snapshot::DocumentSnapshot;
pub use text_document::{ContentChange, TextDocument};
