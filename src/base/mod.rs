//! Foundation types for the dslkit toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Range`] - Line/character positions (0-indexed, LSP style)
//! - [`IntervalSet`] - Sorted sets of token-type (or character-code) ranges
//!
//! This module has NO dependencies on other dslkit modules.

mod interval_set;
mod position;

pub use interval_set::{Interval, IntervalSet};
pub use position::{Position, Range};
