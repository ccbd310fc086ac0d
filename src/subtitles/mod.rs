//! Styled ASS subtitle generation.
//!
//! This module provides functionality to:
//! - Resolve user style options into an ASS style record
//! - Write the styled ASS header and merge converted dialogue events into it

mod ass;
mod style;

pub use ass::{merge_dialogue, write_styled_header};
pub use style::{AssStyle, DEFAULT_STYLE_NAME, SubtitleStyle};
