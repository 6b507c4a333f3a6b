//! # marquee-shared
//!
//! Domain model types shared across the Marquee crates, plus the pure
//! helpers that operate on them: the comment-tree builder and slug
//! normalization.  Nothing in this crate performs I/O.

pub mod slug;
pub mod tree;
pub mod types;

pub use tree::{build_comment_tree, CommentNode};
pub use types::*;
