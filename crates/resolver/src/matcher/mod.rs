//! Anchor recognition: fuzzy label matching and fused label+value splitting.

pub mod anchor;
pub mod fusion;

pub use anchor::{best_anchor, find_anchors_on_page, MatchedAnchor};
pub use fusion::{split_fused, split_fused_any};
