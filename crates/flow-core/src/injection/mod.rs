//! Shallow JSON merge used when folding a block instance's resolved mappings
//! into a single params object: a later mapping overrides an earlier one
//! targeting the same input.

pub mod merge;

pub use merge::merge_json;
