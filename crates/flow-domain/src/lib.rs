//! Data model for FlowBridge: flows, blocks, connections and mappings.
//!
//! This crate is pure data plus the invariants that are cheap to check
//! in-process (shape, referential integrity). It has no I/O: loading,
//! persisting and invalidating flow/block definitions live in
//! `flow-persistence` and `flow-cache`; executing them lives in `flow-core`.

pub mod block;
pub mod error;
pub mod flow;
pub mod mapping;

pub use block::{BlockDefinition, BlockInputSpec, BlockOutputSpec, BlockSource, BlockType, HttpMethod, InputLocation};
pub use error::DomainError;
pub use flow::{
    BlockInstance, BlockInstanceConfig, Connection, ErrorHandling, Flow, FlowConfig, FlowInputDecl, FlowOutputDecl, FlowStatus, InputType,
};
pub use mapping::{InputMapping, MappingSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_regex_accepts_lowercase_hyphenated() {
        assert!(Flow::is_valid_slug("order-lookup-42"));
        assert!(!Flow::is_valid_slug("Order_Lookup"));
        assert!(!Flow::is_valid_slug(""));
    }
}
