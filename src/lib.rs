//! flowbridge: the HTTP binding around the flow execution engine.
//!
//! `main.rs` wires a [`flow_core::FlowExecutionEngine`] to a durable store
//! (in-memory by default, Postgres behind the `pg_demo` feature) and serves
//! it through the router built in [`app`].

pub mod app;
pub mod config;
pub mod errors;
