//! Observability setup for Convene.

pub mod tracing_setup;
