//! Repository implementations for Convene.
//!
//! Two backends implement the `convene-core` repository traits with identical
//! semantics: `memory` keeps everything in process (development, tests) and
//! `sqlite` persists through sqlx with a split reader/writer pool. The shared
//! contract suite in `tests/repository_contract.rs` runs against both.

pub mod memory;
pub mod sqlite;
