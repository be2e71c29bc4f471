//! Per-table session ownership.
//!
//! The engine has no ambient global game. A transport keeps one
//! `SessionRegistry` and addresses games by `TableId`; every operation on a
//! table runs under that table's own mutex, so concurrent requests from the
//! players of one table are applied one at a time in lock order while
//! different tables proceed independently.

mod registry;

pub use registry::{SessionError, SessionRegistry};
