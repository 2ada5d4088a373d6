//! Editing operations on a [`Level`](crate::topology::Level).
//!
//! Each operation is a small value built with `new` and optional `with_*`
//! setters, then applied with `execute`. An operation that returns an error
//! has not modified the level.

pub mod clipboard;
pub mod connectivity;
pub mod creation;
pub mod join;
pub mod modification;
pub mod query;
pub mod weld;
