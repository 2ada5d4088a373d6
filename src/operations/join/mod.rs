//! Gluing open sides together.
//!
//! [`JoinSides`] moves one side onto another, searching the eight
//! rotation and winding combinations for the one that leaves the moving
//! segment best shaped. [`JoinTouchingSides`] is the cleanup pass run after
//! structural edits: it welds nearby corners and connects every pair of open
//! sides that ended up with the same four vertices.

mod bridge;
mod join;
mod orientation;
mod touching;

pub use bridge::BridgeSides;
pub use join::JoinSides;
pub use orientation::Orientation;
pub use touching::JoinTouchingSides;
