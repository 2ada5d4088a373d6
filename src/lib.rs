pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod topology;

#[cfg(test)]
mod test_support;

pub use config::EditorConfig;
pub use editor::{Editor, EditorHooks, NoHooks, Selection};
pub use error::{LevelError, Result};
pub use topology::Level;
