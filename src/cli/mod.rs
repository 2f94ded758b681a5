//! Command-line front end driving a [`crate::Notebook`].
mod app;
mod args;

pub use app::*;
pub use args::*;
