//! **orixis** -- a command palette for [`ratatui`] applications.
//!
//! This is the umbrella crate that re-exports everything you need from a
//! single dependency:
//!
//! ```toml
//! [dependencies]
//! orixis = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`orixis_core`] are available at the crate root
//!   ([`Model`], [`Component`], [`Command`], [`Program`], [`run`],
//!   [`run_with`], etc.).
//! * The [`palette`] module re-exports everything from [`orixis_palette`].
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! Run the demo with `cargo run --example palette`.

pub use orixis_core::*;
pub mod palette {
    pub use orixis_palette::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
