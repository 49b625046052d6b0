//! Runtime substrate for the **Orixis** terminal widgets.
//!
//! Widgets follow the [Elm Architecture]: state changes only inside
//! `update`, rendering is a pure function of state, and side effects (running
//! a command action, waiting out a closing transition) are described as
//! [`Command`]s that the runtime executes.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Model`] | Top-level application (init / update / view / on_event) |
//! | [`Component`] | Embeddable widget that renders into a [`ratatui::layout::Rect`] |
//! | [`Command`] | Side effect description |
//! | [`Program`] | Wires a [`Model`] to a real terminal and drives the loop |
//! | [`ComponentHarness`](testing::ComponentHarness) | Headless driver for tests |
//!
//! The event loop is single threaded from the model's point of view: input
//! events and command results are applied one at a time, in arrival order.
//! Futures run on the tokio runtime and report back through the same queue.
//!
//! [Elm Architecture]: https://guide.elm-lang.org/architecture/

pub mod command;
pub mod component;
pub mod event;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod testing;

pub use command::Command;
pub use component::Component;
pub use event::TerminalEvent;
pub use logging::init_file_logging;
pub use model::Model;
pub use runtime::{Program, ProgramError, ProgramOptions};

/// Run an application with default options.
pub async fn run<M: Model>(flags: M::Flags) -> Result<M, ProgramError> {
    Program::<M>::new(flags)?.run().await
}

/// Run with custom options.
pub async fn run_with<M: Model>(flags: M::Flags, options: ProgramOptions) -> Result<M, ProgramError> {
    Program::<M>::with_options(flags, options)?.run().await
}
