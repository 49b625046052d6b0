//! Searchable command palette overlay for Orixis terminal applications.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Defaulted configuration, JSON patches, themes |
//! | [`descriptor`] | Command descriptors and the [`CommandAction`] interface |
//! | [`commands`] | Per-instance command list with id generation and duplicate policy |
//! | [`store`] | Key-value backends for persisted usage |
//! | [`usage`] | Recents, favorites and frequency shared by all instances |
//! | [`ranking`] | Fuzzy and simple matching, ordering, category filters |
//! | [`view`] | Platform-neutral view tree built from palette state |
//! | [`render`] | Ratatui adapter for the view tree, mouse hit map |
//! | [`palette`] | The [`Palette`] component and its state machine |
//! | [`registry`] | [`RegistryService`]: instance tracking and input routing |
//! | [`key`] | Key bindings and footer legend |
//!
//! # Quick start
//!
//! ```ignore
//! use orixis_palette::{CommandDescriptor, PaletteConfig, RegistryService};
//!
//! let mut registry = RegistryService::in_memory();
//! let id = registry.create(
//!     PaletteConfig::default(),
//!     vec![
//!         CommandDescriptor::new("open", "Open File").shortcut("Ctrl+O"),
//!         CommandDescriptor::new("quit", "Quit").on_run(|_| Ok(())),
//!     ],
//! )?;
//! let cmd = registry.open(id);
//! ```

pub mod commands;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod palette;
pub mod ranking;
pub mod registry;
pub mod render;
pub mod store;
pub mod usage;
pub mod view;

pub use config::{ConfigPatch, PaletteConfig};
pub use descriptor::{
    ActionOutcome, AsyncAction, CommandAction, CommandDescriptor, ContextData, FnAction,
};
pub use error::{ActionError, PaletteError, StoreError};
pub use palette::{Message, Palette, Visibility};
pub use ranking::CategoryFilter;
pub use registry::{InstanceId, RegistryMessage, RegistryService};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use usage::{SharedUsage, UsageStore};
