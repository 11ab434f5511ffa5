//! Terminal host for the game client core.
//!
//! The binary is the composition root: it reads configuration, installs
//! logging, builds the [`runtime::Runtime`] with terminal presentation
//! adapters and feeds it a simulated walk.

pub mod config;
pub mod input;
pub mod logging;
pub mod presentation;
pub mod walk;

pub use config::ClientConfig;
pub use input::{TerminalChoiceProvider, TerminalInput};
pub use presentation::{TerminalDialogRenderer, render_dialog, render_gate_event};
pub use walk::{RouteWalker, interpolate};

/// Point catalog bundled with the binary.
pub const BUILTIN_CATALOG: &str = include_str!("../data/points.ron");
