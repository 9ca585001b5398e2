//! # nimbus-cli
//!
//! Command-line front end for the Nimbus control plane.
//!
//! Subcommands are a closed set of [`registry::Command`] variants
//! resolved by name through the [`registry::CommandRegistry`]. Each
//! command parses its own flags, validates required combinations, makes
//! exactly one call through [`nimbus_rest::RestClient`], and translates
//! the outcome into an [`registry::ExecutionResult`].
//!
//! ```text
//! ┌───────────┐   HTTPS (Basic auth)   ┌─────────────────┐
//! │ nimbusctl │◄──────────────────────►│  control plane  │
//! └───────────┘                        └─────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod context;
pub mod error;
pub mod registry;

pub use context::{Application, CommandContext};
pub use error::CliError;
pub use registry::{
    Command, CommandDescriptor, CommandRegistry, ExecutionResult, OptionSpec, COMMAND_FAILED,
};
