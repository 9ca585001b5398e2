//! CLI error types.

use thiserror::Error;

/// Errors surfaced to the process entry point.
///
/// Command-level failures (bad flags, domain errors) never appear here;
/// they resolve locally to a printed message and a failure exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The REST client could not be constructed.
    #[error("client setup failed: {0}")]
    Client(#[from] nimbus_rest::RestError),
}
