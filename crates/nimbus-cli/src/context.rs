//! Session state threaded through every command execution.

use nimbus_rest::RestClient;

/// Hosting application callbacks available to commands.
///
/// Commands call [`Application::print_usage`] when invoked with no
/// arguments; the hosting binary decides how usage is rendered.
pub trait Application {
    /// Prints usage help for the named command.
    fn print_usage(&self, command_name: &str);
}

/// Per-invocation context passed by reference into every command.
pub struct CommandContext<'a> {
    /// Client for the control plane REST API.
    pub client: &'a RestClient,
    /// The hosting application.
    pub application: &'a dyn Application,
}

impl<'a> CommandContext<'a> {
    /// Creates a context over a client and hosting application.
    #[must_use]
    pub fn new(client: &'a RestClient, application: &'a dyn Application) -> Self {
        Self {
            client,
            application,
        }
    }
}
