//! Command descriptors, flag parsing, and the name-to-command registry.
//!
//! Commands are a closed set of [`Command`] variants. Each variant
//! carries a static [`CommandDescriptor`] declaring its flags; the
//! [`CommandRegistry`] resolves a command name to its variant and
//! enumerates the set for help output.

use std::collections::HashMap;

use thiserror::Error;

use crate::commands;
use crate::context::CommandContext;

/// Exit code for any failed command.
pub const COMMAND_FAILED: u8 = 1;

/// One accepted flag of a command.
///
/// Flags follow the `-short <value>` / `--long <value>` convention;
/// short flags may be more than one character (e.g. `-ap`).
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Short flag name, without the leading dash.
    pub short: &'static str,
    /// Long flag name, without the leading dashes.
    pub long: &'static str,
    /// Whether the flag consumes the following token as its value.
    pub takes_value: bool,
    /// Placeholder name for the value in usage text.
    pub arg_name: &'static str,
    /// Help description.
    pub description: &'static str,
}

/// Immutable description of one command: name, help text, and flags.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    /// Command name as typed by the user.
    pub name: &'static str,
    /// One-line description for help output.
    pub description: &'static str,
    /// Argument syntax shown in usage lines.
    pub argument_syntax: &'static str,
    /// Accepted flags.
    pub options: &'static [OptionSpec],
}

impl CommandDescriptor {
    /// Returns the one-line usage string for this command.
    #[must_use]
    pub fn usage_line(&self) -> String {
        if self.argument_syntax.is_empty() {
            format!("usage: {}", self.name)
        } else {
            format!("usage: {} {}", self.name, self.argument_syntax)
        }
    }
}

/// A flag/argument list could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A flag is not declared by the command.
    #[error("unrecognized option: {flag}")]
    UnrecognizedOption {
        /// The offending token.
        flag: String,
    },

    /// A value-taking flag appeared without a value.
    #[error("missing value for option: {flag}")]
    MissingValue {
        /// The flag lacking its value.
        flag: String,
    },
}

/// Flags and positional arguments parsed against a descriptor.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    values: HashMap<&'static str, String>,
    positionals: Vec<String>,
}

impl ParsedArgs {
    /// Returns the value of a flag, looked up by its short name.
    #[must_use]
    pub fn value_of(&self, short: &str) -> Option<&str> {
        self.values.get(short).map(String::as_str)
    }

    /// Returns the positional (non-flag) arguments in order.
    #[must_use]
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }
}

/// Parses an argument list against a command descriptor.
///
/// Tokens starting with `--` match long flag names, tokens starting
/// with `-` match short names, everything else is positional.
///
/// # Errors
///
/// Returns [`ParseError`] for undeclared flags or a value-taking flag
/// at the end of the list.
pub fn parse(
    descriptor: &CommandDescriptor,
    args: &[String],
) -> Result<ParsedArgs, ParseError> {
    let mut parsed = ParsedArgs::default();
    let mut tokens = args.iter();

    while let Some(token) = tokens.next() {
        let name = if let Some(long) = token.strip_prefix("--") {
            Some((long, true))
        } else if let Some(short) = token.strip_prefix('-') {
            Some((short, false))
        } else {
            None
        };

        let Some((name, is_long)) = name else {
            parsed.positionals.push(token.clone());
            continue;
        };

        let spec = descriptor
            .options
            .iter()
            .find(|o| if is_long { o.long == name } else { o.short == name })
            .ok_or_else(|| ParseError::UnrecognizedOption {
                flag: token.clone(),
            })?;

        if spec.takes_value {
            let value = tokens.next().ok_or_else(|| ParseError::MissingValue {
                flag: token.clone(),
            })?;
            parsed.values.insert(spec.short, value.clone());
        } else {
            parsed.values.insert(spec.short, String::new());
        }
    }

    Ok(parsed)
}

/// Outcome of one command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The command completed; exit code 0.
    Success,
    /// The command failed; exit code [`COMMAND_FAILED`].
    Failure,
}

impl ExecutionResult {
    /// Maps the result to the process exit code.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => COMMAND_FAILED,
        }
    }
}

/// The closed set of control-plane commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Deploy an application with an application policy.
    DeployApplication,
    /// Undeploy a running application.
    UndeployApplication,
    /// List deployed applications.
    ListApplications,
    /// Remove a cartridge group by name.
    RemoveCartridgeGroup,
}

impl Command {
    const ALL: [Self; 4] = [
        Self::DeployApplication,
        Self::UndeployApplication,
        Self::ListApplications,
        Self::RemoveCartridgeGroup,
    ];

    /// Returns the static descriptor for this command.
    #[must_use]
    pub const fn descriptor(self) -> &'static CommandDescriptor {
        match self {
            Self::DeployApplication => &commands::deploy_application::DESCRIPTOR,
            Self::UndeployApplication => &commands::undeploy_application::DESCRIPTOR,
            Self::ListApplications => &commands::list_applications::DESCRIPTOR,
            Self::RemoveCartridgeGroup => &commands::remove_cartridge_group::DESCRIPTOR,
        }
    }

    /// Runs this command against the given context and arguments.
    ///
    /// A single attempt; no retries. All failures resolve to
    /// [`ExecutionResult::Failure`] with a message already printed.
    pub async fn execute(self, context: &CommandContext<'_>, args: &[String]) -> ExecutionResult {
        match self {
            Self::DeployApplication => commands::deploy_application::execute(context, args).await,
            Self::UndeployApplication => {
                commands::undeploy_application::execute(context, args).await
            }
            Self::ListApplications => commands::list_applications::execute(context, args).await,
            Self::RemoveCartridgeGroup => {
                commands::remove_cartridge_group::execute(context, args).await
            }
        }
    }
}

/// Maps command names to [`Command`] variants.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates a registry over the full command set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Command::ALL.to_vec(),
        }
    }

    /// Looks up a command by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Command> {
        self.commands
            .iter()
            .copied()
            .find(|c| c.descriptor().name == name)
    }

    /// Iterates the registered commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands.iter().copied()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
