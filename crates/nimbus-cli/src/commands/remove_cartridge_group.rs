//! `remove-cartridge-group`: removes a cartridge group by name.
//!
//! Unlike the flag-driven commands this one takes a single bare
//! positional argument.

use tracing::error;

use crate::context::CommandContext;
use crate::registry::{self, CommandDescriptor, ExecutionResult};

/// Descriptor for `remove-cartridge-group`.
pub const DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    name: "remove-cartridge-group",
    description: "Remove a cartridge group",
    argument_syntax: "[cartridge group name]",
    options: &[],
};

/// Runs the command; exactly one positional argument is required.
pub async fn execute(context: &CommandContext<'_>, args: &[String]) -> ExecutionResult {
    // No flag parsing on an empty list; straight to the usage path.
    if args.is_empty() {
        context.application.print_usage(DESCRIPTOR.name);
        return ExecutionResult::Failure;
    }

    let parsed = match registry::parse(&DESCRIPTOR, args) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("{e}");
            return ExecutionResult::Failure;
        }
    };

    let [group_name] = parsed.positionals() else {
        println!("{}", DESCRIPTOR.usage_line());
        return ExecutionResult::Failure;
    };

    let path = format!("/cartridgeGroups/{group_name}");
    match context.client.delete(&path).await {
        Ok(response) if response.is_success() => {
            println!("Cartridge group removed: {group_name}");
            ExecutionResult::Success
        }
        Ok(response) => {
            error!(status = %response.status, group_name, "remove rejected");
            println!(
                "Failed to remove cartridge group {group_name}: {}",
                response.status
            );
            ExecutionResult::Failure
        }
        Err(e) => {
            error!(error = %e, group_name, "remove failed");
            println!("Failed to remove cartridge group {group_name}: {e}");
            ExecutionResult::Failure
        }
    }
}
