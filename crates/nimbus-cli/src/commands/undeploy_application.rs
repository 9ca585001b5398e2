//! `undeploy-application`: takes a deployed application down.

use serde_json::json;
use tracing::error;

use crate::context::CommandContext;
use crate::registry::{self, CommandDescriptor, ExecutionResult, OptionSpec};

/// Descriptor for `undeploy-application`.
pub const DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    name: "undeploy-application",
    description: "Undeploy an application",
    argument_syntax: "[-a <application id>]",
    options: &[OptionSpec {
        short: "a",
        long: "application",
        takes_value: true,
        arg_name: "application id",
        description: "Identifier of the application to undeploy",
    }],
};

/// Runs the command; the application flag is required.
pub async fn execute(context: &CommandContext<'_>, args: &[String]) -> ExecutionResult {
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

    let Some(application_id) = parsed.value_of("a") else {
        println!("{}", DESCRIPTOR.usage_line());
        return ExecutionResult::Failure;
    };

    let path = format!("/applications/{application_id}/undeploy");
    let request = json!({ "applicationId": application_id });
    match context.client.post(&path, &request).await {
        Ok(response) if response.is_success() => {
            println!("Application undeployed: {application_id}");
            ExecutionResult::Success
        }
        Ok(response) => {
            error!(status = %response.status, application_id, "undeploy rejected");
            println!(
                "Failed to undeploy application {application_id}: {}",
                response.status
            );
            ExecutionResult::Failure
        }
        Err(e) => {
            error!(error = %e, application_id, "undeploy failed");
            println!("Failed to undeploy application {application_id}: {e}");
            ExecutionResult::Failure
        }
    }
}
