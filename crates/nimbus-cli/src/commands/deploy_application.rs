//! `deploy-application`: deploys an application under a policy.

use serde::Serialize;
use tracing::error;

use crate::context::CommandContext;
use crate::registry::{self, CommandDescriptor, ExecutionResult, OptionSpec};

/// Descriptor for `deploy-application`.
pub const DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    name: "deploy-application",
    description: "Deploy an application",
    argument_syntax: "[-a <application id>] [-ap <application policy id>]",
    options: &[
        OptionSpec {
            short: "a",
            long: "application",
            takes_value: true,
            arg_name: "application id",
            description: "Identifier of the application to deploy",
        },
        OptionSpec {
            short: "ap",
            long: "application-policy",
            takes_value: true,
            arg_name: "application policy id",
            description: "Identifier of the application policy to apply",
        },
    ],
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeployApplicationRequest<'a> {
    application_id: &'a str,
    application_policy_id: &'a str,
}

/// Runs the command; both flags are required.
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

    // The flags are individually optional but jointly mandatory.
    let (Some(application_id), Some(policy_id)) = (parsed.value_of("a"), parsed.value_of("ap"))
    else {
        println!("{}", DESCRIPTOR.usage_line());
        return ExecutionResult::Failure;
    };

    let request = DeployApplicationRequest {
        application_id,
        application_policy_id: policy_id,
    };

    match context.client.post("/applications/deploy", &request).await {
        Ok(response) if response.is_success() => {
            println!("Application deployed: {application_id}");
            ExecutionResult::Success
        }
        Ok(response) => {
            error!(status = %response.status, application_id, "deploy rejected");
            println!(
                "Failed to deploy application {application_id}: {}",
                response.status
            );
            ExecutionResult::Failure
        }
        Err(e) => {
            error!(error = %e, application_id, "deploy failed");
            println!("Failed to deploy application {application_id}: {e}");
            ExecutionResult::Failure
        }
    }
}
