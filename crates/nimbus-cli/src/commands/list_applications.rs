//! `list-applications`: lists the deployed applications.

use tracing::error;

use crate::context::CommandContext;
use crate::registry::{CommandDescriptor, ExecutionResult};

/// Descriptor for `list-applications`.
pub const DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    name: "list-applications",
    description: "List deployed applications",
    argument_syntax: "",
    options: &[],
};

/// Runs the command; takes no arguments.
pub async fn execute(context: &CommandContext<'_>, args: &[String]) -> ExecutionResult {
    if !args.is_empty() {
        println!("{}", DESCRIPTOR.usage_line());
        return ExecutionResult::Failure;
    }

    match context.client.get("/applications").await {
        Ok(response) if response.is_success() => {
            let listing = response.body_text();
            if listing.trim().is_empty() {
                println!("No applications found");
            } else {
                println!("{listing}");
            }
            ExecutionResult::Success
        }
        Ok(response) => {
            error!(status = %response.status, "list applications rejected");
            println!("Failed to list applications: {}", response.status);
            ExecutionResult::Failure
        }
        Err(e) => {
            error!(error = %e, "list applications failed");
            println!("Failed to list applications: {e}");
            ExecutionResult::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{args, test_client, MockApplication, StubConnector};

    use http::{Method, StatusCode};

    #[tokio::test]
    async fn fetches_the_application_listing() {
        let stub = StubConnector::with_body(StatusCode::OK, b"[{\"applicationId\":\"app1\"}]");
        let client = test_client(&stub);
        let app = MockApplication::new();
        let context = CommandContext::new(&client, &app);

        let result = execute(&context, &[]).await;

        assert_eq!(result, ExecutionResult::Success);
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].uri, "/applications");
    }

    #[tokio::test]
    async fn extra_arguments_fail_without_network() {
        let stub = StubConnector::new(StatusCode::OK);
        let client = test_client(&stub);
        let app = MockApplication::new();
        let context = CommandContext::new(&client, &app);

        let result = execute(&context, &args(&["whatever"])).await;

        assert_eq!(result, ExecutionResult::Failure);
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test]
    async fn non_success_status_fails() {
        let stub = StubConnector::new(StatusCode::SERVICE_UNAVAILABLE);
        let client = test_client(&stub);
        let app = MockApplication::new();
        let context = CommandContext::new(&client, &app);

        let result = execute(&context, &[]).await;

        assert_eq!(result, ExecutionResult::Failure);
    }
}
