//! `nimbusctl` binary entrypoint.
//!
//! Parses the process-level options, builds the REST client once, and
//! dispatches the trailing tokens through the command registry.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nimbus_cli::registry::{CommandRegistry, COMMAND_FAILED};
use nimbus_cli::{Application, CliError, CommandContext};
use nimbus_rest::{Credentials, RestClient, RestConfig};

/// Command-line client for the Nimbus control plane.
#[derive(Debug, Parser)]
#[command(name = "nimbusctl", version, about)]
struct Cli {
    /// Control plane URL.
    #[arg(
        short = 's',
        long = "server",
        env = "NIMBUS_URL",
        default_value = "https://localhost:9443"
    )]
    server: String,

    /// Username for Basic authentication.
    #[arg(short = 'u', long, env = "NIMBUS_USERNAME", default_value = "admin")]
    username: String,

    /// Password for Basic authentication.
    #[arg(short = 'p', long, env = "NIMBUS_PASSWORD", default_value = "admin")]
    password: String,

    /// Command name followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Hosting application handed to commands for usage printing.
struct NimbusApplication {
    registry: CommandRegistry,
}

impl Application for NimbusApplication {
    fn print_usage(&self, command_name: &str) {
        if let Some(command) = self.registry.lookup(command_name) {
            let descriptor = command.descriptor();
            println!("{}", descriptor.usage_line());
            println!("  {}", descriptor.description);
            for option in descriptor.options {
                println!(
                    "  -{}, --{} <{}>  {}",
                    option.short, option.long, option.arg_name, option.description
                );
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<u8, CliError> {
    let application = NimbusApplication {
        registry: CommandRegistry::new(),
    };

    let Some((name, args)) = cli.command.split_first() else {
        eprintln!("No command given. Available commands:");
        list_commands(&application.registry);
        return Ok(COMMAND_FAILED);
    };

    let Some(command) = application.registry.lookup(name) else {
        eprintln!("Unknown command: {name}. Available commands:");
        list_commands(&application.registry);
        return Ok(COMMAND_FAILED);
    };

    let config = RestConfig::new(
        cli.server.clone(),
        Credentials::new(cli.username.clone(), cli.password.clone()),
    );
    let client = RestClient::new(config)?;
    let context = CommandContext::new(&client, &application);

    let result = command.execute(&context, args).await;
    Ok(result.exit_code())
}

fn list_commands(registry: &CommandRegistry) {
    for command in registry.iter() {
        let descriptor = command.descriptor();
        eprintln!("  {:<24} {}", descriptor.name, descriptor.description);
    }
}
