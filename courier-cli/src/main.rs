//! Courier CLI - APNs delivery and the Safari push web service.
//!
//! # Commands
//!
//! - `courier serve` - Run the Safari push web service
//! - `courier push --token <device>` - Send one notification through APNs
//! - `courier package` - Write a signed Safari push package to disk
//!
//! Settings come from `--config` (TOML or JSON), `.env` and `COURIER_*`
//! environment variables, later sources winning.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use courier_push::ResultCode;
use std::path::PathBuf;

mod commands;
mod error;
mod logging;
mod settings;

use commands::{package, push, serve};
use error::{CliError, CliResult};
use logging::LogFormat;
use settings::CourierSettings;

/// Courier - Apple push delivery tools
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version)]
#[command(about = "APNs delivery and Safari website push tools")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "COURIER_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Safari push web service
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Send one notification through APNs
    #[command(alias = "p")]
    Push(PushCommand),

    /// Write a signed Safari push package to disk
    Package(PackageCommand),
}

#[derive(Args, Debug)]
struct ServeCommand {
    /// Host to bind to (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct PushCommand {
    /// Device token
    #[arg(short, long)]
    token: String,

    /// Notification kind
    #[arg(short, long, value_enum, default_value_t = push::PushKind::Alert)]
    kind: push::PushKind,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    subtitle: String,

    #[arg(short, long, default_value = "")]
    body: String,

    /// Sound name; alerts default to the system sound
    #[arg(long, default_value = "")]
    sound: String,

    #[arg(long)]
    badge: Option<i64>,

    /// Safari action button label
    #[arg(long, default_value = "")]
    action: String,

    /// Safari URL argument (repeatable)
    #[arg(long = "url-arg")]
    url_args: Vec<String>,

    /// Custom top-level payload fields as a JSON object
    #[arg(long)]
    data: Option<String>,

    /// apns-id
    #[arg(long)]
    id: Option<String>,

    /// apns-priority (10 immediate, 5 power-saving)
    #[arg(long)]
    priority: Option<u8>,

    /// Seconds APNs should keep retrying delivery
    #[arg(long)]
    expiration: Option<u64>,

    /// apns-collapse-id
    #[arg(long)]
    collapse_id: Option<String>,

    /// Print the raw request and response
    #[arg(long)]
    show_debug: bool,
}

impl From<&PushCommand> for push::PushArgs {
    fn from(cmd: &PushCommand) -> Self {
        Self {
            token: cmd.token.clone(),
            kind: cmd.kind,
            title: cmd.title.clone(),
            subtitle: cmd.subtitle.clone(),
            body: cmd.body.clone(),
            sound: cmd.sound.clone(),
            badge: cmd.badge,
            action: cmd.action.clone(),
            url_args: cmd.url_args.clone(),
            data: cmd.data.clone(),
            id: cmd.id.clone(),
            priority: cmd.priority,
            expiration: cmd.expiration,
            collapse_id: cmd.collapse_id.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct PackageCommand {
    /// Output file
    #[arg(short, long, default_value = "pushPackage.zip")]
    output: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.log_format, if cli.verbose { "debug" } else { "info" });

    if let Err(e) = run(cli).await {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let settings = CourierSettings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(cmd) => {
            serve::run(
                &settings,
                serve::ServeArgs {
                    host: cmd.host,
                    port: cmd.port,
                },
            )
            .await
        }
        Commands::Push(cmd) => {
            let result = push::run(&settings, &push::PushArgs::from(&cmd)).await?;

            if cmd.show_debug {
                println!("{}\n{}\n", "Request:".bright_cyan().bold(), result.debug_request);
                println!("{}\n{}\n", "Response:".bright_cyan().bold(), result.debug_response);
            }

            if result.code == ResultCode::Ok {
                println!("  {} Delivered to {}", "✓".green().bold(), cmd.token);
                Ok(())
            } else {
                Err(CliError::Delivery {
                    code: result.code.to_string(),
                    reason: result
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no reason given".to_string()),
                })
            }
        }
        Commands::Package(cmd) => {
            let size = package::run(&settings, &cmd.output)?;
            println!(
                "  {} Wrote {} ({} bytes)",
                "✓".green().bold(),
                cmd.output.display(),
                size
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_push() {
        let cli = Cli::try_parse_from([
            "courier", "push", "--token", "abc", "--kind", "voip", "--title", "Call", "--priority",
            "10",
        ])
        .unwrap();

        let Commands::Push(cmd) = cli.command else {
            panic!("expected push");
        };
        let args = push::PushArgs::from(&cmd);
        assert_eq!(args.kind, push::PushKind::Voip);
        assert_eq!(args.priority, Some(10));
    }

    #[test]
    fn test_parse_package_default_output() {
        let cli = Cli::try_parse_from(["courier", "package"]).unwrap();
        let Commands::Package(cmd) = cli.command else {
            panic!("expected package");
        };
        assert_eq!(cmd.output, PathBuf::from("pushPackage.zip"));
    }
}
