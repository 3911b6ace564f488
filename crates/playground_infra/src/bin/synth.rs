use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use playground_infra::assembly::write_cloud_assembly;
use playground_infra::{Environment, PlaygroundStack, StackError, DEV_STACK_NAME};
use tracing_subscriber::EnvFilter;

/// Synthesizes the playground stack into a cloud assembly directory.
///
/// Account and region default to `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION`;
/// leaving them unset yields an environment-agnostic stack.
#[derive(Parser)]
#[command(name = "synth", about = "Synthesize the DynamoDB playground stack")]
struct Cli {
    /// Name of the stack to synthesize
    #[arg(long, default_value = DEV_STACK_NAME)]
    stack_name: String,
    /// Target account, overriding CDK_DEFAULT_ACCOUNT
    #[arg(long)]
    account: Option<String>,
    /// Target region, overriding CDK_DEFAULT_REGION
    #[arg(long)]
    region: Option<String>,
    /// Cloud assembly output directory
    #[arg(long, default_value = "cdk.out")]
    output: PathBuf,
    /// Directory holding packaged handler zips
    #[arg(long, default_value = "dist/lambda")]
    asset_dir: PathBuf,
    /// Print the template to stdout instead of writing the assembly
    #[arg(long)]
    print: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StackError> {
    let environment = Environment::from_env().with_overrides(cli.account, cli.region);
    if environment.is_agnostic() {
        tracing::warn!(
            environment = %environment.assembly_uri(),
            "account or region unset, synthesizing an environment-agnostic stack"
        );
    }

    let stack = PlaygroundStack::new(cli.stack_name, environment)?;

    if cli.print {
        let synthesized = stack.synthesize_with_assets(Some(&cli.asset_dir))?;
        let body = synthesized
            .template
            .to_json_pretty()
            .map_err(|source| StackError::Serialize {
                artifact: "template",
                source,
            })?;
        println!("{body}");
        return Ok(());
    }

    let paths = write_cloud_assembly(&cli.output, &stack, Some(&cli.asset_dir))?;
    tracing::info!(template = %paths.template.display(), "synthesis complete");
    Ok(())
}
