use std::fs;
use std::io;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const HANDLER_CRATE: &str = "playground_stream_lambda";
const HANDLER_BINARIES: [&str; 3] = ["insert_lambda", "update_lambda", "delete_lambda"];
const DIST_DIR: &str = "dist/lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the DynamoDB stream playground workspace",
    long_about = "Synthesizes the playground stack, packages the stream handler\n\
                  Lambdas, and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the stack into a cloud assembly
    Synth {
        /// Name of the stack to synthesize
        #[arg(long, default_value = "dynamodb-playground-dev")]
        stack_name: String,
        /// Cloud assembly output directory
        #[arg(long, default_value = "cdk.out")]
        output: String,
        /// Target account (falls back to CDK_DEFAULT_ACCOUNT)
        #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
        account: Option<String>,
        /// Target region (falls back to CDK_DEFAULT_REGION)
        #[arg(long, env = "CDK_DEFAULT_REGION")]
        region: Option<String>,
        /// Print the template instead of writing the assembly
        #[arg(long)]
        print: bool,
    },
    /// Build and zip the three stream handler Lambdas
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Run CI checks
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Synthesize the stack to stdout
    Synth,
    /// Run check + synth
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn synth(
    stack_name: &str,
    output: &str,
    account: Option<&str>,
    region: Option<&str>,
    print: bool,
) {
    let mut args = vec![
        "run",
        "-p",
        "playground_infra",
        "--bin",
        "synth",
        "--",
        "--stack-name",
        stack_name,
        "--output",
        output,
        "--asset-dir",
        DIST_DIR,
    ];
    if let Some(account) = account {
        args.extend(["--account", account]);
    }
    if let Some(region) = region {
        args.extend(["--region", region]);
    }
    if print {
        args.push("--print");
    }
    run_cargo(&args);
}

fn package_stream_handlers(target: &str, profile: BuildProfile) {
    if let Err(message) = require_target(target) {
        eprintln!("error: {message}");
        exit(1);
    }

    step("Build stream handler binaries");

    let mut cargo_args = vec!["build", "-p", HANDLER_CRATE, "--target", target];
    for binary in HANDLER_BINARIES {
        cargo_args.extend(["--bin", binary]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Zip stream handlers");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    if let Err(error) = fs::create_dir_all(dist_dir) {
        eprintln!("error: cannot create {}: {error}", dist_dir.display());
        exit(1);
    }

    for binary in HANDLER_BINARIES {
        let binary_path = target_dir.join(binary);
        let zip_path = dist_dir.join(format!("{binary}.zip"));
        match zip_handler(&binary_path, &zip_path) {
            Ok(bytes) => eprintln!("- {} ({bytes} bytes)", zip_path.display()),
            Err(error) => {
                eprintln!("error: packaging {binary} failed: {error}");
                exit(1);
            }
        }
    }
    eprintln!("Re-run `cargo run -p xtask -- synth` so the template picks up the new asset hashes.");
}

/// Fails when rustup reports the handler target missing; skips the check
/// when rustup itself is unavailable.
fn require_target(target: &str) -> Result<(), String> {
    let Ok(output) = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    else {
        eprintln!("warning: rustup not found, skipping target check for `{target}`");
        return Ok(());
    };
    if !output.status.success() {
        return Err(format!(
            "`rustup target list --installed` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "stream handlers build for `{target}`; run `rustup target add {target}` first"
        ))
    }
}

/// Writes `binary_path` into `zip_path` as the `bootstrap` entry the
/// `provided.al2023` runtime executes. Returns the archive size.
fn zip_handler(binary_path: &Path, zip_path: &Path) -> zip::result::ZipResult<u64> {
    let mut binary = fs::File::open(binary_path)?;
    let mut zip = ZipWriter::new(fs::File::create(zip_path)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)?;
    io::copy(&mut binary, &mut zip)?;
    let file = zip.finish()?;
    Ok(file.metadata()?.len())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    for crate_name in ["playground_core", "playground_infra", HANDLER_CRATE] {
        step(&format!("Test {crate_name}"));
        run_cargo(&["test", "-p", crate_name]);
    }
}

fn ci_synth() {
    step("Synthesize stack");
    synth("dynamodb-playground-dev", "cdk.out", None, None, true);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            stack_name,
            output,
            account,
            region,
            print,
        } => {
            synth(
                &stack_name,
                &output,
                account.as_deref(),
                region.as_deref(),
                print,
            );
        }
        Commands::ServerlessPackage { target, profile } => {
            package_stream_handlers(&target, profile);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Synth => ci_synth(),
                CiJob::All => {
                    ci_check();
                    ci_synth();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
