use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use relinst::commands::{self, InstallOptions, PlatformArgs};
use relinst::error::PipelineError;
use relinst::install::config::DestinationOverrides;
use relinst::runtime::RealRuntime;

/// relinst - prebuilt release installer
///
/// Downloads a prebuilt release archive for the current platform, checks it
/// against the pinned SHA-256 digest and installs its executable, manual
/// page and shell completions.
///
/// Examples:
///   relinst install                 # Install the built-in package
///   relinst --prefix ~/.local install
///   relinst locate --os macos       # Print the macOS download URL
#[derive(Parser, Debug)]
#[command(author, version = env!("RELINST_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install prefix (defaults to /usr/local as root, ~/.local otherwise)
    #[arg(long, env = "RELINST_PREFIX", value_name = "PATH", global = true)]
    prefix: Option<PathBuf>,

    /// Package manifest (defaults to the built-in manifest)
    #[arg(long, env = "RELINST_MANIFEST", value_name = "FILE", global = true)]
    manifest: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify and install the package
    Install(InstallArgs),

    /// Print the download URL and digest for a platform
    Locate(PlatformFlags),

    /// Check a local archive against its digest
    Verify(VerifyArgs),

    /// Show the package manifest
    Info,
}

#[derive(clap::Args, Debug, Default)]
struct PlatformFlags {
    /// Operating system (defaults to the current one)
    #[arg(long, value_name = "OS")]
    os: Option<String>,

    /// CPU architecture (defaults to the current one)
    #[arg(long, value_name = "ARCH")]
    arch: Option<String>,
}

impl From<PlatformFlags> for PlatformArgs {
    fn from(flags: PlatformFlags) -> Self {
        PlatformArgs {
            os: flags.os,
            arch: flags.arch,
        }
    }
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    #[command(flatten)]
    platform: PlatformFlags,

    /// Resolve the release asset and stop before downloading
    #[arg(long)]
    dry_run: bool,

    /// Executable destination (default: <prefix>/bin)
    #[arg(long, value_name = "PATH")]
    bin_dir: Option<PathBuf>,

    /// Manual page root (default: <prefix>/share/man)
    #[arg(long, value_name = "PATH")]
    man_dir: Option<PathBuf>,

    /// Bash completion destination (default: <prefix>/etc/bash_completion.d)
    #[arg(long, value_name = "PATH")]
    bash_completion_dir: Option<PathBuf>,

    /// Zsh completion destination (default: <prefix>/share/zsh/site-functions)
    #[arg(long, value_name = "PATH")]
    zsh_completion_dir: Option<PathBuf>,

    /// Fish completion destination (default: <prefix>/share/fish/vendor_completions.d)
    #[arg(long, value_name = "PATH")]
    fish_completion_dir: Option<PathBuf>,
}

impl From<InstallArgs> for InstallOptions {
    fn from(args: InstallArgs) -> Self {
        InstallOptions {
            platform: args.platform.into(),
            dry_run: args.dry_run,
            overrides: DestinationOverrides {
                bin_dir: args.bin_dir,
                man_dir: args.man_dir,
                bash_completion_dir: args.bash_completion_dir,
                zsh_completion_dir: args.zsh_completion_dir,
                fish_completion_dir: args.fish_completion_dir,
            },
        }
    }
}

#[derive(clap::Args, Debug)]
struct VerifyArgs {
    /// Archive to check
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Expected digest (default: the manifest entry for the platform)
    #[arg(long, value_name = "HEX", conflicts_with_all = ["os", "arch"])]
    sha256: Option<String>,

    #[command(flatten)]
    platform: PlatformFlags,
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = RealRuntime;

    match cli.command {
        Commands::Install(args) => {
            commands::install(runtime, cli.prefix, cli.manifest, args.into()).await?
        }
        Commands::Locate(flags) => commands::locate(&runtime, cli.manifest, flags.into())?,
        Commands::Verify(args) => commands::verify_file(
            &runtime,
            cli.manifest,
            &args.file,
            args.sha256,
            args.platform.into(),
        )?,
        Commands::Info => commands::info(&runtime, cli.manifest)?,
    }
    Ok(())
}

/// Exit status for a failed command: the pipeline stage's code, or 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PipelineError>()
        .and_then(|e| u8::try_from(e.exit_code()).ok())
        .unwrap_or(1)
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<PipelineError>() {
        Some(pipeline_err) => {
            eprintln!("error[{}]: {}", pipeline_err.kind(), pipeline_err);
            if let Some(hint) = pipeline_err.hint() {
                eprintln!("hint: {}", hint);
            }
        }
        None => eprintln!("error: {:#}", err),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(exit_status(&err))
        }
    }
}
