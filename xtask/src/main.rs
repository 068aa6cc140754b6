use std::path::PathBuf;
use std::process::{exit, Command, ExitStatus};

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the VM scaling workspace",
    long_about = "A unified CLI for running the scaling labs against AWS,\n\
                  cleaning up after interrupted runs, and CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the horizontal scaling lab
    Horizontal(LabArgs),
    /// Run the auto-scaling lab
    Autoscale(LabArgs),
    /// Remove resources left behind by an interrupted run
    Cleanup {
        /// Auto-scaling config naming the resources to look for
        #[arg(long, env = "VM_SCALING_CONFIG", default_value = "configs/auto-scaling-config.json")]
        config: PathBuf,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Args)]
struct LabArgs {
    /// Config file; defaults to the lab's file under configs/
    #[arg(long, env = "VM_SCALING_CONFIG")]
    config: Option<PathBuf>,
    /// Leave every resource running after the test
    #[arg(long)]
    keep_resources: bool,
    /// Tear down everything except the load generator
    #[arg(long)]
    keep_load_generator: bool,
    /// Directory that receives a copy of every fetched test log
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Log output format passed to the binary
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    fn as_arg(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Tests only
    Test,
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

fn run_lab(subcommand: &str, default_config: &str, args: &LabArgs) {
    let config = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_config));
    let config = config.display().to_string();
    let log_dir = args.log_dir.as_ref().map(|dir| dir.display().to_string());

    let mut cargo_args = vec![
        "run",
        "-p",
        "vm_scaling_aws",
        "--bin",
        "vm-scaling",
        "--",
        "--log-format",
        args.log_format.as_arg(),
        subcommand,
        "--config",
        config.as_str(),
    ];
    if args.keep_resources {
        cargo_args.push("--keep-resources");
    }
    if args.keep_load_generator {
        cargo_args.push("--keep-load-generator");
    }
    if let Some(dir) = log_dir.as_deref() {
        cargo_args.push("--log-dir");
        cargo_args.push(dir);
    }

    step(&format!("Run {subcommand} lab"));
    run_cargo(&cargo_args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_test() {
    step("Test vm_scaling_core");
    run_cargo(&["test", "-p", "vm_scaling_core"]);

    step("Test vm_scaling_aws");
    run_cargo(&["test", "-p", "vm_scaling_aws"]);
}

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

    ci_test();
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Horizontal(args) => {
            run_lab("horizontal", "configs/horizontal-scaling-config.json", &args);
        }
        Commands::Autoscale(args) => {
            run_lab("autoscale", "configs/auto-scaling-config.json", &args);
        }
        Commands::Cleanup { config } => {
            let config = config.display().to_string();
            step("Clean up leftover lab resources");
            run_cargo(&[
                "run",
                "-p",
                "vm_scaling_aws",
                "--bin",
                "vm-scaling",
                "--",
                "cleanup",
                "--config",
                &config,
            ]);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Test => ci_test(),
            }
            eprintln!("\nCI job passed.");
        }
    }
}
