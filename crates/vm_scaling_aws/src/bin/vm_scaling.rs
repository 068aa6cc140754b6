use std::error::Error;
use std::path::PathBuf;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use vm_scaling_aws::adapters::load_generator::DEFAULT_REQUEST_TIMEOUT;
use vm_scaling_aws::adapters::HttpLoadGenerator;
use vm_scaling_aws::telemetry::{init_tracing, LogFormat};
use vm_scaling_aws::AwsServices;
use vm_scaling_core::autoscale::run_auto_scaling;
use vm_scaling_core::cleanup::clean_up;
use vm_scaling_core::config::{AutoScalingConfig, HorizontalConfig};
use vm_scaling_core::horizontal::{run_horizontal_scaling, RunOptions};
use vm_scaling_core::teardown::{TeardownOptions, TeardownReport};
use vm_scaling_core::ScalingError;

#[derive(Parser)]
#[command(
    name = "vm-scaling",
    about = "Provision, exercise and tear down the VM scaling labs on AWS"
)]
struct Cli {
    /// Log output format
    #[arg(
        long,
        value_enum,
        env = "VM_SCALING_LOG_FORMAT",
        default_value_t = LogFormat::Text,
        global = true
    )]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add web services behind the load generator until the RPS target is met
    Horizontal(RunArgs),
    /// Run the warm-up and auto-scaling tests against an ASG behind an ALB
    Autoscale(RunArgs),
    /// Remove resources an interrupted auto-scaling or horizontal run left behind
    Cleanup {
        /// Auto-scaling config naming the resources to look for
        #[arg(long, env = "VM_SCALING_CONFIG")]
        config: PathBuf,
        /// Overrides the region in the config file
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON config file for the exercise
    #[arg(long, env = "VM_SCALING_CONFIG")]
    config: PathBuf,
    /// Overrides the region in the config file
    #[arg(long)]
    region: Option<String>,
    /// Leave every resource running after the test
    #[arg(long)]
    keep_resources: bool,
    /// Tear down everything except the load generator
    #[arg(long)]
    keep_load_generator: bool,
    /// Directory that receives a copy of every fetched test log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl RunArgs {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            keep_resources: self.keep_resources,
            keep_load_generator: self.keep_load_generator,
            log_dir: self.log_dir.clone(),
        }
    }
}

#[derive(Serialize)]
struct RunSummary {
    command: &'static str,
    finished_at: String,
    test_ids: Vec<String>,
    load_balancer_dns: Option<String>,
    web_services: Option<usize>,
    final_rps: Option<f64>,
    teardown_steps: usize,
    teardown_failures: Vec<String>,
}

impl RunSummary {
    fn new(command: &'static str, teardown: Option<&TeardownReport>) -> Self {
        Self {
            command,
            finished_at: Utc::now().to_rfc3339(),
            test_ids: Vec::new(),
            load_balancer_dns: None,
            web_services: None,
            final_rps: None,
            teardown_steps: teardown.map_or(0, |report| report.steps.len()),
            teardown_failures: teardown
                .map(|report| {
                    report
                        .failures()
                        .map(|step| step.resource.clone())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Prints the summary and fails when teardown left anything behind.
    fn finish(self) -> Result<(), Box<dyn Error>> {
        println!("{}", serde_json::to_string_pretty(&self)?);
        if !self.teardown_failures.is_empty() {
            return Err(ScalingError::TeardownIncomplete {
                failed: self.teardown_failures.len(),
            }
            .into());
        }
        Ok(())
    }
}

async fn load_sdk_config(region: String) -> SdkConfig {
    info!(event = "aws_config_loading", region = %region);
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region))
        .load()
        .await
}

async fn aws_services(region: String) -> Result<AwsServices, Box<dyn Error>> {
    let sdk_config = load_sdk_config(region).await;
    let load_generator = HttpLoadGenerator::new(DEFAULT_REQUEST_TIMEOUT)?;
    Ok(AwsServices::new(&sdk_config, load_generator))
}

async fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Horizontal(args) => {
            let config = HorizontalConfig::load(&args.config)?;
            let aws = aws_services(args.region.clone().unwrap_or(config.region.clone())).await?;
            let report = run_horizontal_scaling(&aws.services(), &config, &args.run_options())?;
            let mut summary = RunSummary::new("horizontal", report.teardown.as_ref());
            summary.test_ids.push(report.test_id);
            summary.web_services = Some(report.web_services);
            summary.final_rps = Some(report.final_rps);
            summary.finish()
        }
        Commands::Autoscale(args) => {
            let config = AutoScalingConfig::load(&args.config)?;
            let aws = aws_services(args.region.clone().unwrap_or(config.region.clone())).await?;
            let report = run_auto_scaling(&aws.services(), &config, &args.run_options())?;
            let mut summary = RunSummary::new("autoscale", report.teardown.as_ref());
            summary.test_ids = vec![report.warmup_test_id, report.autoscaling_test_id];
            summary.load_balancer_dns = Some(report.load_balancer_dns);
            summary.finish()
        }
        Commands::Cleanup { config, region } => {
            let config = AutoScalingConfig::load(&config)?;
            let aws = aws_services(region.unwrap_or(config.region.clone())).await?;
            let options = TeardownOptions::from_timing(&config.timing, false);
            let report = clean_up(&aws.services(), &config, &options);
            RunSummary::new("cleanup", Some(&report)).finish()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    run(cli.command).await.inspect_err(|failure| {
        error!(event = "run_failed", error = %failure, "vm-scaling failed");
    })
}
