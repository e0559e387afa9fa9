//! `dp`: resolve experiment configurations, prepare hyperparameter sweeps
//! and report on their trials.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dp_config::{ConfigResolver, ResolvedConfig};
use dp_optimizer::{prepare_trials, rank_experiments, scan_experiments, SweepConfig, SweepSpace};
use dp_targets::Target;
use dp_types::{DpError, ExecutionContext, StaticRank};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dp")]
#[command(version)]
#[command(about = "Disruption-prediction experiment toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an experiment file and print the derived configuration
    Resolve {
        /// Experiment configuration (YAML)
        conf: PathBuf,

        /// Resolve paths for this user instead of the login user
        #[arg(long)]
        user: Option<String>,

        /// Print the full resolved configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Prepare numbered trial directories for a hyperparameter sweep
    Sweep {
        /// Base experiment configuration (YAML)
        conf: PathBuf,

        /// Sweep space (YAML list of hyperparameters)
        space: PathBuf,

        /// Sweep root; trials are created as <out>/<n>/
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Number of trials to prepare
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Validate the base configuration for this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Scan a sweep root and report trials, best first
    Experiments {
        /// Sweep root directory
        dir: PathBuf,

        /// Only report the best K trials
        #[arg(long, value_name = "K")]
        top: Option<usize>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = StaticRank::from_env();
    ctx.barrier();

    match run(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DpError>() {
                // The resolver has already reported these through the context.
                Some(dp) if dp.is_fatal_config() => {}
                _ => error!("{:#}", e),
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli, ctx: &dyn ExecutionContext) -> Result<()> {
    match cli.command {
        Command::Resolve { conf, user, json } => {
            let resolved = resolve(ctx, &conf, user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                print!("{}", describe(&resolved));
            }
        }
        Command::Sweep {
            conf,
            space,
            out,
            trials,
            seed,
            user,
        } => {
            let base = dp_config::load_tree(&conf)?;
            // Fail before creating any trial if the base file cannot resolve.
            resolver(ctx, user).resolve_tree(&base)?;

            let space = SweepSpace::load(&space)?;
            let mut config = SweepConfig::new(out, trials);
            config.seed = seed;
            let run = prepare_trials(&base, &space, &config)?;
            if ctx.is_coordinator() {
                for trial in &run.trials {
                    println!("{}", trial.path.display());
                }
            }
            info!("sweep {} prepared {} trials", run.id, run.trials.len());
        }
        Command::Experiments { dir, top } => {
            let mut experiments = scan_experiments(&dir)
                .with_context(|| format!("failed to scan sweep root {}", dir.display()))?;
            rank_experiments(&mut experiments);
            let shown = top.unwrap_or(experiments.len()).min(experiments.len());
            for exp in &experiments[..shown] {
                println!("{}", exp.summary());
            }
            if let Some(best) = experiments.first().filter(|e| e.best().is_some()) {
                print!("{best}");
            }
        }
    }
    Ok(())
}

fn resolver(ctx: &dyn ExecutionContext, user: Option<String>) -> ConfigResolver<'_> {
    match user {
        Some(user) => ConfigResolver::new(ctx).with_user_name(user),
        None => ConfigResolver::new(ctx),
    }
}

fn resolve(ctx: &dyn ExecutionContext, conf: &Path, user: Option<String>) -> Result<ResolvedConfig> {
    let tree = dp_config::load_tree(conf)?;
    Ok(resolver(ctx, user).resolve_tree(&tree)?)
}

fn describe_target(target: Target, t_warning: f64) -> String {
    let thresholds = target.threshold_range(t_warning);
    format!(
        "{} (activation {:?}, loss {}, {} thresholds)",
        target,
        target.activation(),
        target.loss(),
        thresholds.len()
    )
}

fn describe(resolved: &ResolvedConfig) -> String {
    let paths = &resolved.paths;
    let mut s = String::new();
    s.push_str(&format!("user: {}\n", resolved.user_name));
    s.push_str(&format!("dataset: {}\n", resolved.dataset));
    s.push_str(&format!("target: {}\n", describe_target(resolved.target, resolved.t_warning())));
    s.push_str(&format!("signal group hash: {}\n", resolved.signal_group_hash));
    s.push_str(&format!("output_path: {}\n", paths.output_path));
    s.push_str(&format!("normalizer_path: {}\n", paths.normalizer_path));
    s.push_str(&format!("model_save_path: {}\n", paths.model_save_path));
    s.push_str(&format!("processed_prepath: {}\n", paths.processed_prepath));
    s.push_str(&format!("saved_shotlist_path: {}\n", paths.saved_shotlist_path));
    s.push_str(&format!("signals ({}):\n", paths.use_signals.len()));
    for signal in &paths.use_signals {
        s.push_str(&format!("  {signal}\n"));
    }
    let machines: Vec<&str> = paths.all_machines.iter().map(|m| m.name()).collect();
    s.push_str(&format!("machines: {}\n", machines.join(", ")));
    s
}
