//! Autonomous task-execution loop CLI.
//!
//! `taskloop run "<task>"` discovers the project structure, asks the model
//! for a plan, then executes each step through the bounded conversation loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use taskloop::exit_codes;
use taskloop::io::config::{LoopConfig, load_config, write_config};
use taskloop::io::discovery::discover_project_structure;
use taskloop::io::gateway::HttpGateway;
use taskloop::io::tools::ToolRegistry;
use taskloop::logging;
use taskloop::planner::{LlmPlanner, Planner};
use taskloop::step::StepConfig;
use taskloop::task::{PlanningFailedError, StepFailedError, run_task};

#[derive(Parser)]
#[command(
    name = "taskloop",
    version,
    about = "Autonomous task-execution loop against a local chat model"
)]
struct Cli {
    /// Path to the config file.
    #[arg(long, default_value = "taskloop.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `taskloop.toml` if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the plan for a task without executing it.
    Plan {
        /// Natural-language task description.
        task: String,
    },
    /// Plan and execute a task to completion.
    Run {
        /// Natural-language task description.
        task: String,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Plan { task } => cmd_plan(&cli.config, &task),
        Command::Run { task } => cmd_run(&cli.config, &task),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if config_path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", config_path.display());
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &LoopConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_plan(config_path: &Path, task: &str) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let workdir = std::env::current_dir().context("resolve working directory")?;
    let gateway = gateway_from_config(&cfg)?;
    let structure = discover_project_structure(&workdir, cfg.discovery_max_depth)?;

    let plan = LlmPlanner::new(&gateway).plan(task, &structure)?;
    if plan.is_empty() {
        eprintln!("planning failed: the model returned no steps");
        return Ok(exit_codes::PLAN_FAILED);
    }
    print_plan(&plan);
    Ok(exit_codes::OK)
}

fn cmd_run(config_path: &Path, task: &str) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let workdir = std::env::current_dir().context("resolve working directory")?;
    let gateway = gateway_from_config(&cfg)?;
    let registry = ToolRegistry::builtin(
        &workdir,
        Duration::from_secs(cfg.shell_timeout_secs),
        cfg.shell_output_limit_bytes,
    );
    let structure = discover_project_structure(&workdir, cfg.discovery_max_depth)?;
    let planner = LlmPlanner::new(&gateway);
    let step_config = StepConfig {
        max_retries: cfg.max_retries,
    };

    let outcome = run_task(
        &gateway,
        &planner,
        &registry,
        task,
        &structure,
        &step_config,
        print_plan,
        |report| {
            println!(
                "step {}/{} complete: {}",
                report.index + 1,
                report.total,
                report.step
            );
        },
    );

    match outcome {
        Ok(outcome) => {
            println!("\nAll steps executed successfully.");
            println!("Final step result: {}", outcome.final_result);
            Ok(exit_codes::OK)
        }
        Err(err) => {
            if err.downcast_ref::<PlanningFailedError>().is_some() {
                eprintln!("planning failed: the model returned no steps");
                return Ok(exit_codes::PLAN_FAILED);
            }
            if let Some(failed) = err.downcast_ref::<StepFailedError>() {
                eprintln!("{failed}");
                eprintln!("task aborted");
                return Ok(exit_codes::STEP_FAILED);
            }
            Err(err)
        }
    }
}

fn gateway_from_config(cfg: &LoopConfig) -> Result<HttpGateway> {
    HttpGateway::new(
        &cfg.model.base_url,
        &cfg.model.name,
        Duration::from_secs(cfg.model.request_timeout_secs),
    )
}

fn print_plan(plan: &[String]) {
    println!("Plan:");
    for (index, step) in plan.iter().enumerate() {
        println!("{}. {step}", index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["taskloop", "run", "count the files"]);
        assert!(matches!(cli.command, Command::Run { task } if task == "count the files"));
        assert_eq!(cli.config, PathBuf::from("taskloop.toml"));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["taskloop", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_custom_config_path() {
        let cli = Cli::parse_from(["taskloop", "--config", "other.toml", "plan", "task"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
