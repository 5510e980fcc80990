//! precedence CLI
//!
//! Wires configuration, logging and the seeded random culture to the
//! library's sorter and oracle.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use precedence::{
    AgentQueue, Culture, DagDistance, ExternalSolver, GroundTruthOracle, PriorityQueueSorter,
    RandomCulture, RunConfig, Strategy,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML run configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed of the run (overrides PRECEDENCE_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of agents in the queue
    #[arg(long, global = true)]
    size: Option<usize>,

    /// Per-dialogue privacy budget (overrides PRECEDENCE_BUDGET)
    #[arg(long, global = true)]
    budget: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the culture's perspective-split framework in APX form
    Split {
        /// Print the base framework instead
        #[arg(long, default_value_t = false)]
        base: bool,
    },

    /// Sort a queue of agents and print the report as JSON
    Sort {
        /// Argument-selection strategy, e.g. least-cost-private
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Include every agent's dialogue log in the output
        #[arg(long, default_value_t = false)]
        agents: bool,
    },

    /// Compute solver ground truth and compare it with dialogue outcomes
    Oracle {
        /// Solver executable (overrides PRECEDENCE_SOLVER)
        #[arg(long)]
        solver: Option<PathBuf>,

        /// Concurrent solver invocations (overrides PRECEDENCE_WORKERS)
        #[arg(long)]
        workers: Option<usize>,

        /// Strategy of the dialogues compared against the ground truth
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Extra attempts for pairs the solver failed on
        #[arg(long, default_value_t = 1)]
        retries: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    config.apply_env().context("applying PRECEDENCE_* overrides")?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(size) = args.size {
        config.queue_size = size;
    }
    if let Some(budget) = args.budget {
        config.max_privacy_budget = budget;
    }
    match &args.command {
        Command::Split { .. } => {}
        Command::Sort { strategy, .. } => {
            if let Some(strategy) = strategy {
                config.strategy = *strategy;
            }
        }
        Command::Oracle {
            solver,
            workers,
            strategy,
            ..
        } => {
            if let Some(solver) = solver {
                config.solver.path = solver.clone();
            }
            if let Some(workers) = workers {
                config.oracle.max_workers = *workers;
            }
            if let Some(strategy) = strategy {
                config.strategy = *strategy;
            }
        }
    }
    config.validate().context("invalid configuration")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let culture = RandomCulture::generate(&config.culture, &mut rng)?;
    info!(
        culture = culture.name(),
        seed = config.seed,
        arguments = culture.framework().len(),
        attacks = culture.framework().attack_count(),
        "culture ready"
    );

    match args.command {
        Command::Split { base } => {
            let apx = if base {
                culture.framework().to_apx()
            } else {
                culture.split_framework().framework().to_apx()
            };
            print!("{apx}");
        }

        Command::Sort { agents, .. } => {
            let mut queue = AgentQueue::from_culture(
                &culture,
                config.queue_size,
                config.max_privacy_budget,
                &mut rng,
            );
            let sorter = PriorityQueueSorter::new(culture.split_framework(), config.strategy)?;
            let report = sorter.sort(&mut queue, &mut rng)?;

            let output = if agents {
                json!({ "strategy": config.strategy, "sort": report, "queue": queue.report() })
            } else {
                json!({ "strategy": config.strategy, "sort": report })
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Oracle { retries, .. } => {
            let queue = AgentQueue::from_culture(
                &culture,
                config.queue_size,
                config.max_privacy_budget,
                &mut rng,
            );
            let solver = Arc::new(ExternalSolver::new(config.solver.clone()));
            let oracle =
                GroundTruthOracle::new(solver, config.solver.semantics, config.oracle.clone())?;

            let split = culture.split_framework();
            let mut truth = oracle.compute(split, queue.agents()).await;
            for _ in 0..retries {
                if truth.failures.is_empty() {
                    break;
                }
                oracle.retry_failures(split, queue.agents(), &mut truth).await;
            }

            let sorter = PriorityQueueSorter::new(split, config.strategy)?;
            let dialogue = sorter.interact_all_pairs(&mut queue.fork(), &mut rng)?;
            let distance = DagDistance::between(&truth.winners, &dialogue.matrix);

            let output = json!({
                "strategy": config.strategy,
                "complete": truth.is_complete(),
                "stats": truth.stats,
                "ground_truth": truth.records(),
                "role_dependent_pairs": truth.role_dependent_pairs(),
                "unresolved": truth
                    .failures
                    .iter()
                    .map(|(&(d, c), e)| json!({ "defender": d, "challenger": c, "error": e.to_string() }))
                    .collect::<Vec<_>>(),
                "dialogue": dialogue.matrix.records(),
                "interactions": dialogue.interactions,
                "unfair_terminations": dialogue.unfair_terminations,
                "local_unfairness_rate": dialogue.local_unfairness_rate,
                "distance": distance,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
