// The vcprover CLI.
// You can prove every VC in a problem file, or list the rules its theorems normalize into.

use std::time::Duration;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vcprover::problem::Problem;
use vcprover::prover::{Prover, ProverConfig};
use vcprover::theorem::RuleLibrary;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(
    name = "vcprover",
    about = "Rewrite-based proof search for verification conditions",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Try to prove every VC in a problem file
    Prove {
        /// A json file with theorems and vcs
        #[clap(value_name = "FILE")]
        file: String,

        /// The longest sequence of steps to try
        #[clap(long, value_name = "N")]
        max_depth: Option<usize>,

        /// Give up on each VC after this many seconds
        #[clap(long, value_name = "SECONDS")]
        timeout: Option<f64>,

        /// Print one json object per VC instead of the proof traces
        #[clap(long)]
        json: bool,

        /// Warn about every theorem that can't be used as a rule
        #[clap(long)]
        noisy: bool,
    },

    /// List the rules each theorem in a problem file turns into
    Rules {
        #[clap(value_name = "FILE")]
        file: String,
    },
}

fn load(file: &str) -> Problem {
    Problem::load(file).unwrap_or_else(|e| {
        println!("Error loading {}: {}", file, e);
        std::process::exit(1);
    })
}

fn main() {
    // Use RUST_LOG to control log levels, e.g.:
    //   RUST_LOG=vcprover::prover=trace vcprover prove problem.json
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Prove {
            file,
            max_depth,
            timeout,
            json,
            noisy,
        } => {
            let mut config = ProverConfig {
                noisy,
                ..ProverConfig::default()
            };
            if let Some(max_depth) = max_depth {
                config.max_depth = max_depth;
            }
            if let Some(seconds) = timeout {
                if !seconds.is_finite() || seconds < 0.0 {
                    println!("Invalid timeout: {}", seconds);
                    std::process::exit(1);
                }
                config.timeout = Some(Duration::from_secs_f64(seconds));
            }

            let problem = load(&file);
            let library = RuleLibrary::new(problem.theorems(), &config.normalizer_config());
            let mut prover = Prover::new(config, &library);
            let mut unproved = 0;
            for vc in problem.vcs() {
                let result = prover.prove(vc);
                if !result.is_proved() {
                    unproved += 1;
                }
                if json {
                    let steps = result
                        .proof
                        .as_ref()
                        .map(|proof| proof.descriptions())
                        .unwrap_or_default();
                    let line = json!({
                        "name": vc.source_name(),
                        "outcome": result.outcome,
                        "steps": steps,
                        "metrics": result.metrics,
                    });
                    println!("{}", line);
                    continue;
                }
                println!("{}: {}", vc.source_name(), result.outcome);
                if let Some(proof) = &result.proof {
                    print!("{}", proof);
                }
                println!(
                    "{} states considered, {} backtracks, {} rule tries",
                    result.metrics.proofs_considered,
                    result.metrics.backtracks,
                    result.metrics.rule_tries
                );
            }
            if !json {
                println!(
                    "{} of {} proved",
                    problem.vcs().len() - unproved,
                    problem.vcs().len()
                );
            }
            if unproved > 0 {
                std::process::exit(1);
            }
        }

        Command::Rules { file } => {
            let problem = load(&file);
            let library = RuleLibrary::new(
                problem.theorems(),
                &ProverConfig::default().normalizer_config(),
            );
            for rule in library.transformers() {
                println!("{}", rule);
            }
            for diagnostic in library.diagnostics() {
                println!("skipped: {}", diagnostic);
            }
        }
    }
}
