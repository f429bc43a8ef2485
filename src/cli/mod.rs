// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   runs the addition curriculum
//   2. `sample`  prints generated problems
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, SampleArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;

#[derive(Parser, Debug)]
#[command(
    name = "digit-add",
    version = "0.1.0",
    about = "Teach a sequence model multi-digit addition, one operand length at a time."
)]
pub struct Cli {
    /// The subcommand to run (train or sample)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Sample(args) => run_sample(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;
    use crate::infra::config_file::load_config;

    let save_path = args.save_config.clone();
    let config: TrainConfig = match args.config.as_deref() {
        Some(path) => {
            tracing::info!("Loading configuration from '{}'", path);
            let mut cfg = load_config(path)?;
            cfg.cpu |= args.cpu;
            cfg
        }
        None => args.into(),
    };

    let mut use_case = TrainUseCase::new(config);
    if let Some(path) = save_path {
        use_case = use_case.with_saved_config(path);
    }
    let outcome = use_case.execute()?;

    println!(
        "Training finished at number length {}. Time to success: {:?}",
        outcome.dataset.number_length(),
        outcome.time_to_success
    );
    Ok(())
}

/// Handles the `sample` subcommand.
fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let use_case = SampleUseCase::new(args.base, args.number_length, args.seed)?;
    let vocab    = *use_case.dataset().vocab();
    println!(
        "base={} number_length={} seq={} (end={} sep={} pad={} eos={})",
        args.base,
        args.number_length,
        use_case.dataset().seq(),
        vocab.end,
        vocab.separator,
        vocab.padding,
        vocab.eos
    );

    for row in use_case.execute(args.count)? {
        let tokens: Vec<String> = row.tokens.iter().map(u32::to_string).collect();
        println!("{:<40} {}", tokens.join(" "), row.decoded);
    }
    Ok(())
}
