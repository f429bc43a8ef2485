// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `sample`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, ModelKind via FromStr)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ModelKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model on an addition curriculum of growing operand length
    Train(TrainArgs),

    /// Print generated addition problems
    Sample(SampleArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Maximum number of epochs
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout probability between layers
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Width of the embeddings and of every hidden layer
    #[arg(long, default_value_t = 32)]
    pub hidden_size: usize,

    /// Number of stacked LSTM layers or attention blocks
    #[arg(long, default_value_t = 4)]
    pub num_layers: usize,

    /// Problems per training / validation step
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    /// Predictions printed after each training phase
    #[arg(long, default_value_t = 3)]
    pub num_examples: usize,

    /// Sequence model: lstm, transformer or hybrid
    #[arg(long, default_value_t = ModelKind::Lstm)]
    pub kind: ModelKind,

    /// Attention heads; hidden_size must be divisible by this
    #[arg(long, default_value_t = 1)]
    pub num_heads: usize,

    /// Use post-norm attention blocks instead of pre-norm
    #[arg(long)]
    pub norm_last: bool,

    /// Number base of the problems
    #[arg(long, default_value_t = 10)]
    pub base: u32,

    /// Operand length the curriculum starts at
    #[arg(long, default_value_t = 1)]
    pub initial_number_length: usize,

    /// Longest row the learned position table covers (transformer only)
    #[arg(long, default_value_t = 256)]
    pub max_seq_len: usize,

    /// Training batches per epoch
    #[arg(long, default_value_t = 1000)]
    pub train_steps: usize,

    /// Validation batches per epoch
    #[arg(long, default_value_t = 100)]
    pub valid_steps: usize,

    /// Mean validation accuracy an epoch must exceed to lengthen operands
    #[arg(long, default_value_t = 0.9)]
    pub threshold: f64,

    /// Seed for the problem generator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Train on the CPU (ndarray) instead of the GPU (wgpu)
    #[arg(long)]
    pub cpu: bool,

    /// Free-form label for the run, echoed in the logs
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Read the whole configuration from this JSON file instead of the flags
    #[arg(long)]
    pub config: Option<String>,

    /// Write the effective configuration to this JSON file
    #[arg(long)]
    pub save_config: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            epochs:                a.epochs,
            lr:                    a.lr,
            dropout:               a.dropout,
            hidden_size:           a.hidden_size,
            num_layers:            a.num_layers,
            num_heads:             a.num_heads,
            kind:                  a.kind,
            norm_first:            !a.norm_last,
            batch_size:            a.batch_size,
            num_examples:          a.num_examples,
            base:                  a.base,
            initial_number_length: a.initial_number_length,
            max_seq_len:           a.max_seq_len,
            train_steps:           a.train_steps,
            valid_steps:           a.valid_steps,
            threshold:             a.threshold,
            seed:                  a.seed,
            cpu:                   a.cpu,
            tag:                   a.tag,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `sample` command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Number base of the problems
    #[arg(long, default_value_t = 10)]
    pub base: u32,

    /// Maximum digits per operand
    #[arg(long, default_value_t = 3)]
    pub number_length: usize,

    /// How many problems to print
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// Seed for the problem generator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_args(argv: &[&str]) -> TrainArgs {
        let mut full = vec!["digit-add", "train"];
        full.extend_from_slice(argv);
        let cli = Cli::try_parse_from(full).unwrap();
        match cli.command {
            Commands::Train(args) => args,
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_flag_defaults_match_config_defaults() {
        let from_flags = TrainConfig::from(train_args(&[]));
        let defaults   = TrainConfig::default();
        assert_eq!(
            serde_json::to_value(&from_flags).unwrap(),
            serde_json::to_value(&defaults).unwrap()
        );
    }

    #[test]
    fn test_flags_reach_the_config() {
        let cfg = TrainConfig::from(train_args(&[
            "--kind", "transformer",
            "--num-heads", "4",
            "--base", "16",
            "--threshold", "0.75",
            "--norm-last",
            "--cpu",
        ]));
        assert_eq!(cfg.kind, ModelKind::Transformer);
        assert_eq!(cfg.num_heads, 4);
        assert_eq!(cfg.base, 16);
        assert_eq!(cfg.threshold, 0.75);
        assert!(!cfg.norm_first);
        assert!(cfg.cpu);
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let res = Cli::try_parse_from(["digit-add", "train", "--kind", "gru"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_sample_args() {
        let cli = Cli::try_parse_from(["digit-add", "sample", "--base", "2", "--count", "3"]).unwrap();
        match cli.command {
            Commands::Sample(a) => {
                assert_eq!(a.base, 2);
                assert_eq!(a.count, 3);
                assert_eq!(a.number_length, 3);
            }
            other => panic!("expected sample, got {other:?}"),
        }
    }
}
