// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one curriculum training run:
//
//   Step 1: Validate the configuration
//   Step 2: Optionally save it as JSON       (Layer 6 - infra)
//   Step 3: Build the addition dataset       (Layer 4 - data)
//   Step 4: Run the curriculum loop          (Layer 5 - ml)
//
// Reference: Rust Book §9 (Error Handling)
//            Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::AdditionDataset;
use crate::infra::config_file::save_config;
use crate::ml::{
    curriculum::DEFAULT_THRESHOLD,
    model::{AdditionNetConfig, ModelKind},
    trainer::{run_training, TrainingOutcome},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// #[serde(default)] lets a JSON file name only the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs:                usize,
    pub lr:                    f64,
    pub dropout:               f64,
    pub hidden_size:           usize,
    pub num_layers:            usize,
    pub num_heads:             usize,
    pub kind:                  ModelKind,
    pub norm_first:            bool,
    pub batch_size:            usize,
    pub num_examples:          usize,
    pub base:                  u32,
    pub initial_number_length: usize,
    pub num_samples:           usize,
    pub train_steps:           usize,
    pub valid_steps:           usize,
    pub threshold:             f64,
    pub seed:                  u64,
    pub max_seq_len:           usize,
    pub cpu:                   bool,
    pub tag:                   String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs:                1000,
            lr:                    1e-3,
            dropout:               0.0,
            hidden_size:           32,
            num_layers:            4,
            num_heads:             1,
            kind:                  ModelKind::Lstm,
            norm_first:            true,
            batch_size:            256,
            num_examples:          3,
            base:                  10,
            initial_number_length: 1,
            num_samples:           1_000_000,
            train_steps:           1000,
            valid_steps:           100,
            threshold:             DEFAULT_THRESHOLD,
            seed:                  42,
            max_seq_len:           256,
            cpu:                   false,
            tag:                   String::new(),
        }
    }
}

impl TrainConfig {
    /// Reject configurations that would fail deep inside the run.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.base >= 2, "base must be at least 2, got {}", self.base);
        ensure!(self.initial_number_length >= 1, "initial_number_length must be at least 1");
        ensure!(self.epochs >= 1, "epochs must be at least 1");
        ensure!(self.batch_size >= 1, "batch_size must be at least 1");
        ensure!(self.train_steps >= 1, "train_steps must be at least 1");
        ensure!(self.valid_steps >= 1, "valid_steps must be at least 1");
        ensure!(self.lr.is_finite() && self.lr > 0.0, "lr must be positive, got {}", self.lr);
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must be in [0, 1), got {}",
            self.dropout
        );
        ensure!(
            (0.0..=1.0).contains(&self.threshold),
            "threshold must be in [0, 1], got {}",
            self.threshold
        );
        ensure!(self.hidden_size >= 1 && self.num_layers >= 1, "model needs at least one layer and unit");

        if self.kind != ModelKind::Lstm {
            ensure!(self.num_heads >= 1, "num_heads must be at least 1");
            if self.hidden_size % self.num_heads != 0 {
                bail!(
                    "hidden_size ({}) must be divisible by num_heads ({})",
                    self.hidden_size,
                    self.num_heads
                );
            }
        }

        if self.kind == ModelKind::Transformer {
            let ds    = AdditionDataset::new(self.num_samples, self.base, self.initial_number_length)?;
            let steps = ds.seq() - 1;
            ensure!(
                steps <= self.max_seq_len,
                "max_seq_len ({}) is shorter than the first curriculum rows ({} tokens)",
                self.max_seq_len,
                steps
            );
        }

        if self.threshold >= 1.0 {
            tracing::warn!("threshold {} can never be exceeded; the curriculum will not advance", self.threshold);
        }
        Ok(())
    }

    /// Architecture for a vocabulary of `vocab_size` tokens.
    pub fn model_config(&self, vocab_size: usize) -> AdditionNetConfig {
        AdditionNetConfig::new(
            vocab_size,
            self.max_seq_len,
            self.kind,
            self.hidden_size,
            self.num_layers,
            self.num_heads,
        )
        .with_dropout(self.dropout)
        .with_norm_first(self.norm_first)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config:      TrainConfig,
    save_config: Option<PathBuf>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, save_config: None }
    }

    /// Also write the effective configuration to `path` before training.
    pub fn with_saved_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_config = Some(path.into());
        self
    }

    /// Execute the full training run end to end
    pub fn execute(&self) -> Result<TrainingOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        tracing::info!("Effective config: {}", serde_json::to_string(cfg)?);
        if !cfg.tag.is_empty() {
            tracing::info!("Run tag: {}", cfg.tag);
        }

        // ── Step 2: Save config ───────────────────────────────────────────────
        if let Some(path) = &self.save_config {
            save_config(path, cfg)?;
            tracing::info!("Config written to '{}'", path.display());
        }

        // ── Step 3: Build the dataset ─────────────────────────────────────────
        let dataset = AdditionDataset::new(cfg.num_samples, cfg.base, cfg.initial_number_length)?;
        tracing::info!(
            "Dataset: base={} number_length={} seq={} vocab={} nominal_size={}",
            dataset.base(),
            dataset.number_length(),
            dataset.seq(),
            dataset.vocab().size(),
            dataset.len()
        );

        // ── Step 4: Run the curriculum (Layer 5) ──────────────────────────────
        run_training(cfg, dataset)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        TrainConfig::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            TrainConfig { base: 1, ..TrainConfig::default() },
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { valid_steps: 0, ..TrainConfig::default() },
            TrainConfig { lr: 0.0, ..TrainConfig::default() },
            TrainConfig { dropout: 1.0, ..TrainConfig::default() },
            TrainConfig { threshold: 1.5, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn test_heads_must_divide_hidden_size() {
        let cfg = TrainConfig {
            kind: ModelKind::Transformer,
            hidden_size: 30,
            num_heads: 4,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());

        // heads are irrelevant for a pure LSTM
        let cfg = TrainConfig { kind: ModelKind::Lstm, ..cfg };
        cfg.validate().unwrap();
    }

    #[test]
    fn test_transformer_needs_room_for_positions() {
        let cfg = TrainConfig {
            kind: ModelKind::Transformer,
            max_seq_len: 4,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_model_config_carries_hyperparameters() {
        let cfg = TrainConfig { dropout: 0.25, norm_first: false, ..TrainConfig::default() };
        let m   = cfg.model_config(14);
        assert_eq!(m.vocab_size, 14);
        assert_eq!(m.hidden_size, cfg.hidden_size);
        assert_eq!(m.dropout, 0.25);
        assert!(!m.norm_first);
    }
}
