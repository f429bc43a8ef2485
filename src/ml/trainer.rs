// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop with curriculum control.
//
//   for epoch in 1..=epochs:
//       Training         train_steps × (generate batch, step)
//       Examples         print a few predictions
//       Validation       valid_steps × (generate batch, accuracy)
//       CurriculumCheck  mean accuracy > threshold → length + 1
//
// The driver owns the curriculum state: it holds the dataset by
// value and swaps in `dataset.with_number_length(n + 1)` on
// promotion, so nothing outside the loop mutates the length.
//
// No retries, no checkpoints. The first error from the learner or
// the batch generator ends the run and propagates to main.
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::collections::BTreeMap;

use anyhow::Result;
use burn::{module::Module, tensor::backend::AutodiffBackend};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::AdditionDataset;
use crate::domain::traits::Learner;
use crate::infra::progress::phase_bar;
use crate::ml::curriculum::{Curriculum, CurriculumStep};
use crate::ml::learner::adam_learner;

type GpuBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
type CpuBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Summary of one finished epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch:         usize,
    /// operand length the epoch trained and validated at
    pub number_length: usize,
    pub train_loss:    f64,
    pub valid_acc:     f64,
    pub promoted:      bool,
}

/// Everything a finished run hands back.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub reports:         Vec<EpochReport>,
    pub time_to_success: BTreeMap<usize, usize>,
    /// the dataset at the length the run ended on
    pub dataset:         AdditionDataset,
}

/// Pick the backend, build an Adam learner and run the curriculum.
pub fn run_training(cfg: &TrainConfig, dataset: AdditionDataset) -> Result<TrainingOutcome> {
    if cfg.cpu {
        let device = burn::backend::ndarray::NdArrayDevice::Cpu;
        tracing::info!("Using NdArray device: {:?}", device);
        train_on::<CpuBackend>(cfg, dataset, device)
    } else {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        train_on::<GpuBackend>(cfg, dataset, device)
    }
}

fn train_on<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    dataset: AdditionDataset,
    device:  B::Device,
) -> Result<TrainingOutcome> {

    // ── Build model + optimiser ───────────────────────────────────────────────
    let model_cfg   = cfg.model_config(dataset.vocab().size());
    let mut learner = adam_learner::<B>(&model_cfg, cfg.lr, *dataset.vocab(), &device);

    let num_params = learner.model().num_params();
    tracing::info!(
        "Model ready: kind={} layers={} hidden={} params={}",
        cfg.kind, cfg.num_layers, cfg.hidden_size, num_params
    );
    println!("The model has {num_params} parameters");

    // ── Seeded batch stream ───────────────────────────────────────────────────
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    run_curriculum(cfg, &mut learner, dataset, &mut rng)
}

pub fn run_curriculum<L, R>(
    cfg:     &TrainConfig,
    learner: &mut L,
    dataset: AdditionDataset,
    rng:     &mut R,
) -> Result<TrainingOutcome>
where
    L: Learner,
    R: Rng + ?Sized,
{
    let mut dataset    = dataset;
    let mut curriculum = Curriculum::new(cfg.threshold);
    let mut reports    = Vec::with_capacity(cfg.epochs);

    tracing::info!(
        "Curriculum start: base={} number_length={} threshold={}",
        dataset.base(),
        dataset.number_length(),
        curriculum.threshold()
    );

    for epoch in 1..=cfg.epochs {
        let number_length = dataset.number_length();

        // ── Training phase ────────────────────────────────────────────────────
        let bar = phase_bar(cfg.train_steps, format!("epoch {epoch} train"))?;
        let mut train_loss_sum = 0.0f64;
        for batch_idx in 0..cfg.train_steps {
            let batch = dataset.generate_batch(rng, cfg.batch_size)?;
            train_loss_sum += learner.training_step(&batch, batch_idx)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        let train_loss = mean(train_loss_sum, cfg.train_steps);

        if cfg.num_examples > 0 {
            let examples = dataset.generate_batch(rng, cfg.num_examples)?;
            learner.print_examples(&examples, dataset.vocab())?;
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let bar = phase_bar(cfg.valid_steps, format!("epoch {epoch} valid"))?;
        let mut valid_acc_sum = 0.0f64;
        for batch_idx in 0..cfg.valid_steps {
            let batch = dataset.generate_batch(rng, cfg.batch_size)?;
            valid_acc_sum += learner.validation_step(&batch, batch_idx)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        let valid_acc = mean(valid_acc_sum, cfg.valid_steps);

        // ── Curriculum check ──────────────────────────────────────────────────
        let step = curriculum.record_epoch(number_length, valid_acc);

        println!(
            "Epoch {:>4}/{} | len={} | train_loss={:.4} | valid_acc={:.1}%",
            epoch,
            cfg.epochs,
            number_length,
            train_loss,
            valid_acc * 100.0,
        );
        println!("Time to success: {:?}", curriculum.time_to_success());

        let promoted = match step {
            CurriculumStep::Promote { from, to, epochs } => {
                println!("Switching to number length {to} (length {from} took {epochs} epochs)");
                dataset = dataset.with_number_length(to);
                true
            }
            CurriculumStep::Stay => false,
        };

        reports.push(EpochReport { epoch, number_length, train_loss, valid_acc, promoted });
    }

    tracing::info!("Training complete at number length {}", dataset.number_length());
    Ok(TrainingOutcome {
        reports,
        time_to_success: curriculum.time_to_success().clone(),
        dataset,
    })
}

fn mean(sum: f64, n: usize) -> f64 {
    if n > 0 { sum / n as f64 } else { f64::NAN }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::bail;

    use super::*;
    use crate::domain::{grid::TokenGrid, vocab::TokenVocab};

    /// Replays a fixed accuracy per validation step and remembers the
    /// row width of every training batch it was handed.
    #[derive(Default)]
    struct ScriptedLearner {
        accuracies:   VecDeque<f64>,
        train_widths: Vec<usize>,
        examples:     usize,
        fail_after:   Option<usize>,
    }

    impl ScriptedLearner {
        fn new(accuracies: &[f64]) -> Self {
            Self { accuracies: accuracies.iter().copied().collect(), ..Default::default() }
        }
    }

    impl Learner for ScriptedLearner {
        fn training_step(&mut self, batch: &TokenGrid, _batch_idx: usize) -> Result<f64> {
            if self.fail_after == Some(self.train_widths.len()) {
                bail!("out of memory");
            }
            self.train_widths.push(batch.cols());
            Ok(1.0)
        }

        fn validation_step(&mut self, _batch: &TokenGrid, _batch_idx: usize) -> Result<f64> {
            Ok(self.accuracies.pop_front().unwrap_or(0.0))
        }

        fn print_examples(&mut self, examples: &TokenGrid, _vocab: &TokenVocab) -> Result<()> {
            self.examples += examples.rows();
            Ok(())
        }
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            train_steps:  2,
            valid_steps:  1,
            batch_size:   4,
            num_examples: 0,
            ..TrainConfig::default()
        }
    }

    fn run(cfg: &TrainConfig, learner: &mut ScriptedLearner) -> Result<TrainingOutcome> {
        let dataset = AdditionDataset::new(100, 10, 1)?;
        let mut rng = StdRng::seed_from_u64(42);
        run_curriculum(cfg, learner, dataset, &mut rng)
    }

    #[test]
    fn test_promotes_once_after_second_validation() {
        let mut learner = ScriptedLearner::new(&[0.5, 0.95]);
        let outcome     = run(&config(2), &mut learner).unwrap();

        let promoted: Vec<bool> = outcome.reports.iter().map(|r| r.promoted).collect();
        assert_eq!(promoted, vec![false, true]);
        assert_eq!(outcome.time_to_success.get(&1), Some(&2));
        assert_eq!(outcome.dataset.number_length(), 2);
    }

    #[test]
    fn test_new_length_reaches_the_batches() {
        let mut learner = ScriptedLearner::new(&[0.95, 0.0]);
        let outcome     = run(&config(2), &mut learner).unwrap();

        // length 1 rows are 7 wide, length 2 rows are 10 wide
        assert_eq!(learner.train_widths, vec![7, 7, 10, 10]);
        assert_eq!(outcome.reports[1].number_length, 2);
    }

    #[test]
    fn test_ratchet_never_moves_back() {
        let mut learner = ScriptedLearner::new(&[0.95, 0.1, 0.1, 0.99]);
        let outcome     = run(&config(4), &mut learner).unwrap();

        let lengths: Vec<usize> = outcome.reports.iter().map(|r| r.number_length).collect();
        assert_eq!(lengths, vec![1, 2, 2, 2]);
        assert_eq!(outcome.dataset.number_length(), 3);

        let table: Vec<(usize, usize)> = outcome.time_to_success.into_iter().collect();
        assert_eq!(table, vec![(1, 1), (2, 3)]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut learner = ScriptedLearner::new(&[0.9]);
        let outcome     = run(&config(1), &mut learner).unwrap();
        assert!(!outcome.reports[0].promoted);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let cfg = TrainConfig { threshold: 0.4, ..config(1) };
        let mut learner = ScriptedLearner::new(&[0.5]);
        let outcome     = run(&cfg, &mut learner).unwrap();
        assert!(outcome.reports[0].promoted);
    }

    #[test]
    fn test_validation_accuracy_is_averaged() {
        let cfg = TrainConfig { valid_steps: 2, ..config(1) };
        let mut learner = ScriptedLearner::new(&[1.0, 0.7]);
        let outcome     = run(&cfg, &mut learner).unwrap();
        assert!((outcome.reports[0].valid_acc - 0.85).abs() < 1e-12);
        assert!(!outcome.reports[0].promoted);
    }

    #[test]
    fn test_examples_are_printed_each_epoch() {
        let cfg = TrainConfig { num_examples: 3, ..config(2) };
        let mut learner = ScriptedLearner::new(&[0.0, 0.0]);
        run(&cfg, &mut learner).unwrap();
        assert_eq!(learner.examples, 6);
    }

    #[test]
    fn test_run_training_on_cpu() {
        let cfg = TrainConfig {
            cpu:          true,
            hidden_size:  8,
            num_layers:   1,
            num_examples: 1,
            ..config(2)
        };
        let dataset = AdditionDataset::new(100, 10, 1).unwrap();
        let outcome = run_training(&cfg, dataset).unwrap();

        assert_eq!(outcome.reports.len(), 2);
        assert!(outcome.reports.iter().all(|r| r.train_loss.is_finite()));
        assert_eq!(outcome.time_to_success.values().sum::<usize>(), 2);
    }

    #[test]
    fn test_learner_errors_end_the_run() {
        let mut learner = ScriptedLearner { fail_after: Some(3), ..ScriptedLearner::new(&[0.0; 4]) };
        let err = run(&config(4), &mut learner).unwrap_err();
        assert!(err.to_string().contains("out of memory"));
        assert_eq!(learner.train_widths.len(), 3);
    }
}
