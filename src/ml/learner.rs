// ============================================================
// Layer 5 — Burn Learner
// ============================================================
// The production implementation of the Learner trait.
//
// Key Burn insight (same split as every burn training loop):
//   - Training runs on B (an AutodiffBackend) so loss.backward()
//     has a graph to walk
//   - model.valid() returns the model on B::InnerBackend with
//     dropout disabled and no autodiff bookkeeping
//   - the validation batcher must therefore build tensors for
//     B::InnerBackend as well
//
// The optimiser consumes the model on every step:
//   model = optim.step(lr, model, grads)
//
// Reference: Burn Book §5 (Custom Training Loop),
//            Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::AdditionBatcher;
use crate::domain::{grid::TokenGrid, traits::Learner, vocab::TokenVocab};
use crate::ml::model::{answer_accuracy, predictions, AdditionNet, AdditionNetConfig};

pub struct BurnLearner<B: AutodiffBackend, O> {
    model:         AdditionNet<B>,
    optim:         O,
    lr:            f64,
    max_seq_len:   usize,
    train_batcher: AdditionBatcher<B>,
    valid_batcher: AdditionBatcher<B::InnerBackend>,
}

/// A learner for `model_cfg` optimised with Adam at a constant `lr`.
pub fn adam_learner<B: AutodiffBackend>(
    model_cfg: &AdditionNetConfig,
    lr:        f64,
    vocab:     TokenVocab,
    device:    &B::Device,
) -> BurnLearner<B, impl Optimizer<AdditionNet<B>, B>> {
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<B, AdditionNet<B>>();

    BurnLearner::new(model_cfg.init(device), optim, lr, model_cfg.max_seq_len, vocab, device)
}

impl<B, O> BurnLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<AdditionNet<B>, B>,
{
    pub fn new(
        model:       AdditionNet<B>,
        optim:       O,
        lr:          f64,
        max_seq_len: usize,
        vocab:       TokenVocab,
        device:      &B::Device,
    ) -> Self {
        Self {
            model,
            optim,
            lr,
            max_seq_len,
            train_batcher: AdditionBatcher::new(device.clone(), vocab),
            valid_batcher: AdditionBatcher::new(device.clone(), vocab),
        }
    }

    pub fn model(&self) -> &AdditionNet<B> {
        &self.model
    }

    /// Learned positions only exist up to `max_seq_len`.
    fn check_width(&self, batch: &TokenGrid) -> Result<()> {
        if self.model.position_embedding.is_some() {
            let steps = batch.cols().saturating_sub(1);
            ensure!(
                steps <= self.max_seq_len,
                "rows of {} tokens exceed the model's max_seq_len of {}",
                steps,
                self.max_seq_len
            );
        }
        Ok(())
    }
}

impl<B, O> Learner for BurnLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<AdditionNet<B>, B>,
{
    fn training_step(&mut self, batch: &TokenGrid, batch_idx: usize) -> Result<f64> {
        self.check_width(batch)?;
        let batch = self.train_batcher.batch(batch);

        let (loss, _) = self.model.forward_loss(batch);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);

        tracing::trace!("train step {} loss={:.5}", batch_idx, loss_val);
        Ok(loss_val)
    }

    fn validation_step(&mut self, batch: &TokenGrid, batch_idx: usize) -> Result<f64> {
        self.check_width(batch)?;
        let batch = self.valid_batcher.batch(batch);

        // model.valid() → AdditionNet<B::InnerBackend>, dropout disabled
        let logits = self.model.valid().forward(batch.inputs);
        let acc    = answer_accuracy(logits, batch.targets, batch.answer_mask);

        tracing::trace!("valid step {} acc={:.4}", batch_idx, acc);
        Ok(acc)
    }

    fn print_examples(&mut self, examples: &TokenGrid, vocab: &TokenVocab) -> Result<()> {
        self.check_width(examples)?;
        let batch = self.valid_batcher.batch(examples);

        let logits = self.model.valid().forward(batch.inputs);
        let preds: Vec<i64> = predictions(logits)
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("reading predictions: {e:?}"))?;

        let steps = examples.cols() - 1;
        for (r, row) in examples.iter_rows().enumerate() {
            let row_preds = &preds[r * steps..(r + 1) * steps];
            println!("{}", render_example(row, row_preds, vocab));
        }
        Ok(())
    }
}

/// `7+3=10  model: 10  ok`. The prediction at position `t` is the model's
/// guess for token `t + 1`, with the true prefix fed in (teacher forcing).
fn render_example(row: &[u32], preds: &[i64], vocab: &TokenVocab) -> String {
    let end = row.iter().position(|&t| t == vocab.end).unwrap_or(0);
    let eos = row.iter().position(|&t| t == vocab.eos).unwrap_or(row.len());

    let render = |tokens: &mut dyn Iterator<Item = u32>| -> String {
        tokens.map(|t| vocab.render(t)).collect()
    };

    let problem  = render(&mut row[..end].iter().copied());
    let expected = render(&mut row[end + 1..eos].iter().copied());
    let guessed  = render(
        &mut preds[end..eos.min(preds.len())]
            .iter()
            .map(|&p| u32::try_from(p).unwrap_or(u32::MAX))
            .take_while(|&t| t != vocab.eos),
    );

    let verdict = if guessed == expected { "ok" } else { "wrong" };
    format!("{problem}={expected}  model: {guessed}  {verdict}")
}
