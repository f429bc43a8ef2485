use std::{fmt, str::FromStr};

use anyhow::bail;
use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::{gelu, log_softmax},
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::AdditionBatch;

/// Which sequence mixer the network stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `num_layers` residual LSTM layers
    Lstm,
    /// learned positions + `num_layers` causal attention blocks
    Transformer,
    /// one LSTM layer feeding `num_layers` causal attention blocks
    Hybrid,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lstm"        => Ok(Self::Lstm),
            "transformer" => Ok(Self::Transformer),
            "hybrid"      => Ok(Self::Hybrid),
            other => bail!("unknown model kind '{other}' (expected lstm, transformer or hybrid)"),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lstm        => "lstm",
            Self::Transformer => "transformer",
            Self::Hybrid      => "hybrid",
        };
        f.write_str(name)
    }
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, so do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct AdditionNetConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub kind:        ModelKind,
    pub hidden_size: usize,
    pub num_layers:  usize,
    pub num_heads:   usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
    #[config(default = true)]
    pub norm_first:  bool,
}

impl AdditionNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AdditionNet<B> {
        let (lstm_layers, attn_layers) = match self.kind {
            ModelKind::Lstm        => (self.num_layers, 0),
            ModelKind::Transformer => (0, self.num_layers),
            ModelKind::Hybrid      => (1, self.num_layers),
        };

        // LSTMs carry order themselves; only the pure transformer needs positions.
        let position_embedding = (self.kind == ModelKind::Transformer)
            .then(|| EmbeddingConfig::new(self.max_seq_len, self.hidden_size).init(device));

        let recurrent = (0..lstm_layers)
            .map(|_| LstmConfig::new(self.hidden_size, self.hidden_size, true).init(device))
            .collect();
        let blocks = (0..attn_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();

        AdditionNet {
            token_embedding: EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embedding,
            recurrent,
            blocks,
            final_norm: LayerNormConfig::new(self.hidden_size).init(device),
            head:       LinearConfig::new(self.hidden_size, self.vocab_size).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let d_ff = 4 * self.hidden_size;
        DecoderBlock {
            self_attn: MultiHeadAttentionConfig::new(self.hidden_size, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            ffn_linear1: LinearConfig::new(self.hidden_size, d_ff).init(device),
            ffn_linear2: LinearConfig::new(d_ff, self.hidden_size).init(device),
            norm1:       LayerNormConfig::new(self.hidden_size).init(device),
            norm2:       LayerNormConfig::new(self.hidden_size).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
            norm_first:  self.norm_first,
        }
    }
}

/// Causal self-attention + GELU feed-forward, pre- or post-norm.
#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
    pub norm_first:  bool,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, causal_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        if self.norm_first {
            let h = self.norm1.forward(x.clone());
            let x = x + self.dropout.forward(self.attend(h, causal_mask));
            let h = self.norm2.forward(x.clone());
            x + self.dropout.forward(self.feed_forward(h))
        } else {
            let x = self.norm1.forward(x.clone() + self.dropout.forward(self.attend(x, causal_mask)));
            self.norm2.forward(x.clone() + self.dropout.forward(self.feed_forward(x)))
        }
    }

    fn attend(&self, x: Tensor<B, 3>, causal_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        self.self_attn
            .forward(MhaInput::self_attn(x).mask_attn(causal_mask))
            .context
    }

    fn feed_forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x)))
    }
}

/// Next-token model over the addition vocabulary.
#[derive(Module, Debug)]
pub struct AdditionNet<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Option<Embedding<B>>,
    pub recurrent:          Vec<Lstm<B>>,
    pub blocks:             Vec<DecoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub head:               Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> AdditionNet<B> {
    /// inputs: [batch, seq] → logits: [batch, seq, vocab]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = inputs.dims();
        let device = inputs.device();

        let mut x = self.token_embedding.forward(inputs);
        if let Some(position_embedding) = &self.position_embedding {
            let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
                .unsqueeze::<2>()
                .expand([batch_size, seq_len]);
            x = x + position_embedding.forward(positions);
        }
        let mut x = self.dropout.forward(x);

        for lstm in &self.recurrent {
            let (out, _state) = lstm.forward(x.clone(), None);
            x = x + self.dropout.forward(out);
        }

        if !self.blocks.is_empty() {
            let mask = generate_autoregressive_mask::<B>(batch_size, seq_len, &device);
            for block in &self.blocks {
                x = block.forward(x, mask.clone());
            }
        }

        self.head.forward(self.final_norm.forward(x))
    }

    /// Forward pass plus the loss over the answer region.
    pub fn forward_loss(&self, batch: AdditionBatch<B>) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(batch.inputs);
        let loss   = masked_cross_entropy(logits.clone(), batch.targets, batch.answer_mask);
        (loss, logits)
    }
}

/// Mean negative log-likelihood of `targets` over positions where `mask == 1`.
pub fn masked_cross_entropy<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    mask:    Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    let [batch_size, seq_len, _] = logits.dims();

    let log_probs = log_softmax(logits, 2);
    let picked = log_probs
        .gather(2, targets.reshape([batch_size, seq_len, 1]))
        .reshape([batch_size, seq_len]);

    let mask  = mask.float();
    let count = mask.clone().sum().clamp_min(1.0);
    (picked * mask).sum().neg() / count
}

/// Greedy next-token choice at every position: [batch, seq].
pub fn predictions<B: Backend>(logits: Tensor<B, 3>) -> Tensor<B, 2, Int> {
    let [batch_size, seq_len, _] = logits.dims();
    logits.argmax(2).reshape([batch_size, seq_len])
}

/// Fraction of rows whose every masked position is predicted exactly.
pub fn answer_accuracy<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    mask:    Tensor<B, 2, Int>,
) -> f64 {
    let [batch_size, _, _] = logits.dims();
    if batch_size == 0 {
        return 0.0;
    }

    let wrong = predictions(logits).not_equal(targets).int() * mask;
    let solved: f64 = wrong
        .sum_dim(1)
        .equal_elem(0)
        .int()
        .sum()
        .into_scalar()
        .elem::<f64>();
    solved / batch_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn tiny(kind: ModelKind) -> AdditionNetConfig {
        AdditionNetConfig::new(14, 32, kind, 16, 2, 2)
    }

    #[test]
    fn test_forward_shapes_for_every_kind() {
        let device = Default::default();
        for kind in [ModelKind::Lstm, ModelKind::Transformer, ModelKind::Hybrid] {
            let model: AdditionNet<TestBackend> = tiny(kind).init(&device);
            let inputs = Tensor::<TestBackend, 2, Int>::zeros([3, 9], &device);
            assert_eq!(model.forward(inputs).dims(), [3, 9, 14], "kind={kind}");
        }
    }

    #[test]
    fn test_kind_layout() {
        let device = Default::default();
        let lstm: AdditionNet<TestBackend> = tiny(ModelKind::Lstm).init(&device);
        assert_eq!((lstm.recurrent.len(), lstm.blocks.len()), (2, 0));
        assert!(lstm.position_embedding.is_none());

        let tf: AdditionNet<TestBackend> = tiny(ModelKind::Transformer).init(&device);
        assert_eq!((tf.recurrent.len(), tf.blocks.len()), (0, 2));
        assert!(tf.position_embedding.is_some());

        let hy: AdditionNet<TestBackend> = tiny(ModelKind::Hybrid).init(&device);
        assert_eq!((hy.recurrent.len(), hy.blocks.len()), (1, 2));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("LSTM".parse::<ModelKind>().unwrap(), ModelKind::Lstm);
        assert_eq!("hybrid".parse::<ModelKind>().unwrap(), ModelKind::Hybrid);
        assert!("gru".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Transformer.to_string(), "transformer");
    }

    #[test]
    fn test_masked_cross_entropy_ignores_unmasked_positions() {
        let device = Default::default();
        // Position 0 is confidently right, position 1 confidently wrong.
        let logits = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![10.0f32, -10.0, -10.0, 10.0], [1, 2, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 2, Int>::from_ints([[0, 0]], &device);

        let only_right = Tensor::<TestBackend, 2, Int>::from_ints([[1, 0]], &device);
        let loss: f64 = masked_cross_entropy(logits.clone(), targets.clone(), only_right)
            .into_scalar()
            .elem::<f64>();
        assert!(loss < 1e-3, "loss={loss}");

        let only_wrong = Tensor::<TestBackend, 2, Int>::from_ints([[0, 1]], &device);
        let loss: f64 = masked_cross_entropy(logits, targets, only_wrong)
            .into_scalar()
            .elem::<f64>();
        assert!(loss > 10.0, "loss={loss}");
    }

    #[test]
    fn test_answer_accuracy_is_per_row() {
        let device = Default::default();
        // argmax per position: row 0 → [0, 1], row 1 → [1, 1]
        let logits = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![5.0f32, 0.0, 0.0, 5.0, 0.0, 5.0, 0.0, 5.0], [2, 2, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 2, Int>::from_ints([[0, 1], [0, 1]], &device);
        let mask    = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1], [1, 1]], &device);
        assert_eq!(answer_accuracy(logits.clone(), targets.clone(), mask), 0.5);

        // row 1 only misses an unmasked position
        let mask = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1], [0, 1]], &device);
        assert_eq!(answer_accuracy(logits, targets, mask), 1.0);
    }
}
