// src/model.rs
//! Candle adapter around the pre-trained recurrent classifier, plus the
//! threshold policy that turns label probabilities into a verdict.

use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{embedding, linear, lstm, Embedding, LSTMConfig, Linear, Module, VarBuilder, LSTM, RNN};
use serde::{Deserialize, Serialize};

use crate::encode::SEQ_LEN;

/// Output labels in the order the network emits them.
pub const LABELS: [&str; 4] = ["normal", "insult", "threat", "obscenity"];

/// Network dimensions, read from `model.json` next to the weights. Must
/// match both the safetensors shapes and the vocabulary ids.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDims {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
}

/// Independent per-label probabilities.
///
/// Each label carries its own sigmoid activation, so several can exceed the
/// decision threshold at once and the four values need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub normal: f32,
    pub insult: f32,
    pub threat: f32,
    pub obscenity: f32,
}

impl Prediction {
    /// Toxicity verdict: any non-`normal` probability strictly above 0.5.
    /// Exactly 0.5 does not trip the threshold, and `normal` is never
    /// consulted.
    pub fn is_toxic(&self) -> bool {
        self.insult > 0.5 || self.threat > 0.5 || self.obscenity > 0.5
    }
}

/// Immutable recurrent network: embedding → single-layer LSTM → dense(4) →
/// element-wise sigmoid. Weights are loaded once and never mutated, so the
/// model is freely shared across concurrent requests.
pub struct ToxicityModel {
    embedding: Embedding,
    lstm: LSTM,
    dense: Linear,
    device: Device,
    vocab_size: usize,
}

impl ToxicityModel {
    /// Build the network against already-loaded weights.
    pub fn new(vb: VarBuilder, dims: &ModelDims) -> Result<Self> {
        let device = vb.device().clone();
        let embedding = embedding(dims.vocab_size, dims.embed_dim, vb.pp("embedding"))
            .context("build embedding layer")?;
        let lstm = lstm(
            dims.embed_dim,
            dims.hidden_dim,
            LSTMConfig::default(),
            vb.pp("lstm"),
        )
        .context("build lstm layer")?;
        let dense =
            linear(dims.hidden_dim, LABELS.len(), vb.pp("dense")).context("build dense layer")?;
        Ok(Self {
            embedding,
            lstm,
            dense,
            device,
            vocab_size: dims.vocab_size,
        })
    }

    /// Size of the embedding table; every vocabulary id must stay below it.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Load the model artifact pair (`model.json` + `model.safetensors`)
    /// from `dir`. Any missing or corrupt file is an error; the caller
    /// treats that as fatal to startup.
    pub fn load(dir: &Path) -> Result<Self> {
        let dims_path = dir.join("model.json");
        let raw = std::fs::read_to_string(&dims_path)
            .with_context(|| format!("read model dims {}", dims_path.display()))?;
        let dims: ModelDims = serde_json::from_str(&raw).context("parse model dims")?;

        let weights_path = dir.join("model.safetensors");
        let device = Device::Cpu;
        // SAFETY: mmap'd safetensors — safe as long as the artifact is not
        // modified while the process runs; it is read-only by contract.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)
        }
        .with_context(|| format!("load model weights {}", weights_path.display()))?;
        Self::new(vb, &dims)
    }

    /// Run one shaped sequence through the network.
    ///
    /// Deterministic for fixed weights; content cannot make this fail. An
    /// all-padding input still produces a valid probability vector.
    pub fn predict(&self, shaped: &[u32]) -> Result<Prediction> {
        let input = Tensor::from_vec(shaped.to_vec(), (1, SEQ_LEN), &self.device)
            .context("build input tensor")?;
        let embedded = self.embedding.forward(&input).context("embed input")?;
        let states = self.lstm.seq(&embedded).context("run lstm")?;
        let last = match states.last() {
            Some(state) => state,
            None => bail!("lstm produced no states for a {SEQ_LEN}-step input"),
        };
        let logits = self.dense.forward(last.h()).context("project to labels")?;
        let probs = candle_nn::ops::sigmoid(&logits)
            .context("activate labels")?
            .squeeze(0)
            .context("squeeze batch dim")?
            .to_vec1::<f32>()
            .context("read probabilities")?;
        let &[normal, insult, threat, obscenity] = probs.as_slice() else {
            bail!("classifier returned {} labels, expected 4", probs.len());
        };
        Ok(Prediction {
            normal,
            insult,
            threat,
            obscenity,
        })
    }
}
