// src/engine.rs
//! # Rescoring Engine
//! Per-request orchestration: classify the incoming text, persist it, then
//! rescore the whole stored history through the same pipeline.
//!
//! The inference side is pure against process-wide immutable artifacts, so
//! the engine is freely shared across concurrent requests.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::encode::{shape, Vocabulary};
use crate::model::{Prediction, ToxicityModel};
use crate::morph::MorphDict;
use crate::normalize::Normalizer;
use crate::store::{Comment, CommentStore};

/// One rescored history row.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRow {
    pub comment: String,
    pub prediction: Prediction,
}

/// Outcome of a single predict request: the verdict on the incoming text
/// plus the freshly rescored corpus, keyed by row id.
#[derive(Debug)]
pub struct Outcome {
    pub prediction: Prediction,
    pub rows: BTreeMap<i64, ScoredRow>,
}

/// The text-to-verdict pipeline with its startup-loaded artifacts.
pub struct ToxicityEngine {
    normalizer: Normalizer,
    vocab: Vocabulary,
    model: ToxicityModel,
}

impl ToxicityEngine {
    pub fn new(normalizer: Normalizer, vocab: Vocabulary, model: ToxicityModel) -> Self {
        Self {
            normalizer,
            vocab,
            model,
        }
    }

    /// Load every inference artifact from `dir` and cross-check that the
    /// vocabulary fits the model's embedding table. Any failure here must
    /// keep the process from serving.
    pub fn load(dir: &Path) -> Result<Self> {
        let morph = MorphDict::load(&dir.join("lemmas.json"))?;
        let vocab = Vocabulary::load(&dir.join("vocab.json"))?;
        let model = ToxicityModel::load(dir)?;
        if vocab.max_id() as usize >= model.vocab_size() {
            bail!(
                "vocabulary id {} exceeds model vocab_size {}; artifacts are out of lock-step",
                vocab.max_id(),
                model.vocab_size()
            );
        }
        Ok(Self::new(Normalizer::new(morph), vocab, model))
    }

    /// Full pipeline for one text: normalize → encode → shape → classify.
    ///
    /// Content never fails this path; text with no usable token flows
    /// through as an all-padding sequence and still gets a prediction.
    pub fn score(&self, text: &str) -> Result<Prediction> {
        let lemmas = self.normalizer.lemmas(text);
        let ids = self.vocab.encode(&lemmas);
        let shaped = shape(&ids);
        self.model.predict(&shaped)
    }

    /// Handle one request: score the incoming text, append it to the
    /// durable log, then re-read and rescore the entire history.
    ///
    /// Every stored row is recomputed through the full pipeline on every
    /// request. The just-appended row is recomputed like the rest, never
    /// reused from the incoming score, so rescoring cost grows linearly
    /// with the stored history.
    ///
    /// A persistence failure fails the whole request; the prediction for
    /// the incoming text is not returned on its own.
    pub fn score_and_rescore(&self, store: &CommentStore, text: &str) -> Result<Outcome> {
        let prediction = self.score(text)?;

        store.append(text).context("append comment")?;
        let history = store.read_all().context("read comment history")?;

        let mut rows = BTreeMap::new();
        for Comment { id, text } in history {
            let rescored = self.score(&text)?;
            rows.insert(
                id,
                ScoredRow {
                    comment: text,
                    prediction: rescored,
                },
            );
        }

        Ok(Outcome { prediction, rows })
    }
}
