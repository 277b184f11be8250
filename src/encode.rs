// src/encode.rs
//! Vocabulary encoding and fixed-length shaping of lemma sequences into the
//! classifier's input contract.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Fixed input length the classifier was trained with.
pub const SEQ_LEN: usize = 100;

/// Reserved padding id. The vocabulary artifact never assigns it to a lemma.
pub const PAD_ID: u32 = 0;

/// Fixed lemma → id mapping, established outside this service and loaded
/// once at startup. Must stay in lock-step with the model's embedding table.
#[derive(Debug)]
pub struct Vocabulary {
    ids: HashMap<String, u32>,
}

impl Vocabulary {
    /// Load the vocabulary artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read vocabulary {}", path.display()))?;
        let ids: HashMap<String, u32> = serde_json::from_str(&raw).context("parse vocabulary")?;
        Self::from_map(ids)
    }

    /// Build from an in-memory map, enforcing the reserved-pad-id invariant.
    pub fn from_map(ids: HashMap<String, u32>) -> Result<Self> {
        if let Some((lemma, _)) = ids.iter().find(|&(_, &id)| id == PAD_ID) {
            bail!("vocabulary maps lemma {lemma:?} to reserved pad id {PAD_ID}");
        }
        Ok(Self { ids })
    }

    /// Highest id in the vocabulary, for the lock-step check against the
    /// model's embedding table size.
    pub fn max_id(&self) -> u32 {
        self.ids.values().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Encode lemmas to ids in sequence order. Lemmas missing from the
    /// vocabulary are silently omitted; no out-of-vocabulary sentinel is
    /// emitted.
    pub fn encode(&self, lemmas: &[String]) -> Vec<u32> {
        lemmas
            .iter()
            .filter_map(|lemma| self.ids.get(lemma).copied())
            .collect()
    }
}

/// Shape an encoded sequence to exactly [`SEQ_LEN`] ids: overlong sequences
/// keep their last `SEQ_LEN` ids (pre-truncation), short ones are left-padded
/// with [`PAD_ID`].
pub fn shape(ids: &[u32]) -> Vec<u32> {
    if ids.len() >= SEQ_LEN {
        ids[ids.len() - SEQ_LEN..].to_vec()
    } else {
        let mut shaped = vec![PAD_ID; SEQ_LEN - ids.len()];
        shaped.extend_from_slice(ids);
        shaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::from_map(HashMap::from([
            ("дурак".to_string(), 1),
            ("убить".to_string(), 2),
            ("хороший".to_string(), 3),
        ]))
        .unwrap()
    }

    #[test]
    fn encodes_known_lemmas_in_order() {
        let ids = vocab().encode(&["хороший".into(), "дурак".into()]);
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn silently_drops_out_of_vocabulary_lemmas() {
        let ids = vocab().encode(&["дурак".into(), "неведомый".into(), "убить".into()]);
        // No sentinel id for the unknown lemma, the sequence just shortens.
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn rejects_reserved_pad_id() {
        let err = Vocabulary::from_map(HashMap::from([("дурак".to_string(), 0)]));
        assert!(err.is_err());
    }

    #[test]
    fn shape_left_pads_short_sequences() {
        let ids: Vec<u32> = (1..=30).collect();
        let shaped = shape(&ids);
        assert_eq!(shaped.len(), SEQ_LEN);
        assert!(shaped[..70].iter().all(|&id| id == PAD_ID));
        assert_eq!(&shaped[70..], &ids[..]);
    }

    #[test]
    fn shape_pre_truncates_long_sequences() {
        let ids: Vec<u32> = (1..=150).collect();
        let shaped = shape(&ids);
        assert_eq!(shaped.len(), SEQ_LEN);
        // The first 50 ids are dropped; the last 100 survive unreordered.
        assert_eq!(&shaped[..], &ids[50..]);
    }

    #[test]
    fn shape_passes_exact_length_through() {
        let ids: Vec<u32> = (1..=100).collect();
        assert_eq!(shape(&ids), ids);
    }

    #[test]
    fn shape_of_empty_sequence_is_all_padding() {
        let shaped = shape(&[]);
        assert_eq!(shaped, vec![PAD_ID; SEQ_LEN]);
    }
}
