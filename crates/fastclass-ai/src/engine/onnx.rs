//! ONNX Runtime engine for sequence-classification models.
//!
//! A model directory must contain `model.onnx` (token ids in, one logit per
//! label out), `tokenizer.json`, and `labels.txt` with one label per line in
//! logit order. Labels may be dot-separated taxonomy paths
//! (`travel.cancel.refund`) for hierarchical prediction.

use std::path::Path;

use fastclass_core::{Query, RawResultBuffer};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{info, warn};

use super::scoring::{fill, softmax, top_k, walk_taxonomy};
use super::{EngineStatus, InferenceEngine};

/// Token limit applied at tokenization.
const MAX_TOKENS: usize = 256;

/// A loaded classifier: session, tokenizer and the label for each logit.
pub struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

impl OnnxModel {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Class probabilities for one query, in label order.
    fn probabilities(&self, query: &Query) -> anyhow::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(query.as_str(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encoding.get_ids().len();
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let shape = [1i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Logits: [1, num_labels].
        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            logits.len() == self.labels.len(),
            "unexpected output shape: {dims:?}, expected [1, {}]",
            self.labels.len()
        );

        Ok(softmax(logits))
    }
}

/// [`InferenceEngine`] running classifiers under ONNX Runtime.
#[derive(Default)]
pub struct OnnxEngine;

impl OnnxEngine {
    pub fn new() -> Self {
        Self
    }

    fn scored(model: &OnnxModel, query: &Query) -> Option<Vec<f32>> {
        match model.probabilities(query) {
            Ok(probs) => Some(probs),
            Err(e) => {
                warn!(error = %e, "onnx inference failed");
                None
            }
        }
    }
}

impl InferenceEngine for OnnxEngine {
    type Model = OnnxModel;

    fn load_model(&self, name: &str, model_dir: &Path) -> anyhow::Result<OnnxModel> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let labels_path = model_dir.join("labels.txt");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(labels_path.exists(), "labels.txt not found in {model_dir:?}");

        let labels: Vec<String> = std::fs::read_to_string(&labels_path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        anyhow::ensure!(!labels.is_empty(), "labels.txt is empty in {model_dir:?}");

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        info!(
            model = name,
            labels = labels.len(),
            path = %model_path.display(),
            "loaded classification model"
        );
        Ok(OnnxModel {
            session: Mutex::new(session),
            tokenizer,
            labels,
        })
    }

    fn predict(&self, model: &OnnxModel, query: &Query, out: &mut RawResultBuffer) -> EngineStatus {
        let Some(probs) = Self::scored(model, query) else {
            return EngineStatus::FAILED;
        };
        let best = top_k(&probs, out.capacity());
        fill(out, best.iter().map(|&i| (model.labels[i].as_str(), probs[i])));
        EngineStatus::OK
    }

    fn predict_hierarchical(
        &self,
        model: &OnnxModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        let Some(probs) = Self::scored(model, query) else {
            return EngineStatus::FAILED;
        };
        let path = walk_taxonomy(&model.labels, &probs, out.capacity());
        fill(out, path.iter().map(|(l, p)| (l.as_str(), *p)));
        EngineStatus::OK
    }
}
