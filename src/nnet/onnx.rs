use std::path::Path;
use std::time::Instant;

use ndarray::{Array2, ArrayView2, Axis, Ix2};
use num_cpus::get_physical;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::{Network, NetworkError};

const THREAD_ENV: &str = "ORT_THREADS";

fn resolve_thread_count() -> usize {
    if let Ok(value) = std::env::var(THREAD_ENV) {
        match value.parse::<usize>() {
            Ok(parsed) => {
                log::info!("Using ORT_THREADS override: {} threads", parsed);
                return parsed;
            }
            Err(err) => {
                log::warn!("Ignoring invalid ORT_THREADS value '{}': {}", value, err);
            }
        }
    }
    get_physical()
}

#[derive(Debug, Clone, Default)]
pub struct OrtNetworkConfig {
    /// Input tensor name; the model's first input when unset.
    pub input_name: Option<String>,
    /// Output tensor name; the model's first output when unset.
    pub output_name: Option<String>,
    /// Required when the model's output width is dynamic.
    pub output_dim: Option<usize>,
    /// Set when the model emits logits rather than probabilities.
    pub apply_softmax: bool,
    pub threads: Option<usize>,
}

/// A [`Network`] backed by an ONNX Runtime session.
pub struct OrtNetwork {
    session: Session,
    input_name: String,
    output_name: String,
    output_dim: usize,
    apply_softmax: bool,
}

impl OrtNetwork {
    pub fn new<P: AsRef<Path>>(model_path: P, config: OrtNetworkConfig) -> Result<Self, NetworkError> {
        let start = Instant::now();
        let model_path = model_path.as_ref();
        let threads = config.threads.unwrap_or_else(resolve_thread_count);
        let opt = if cfg!(target_os = "windows") {
            GraphOptimizationLevel::Level1
        } else {
            GraphOptimizationLevel::Level3
        };
        let session = Session::builder()?
            .with_optimization_level(opt)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
            .with_intra_threads(threads)?
            .commit_from_file(model_path)?;

        let input_name = match config.input_name {
            Some(name) => name,
            None => session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .ok_or_else(|| NetworkError::InputNotFound("<first input>".into()))?,
        };
        let output = match &config.output_name {
            Some(name) => session.outputs.iter().find(|o| &o.name == name),
            None => session.outputs.first(),
        }
        .ok_or_else(|| {
            NetworkError::OutputNotFound(
                config
                    .output_name
                    .clone()
                    .unwrap_or_else(|| "<first output>".into()),
            )
        })?;
        let output_name = output.name.clone();
        let model_dim = output
            .output_type
            .tensor_shape()
            .and_then(|s| s.last().copied())
            .and_then(|d| usize::try_from(d).ok());
        let output_dim = config
            .output_dim
            .or(model_dim)
            .ok_or(NetworkError::UnknownOutputDim)?;

        log::info!(
            "Acoustic model {} loaded in {:?} ({} outputs, {} threads)",
            model_path.display(),
            start.elapsed(),
            output_dim,
            threads
        );
        Ok(Self {
            session,
            input_name,
            output_name,
            output_dim,
            apply_softmax: config.apply_softmax,
        })
    }
}

impl Network for OrtNetwork {
    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn forward(&mut self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        let input = frames.as_standard_layout();
        let outputs = self.session.run(inputs![
            self.input_name.as_str() => TensorRef::from_array_view(input.view())?,
        ])?;
        let raw = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| NetworkError::OutputNotFound(self.output_name.clone()))?
            .try_extract_array::<f32>()?;
        let raw = if raw.ndim() == 3 {
            raw.remove_axis(Axis(0))
        } else {
            raw
        };
        let mut out = raw.into_dimensionality::<Ix2>()?.to_owned();
        if self.apply_softmax {
            softmax_rows(&mut out);
        }
        Ok(out)
    }
}

fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.outer_iter_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
}
