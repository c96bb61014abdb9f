use std::io::Read;

use ndarray::{Array1, ArrayView1};

use crate::error::DecodableError;

/// Prior assigned to pdfs whose normalised count falls below the floor, so
/// their scaled likelihood is pushed far down.
const FLOORED_PRIOR: f64 = 1e10;

/// Per-pdf log prior probabilities, subtracted from the network's log
/// posteriors to form pseudo log-likelihoods.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPriors {
    values: Array1<f32>,
}

impl LogPriors {
    pub fn new(log_priors: Vec<f32>) -> Self {
        Self {
            values: Array1::from_vec(log_priors),
        }
    }

    /// A flat prior over `num_pdfs` classes.
    pub fn uniform(num_pdfs: usize) -> Self {
        let log_p = -(num_pdfs.max(1) as f32).ln();
        Self {
            values: Array1::from_elem(num_pdfs, log_p),
        }
    }

    /// Builds log priors from per-pdf occupation counts. Pdfs whose share of
    /// the total is below `prior_floor` get a huge prior instead.
    pub fn from_counts(counts: &[f64], prior_floor: f64) -> Result<Self, DecodableError> {
        let total: f64 = counts.iter().sum();
        if counts.is_empty() || total <= 0.0 || !total.is_finite() {
            return Err(DecodableError::Parse(
                "prior counts must be non-empty with a positive finite sum".into(),
            ));
        }
        let mut floored = 0usize;
        let values = counts
            .iter()
            .map(|&c| {
                let p = c / total;
                if p < prior_floor {
                    floored += 1;
                    FLOORED_PRIOR.ln() as f32
                } else {
                    p.ln() as f32
                }
            })
            .collect::<Vec<_>>();
        if floored > 0 {
            log::warn!(
                "Floored {} of {} pdf priors below {}",
                floored,
                counts.len(),
                prior_floor
            );
        }
        Ok(Self::new(values))
    }

    /// Parses a whitespace separated count vector, optionally wrapped in
    /// `[` and `]`.
    pub fn read_counts<R: Read>(mut reader: R) -> Result<Vec<f64>, DecodableError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        text.split_whitespace()
            .filter(|tok| *tok != "[" && *tok != "]")
            .map(|tok| {
                tok.trim_matches(|c| c == '[' || c == ']')
                    .parse::<f64>()
                    .map_err(|e| DecodableError::Parse(format!("prior count '{tok}': {e}")))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }
}
