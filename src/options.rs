use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodableError;

/// How scores are reconstructed for frames the network skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipType {
    /// Evaluate only the first frame of each group and hold its score.
    #[default]
    Copy,
    /// Like `Copy`, but the evaluated score is computed from a short run of
    /// frames ending at the evaluated position.
    Split,
}

impl fmt::Display for SkipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Split => f.write_str("split"),
        }
    }
}

impl FromStr for SkipType {
    type Err = DecodableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "split" => Ok(Self::Split),
            other => Err(DecodableError::invalid_option(
                "skip-type",
                format!("expected copy or split, got '{other}'"),
            )),
        }
    }
}

/// Option names and help strings, in registration order.
pub const OPTION_HELP: &[(&str, &str)] = &[
    ("acoustic-scale", "Scaling factor for acoustic likelihoods"),
    (
        "skip-width",
        "Number of frames skipped after each evaluated frame (0 disables skipping)",
    ),
    ("skip-type", "Reconstruction used for skipped frames: copy or split"),
    (
        "max-nnet-batch-size",
        "Maximum number of frames evaluated per network call, when not limited by available frames",
    ),
];

/// Largest accepted skip width. Frame arithmetic on the evaluated
/// positions stays well inside `usize` below it.
pub const MAX_SKIP_WIDTH: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NnetDecodableOptions {
    pub acoustic_scale: f32,
    pub skip_width: usize,
    pub skip_type: SkipType,
    pub max_nnet_batch_size: usize,
}

impl Default for NnetDecodableOptions {
    fn default() -> Self {
        Self {
            acoustic_scale: 0.1,
            skip_width: 0,
            skip_type: SkipType::Copy,
            max_nnet_batch_size: 256,
        }
    }
}

impl NnetDecodableOptions {
    pub fn from_env() -> Self {
        Self::from_env_with_prefix("NNET_")
    }

    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let mut opts = Self::default();
        opts.apply_env_overrides(prefix);
        opts
    }

    pub fn from_json_str(json: &str) -> Result<Self, DecodableError> {
        let opts: Self =
            serde_json::from_str(json).map_err(|e| DecodableError::Parse(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parses `--name=value` arguments. Arguments that do not start with
    /// `--` are ignored so positional arguments can share the list.
    pub fn from_args<I, S>(args: I) -> Result<Self, DecodableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();
        for arg in args {
            let Some(body) = arg.as_ref().strip_prefix("--") else {
                continue;
            };
            let (name, value) = body.split_once('=').ok_or_else(|| {
                DecodableError::invalid_option(body, "expected --name=value")
            })?;
            opts.apply_option(name, value)?;
        }
        opts.validate()?;
        Ok(opts)
    }

    pub fn apply_option(&mut self, name: &str, value: &str) -> Result<(), DecodableError> {
        let value = value.trim();
        match name.replace('_', "-").as_str() {
            "acoustic-scale" => {
                self.acoustic_scale = value.parse().map_err(|e| bad_value(name, e))?
            }
            "skip-width" => self.skip_width = value.parse().map_err(|e| bad_value(name, e))?,
            "skip-type" => self.skip_type = value.parse()?,
            "max-nnet-batch-size" => {
                self.max_nnet_batch_size = value.parse().map_err(|e| bad_value(name, e))?
            }
            _ => return Err(DecodableError::invalid_option(name, "unknown option")),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DecodableError> {
        if self.max_nnet_batch_size == 0 {
            return Err(DecodableError::invalid_option(
                "max-nnet-batch-size",
                "must be at least 1",
            ));
        }
        if self.skip_width > MAX_SKIP_WIDTH {
            return Err(DecodableError::invalid_option(
                "skip-width",
                format!("must be at most {MAX_SKIP_WIDTH}"),
            ));
        }
        if !self.acoustic_scale.is_finite() {
            return Err(DecodableError::invalid_option(
                "acoustic-scale",
                "must be finite",
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        for (name, _) in OPTION_HELP {
            let key = format!("{prefix}{}", name.replace('-', "_").to_ascii_uppercase());
            let Ok(value) = std::env::var(&key) else {
                continue;
            };
            if let Err(err) = self.apply_option(name, &value) {
                log::warn!("Ignoring invalid {key} value '{value}': {err}");
            }
        }
    }
}

fn bad_value(name: &str, err: impl fmt::Display) -> DecodableError {
    DecodableError::invalid_option(name, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_registration() {
        let opts = NnetDecodableOptions::default();
        assert!((opts.acoustic_scale - 0.1).abs() < f32::EPSILON);
        assert_eq!(opts.skip_width, 0);
        assert_eq!(opts.skip_type, SkipType::Copy);
        assert_eq!(opts.max_nnet_batch_size, 256);
    }

    #[test]
    fn skip_type_parse_and_display() {
        assert_eq!("copy".parse::<SkipType>().unwrap(), SkipType::Copy);
        assert_eq!(" Split ".parse::<SkipType>().unwrap(), SkipType::Split);
        assert!("interp".parse::<SkipType>().is_err());
        assert_eq!(SkipType::Split.to_string(), "split");
    }

    #[test]
    fn apply_option_accepts_underscores() {
        let mut opts = NnetDecodableOptions::default();
        opts.apply_option("max_nnet_batch_size", "8").unwrap();
        assert_eq!(opts.max_nnet_batch_size, 8);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let opts = NnetDecodableOptions {
            max_nnet_batch_size: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn huge_skip_width_is_rejected() {
        let opts = NnetDecodableOptions {
            skip_width: usize::MAX,
            ..Default::default()
        };
        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);

        let widest = NnetDecodableOptions {
            skip_width: MAX_SKIP_WIDTH,
            ..Default::default()
        };
        assert!(widest.validate().is_ok());
        assert!(NnetDecodableOptions::from_args(["--skip-width=18446744073709551615"]).is_err());
    }

    #[test]
    fn option_help_covers_every_option() {
        let mut opts = NnetDecodableOptions::default();
        let values = ["0.5", "2", "split", "16"];
        for ((name, help), value) in OPTION_HELP.iter().zip(values) {
            assert!(!help.is_empty());
            opts.apply_option(name, value).unwrap();
        }
        assert_eq!(opts.skip_type, SkipType::Split);
        assert_eq!(opts.max_nnet_batch_size, 16);
    }
}
