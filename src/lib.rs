pub mod decodable;
pub mod error;
pub mod feature;
pub mod nnet;
pub mod options;
pub mod priors;
pub mod transition;

pub use decodable::{Decodable, NnetDecodable, NnetDecodableBase, NnetDecodableOnline};
pub use error::{DecodableError, ErrorKind};
pub use feature::{FeatureBuffer, FeatureError, MatrixFeature, OnlineFeature};
pub use nnet::{Network, NetworkError, OrtNetwork, OrtNetworkConfig};
pub use options::{NnetDecodableOptions, SkipType};
pub use priors::LogPriors;
pub use transition::{TransitionModel, TransitionTable};
