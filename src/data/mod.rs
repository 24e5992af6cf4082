//! Dataset loading and feature derivation.

mod dataset;
mod features;

pub use dataset::{DataError, Dataset};
pub use features::{
    interaction, log, prepare_review_features, quantile, quantile_indicator, REVIEW_HIGH_QUANTILE,
};
