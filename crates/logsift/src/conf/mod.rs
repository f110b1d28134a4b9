//! Conf module — configuration model, loading, and validation.

pub mod model;
pub mod load;

pub use model::{
    DiscoveryConfig, GroupingConfig, GroupingStrategy, NormalizeConfig, OutputConfig,
    PipelineConfig, SiftConfig, SubstitutionRule,
};
