pub mod aggregate;
pub mod config;
pub mod join;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use config::PipelineConfig;
pub use normalize::{normalize_text, MunicipalityKey};
pub use pipeline::run;
