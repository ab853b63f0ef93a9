//! @ai:module:intent Run records and their aggregation
//! @ai:module:layer application
//! @ai:module:public_api ExecutionStatistics, OutputCapture, RunRecord, Report, HardwareInfo, MetricsAggregator, SessionSummary

pub mod aggregator;
pub mod types;

pub use aggregator::{
    MetricsAggregator, MetricsAggregatorTrait, SessionSummary, SuiteSummary, VerdictCounts,
};
pub use types::{
    ExecutionStatistics, HardwareInfo, InputDescriptor, OutputCapture, Report, RunRecord,
    TranslationProvenance,
};
