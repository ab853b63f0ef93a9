//! @ai:module:intent Benchmark session execution
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkExecutor, InputFile

pub mod executor;

pub use executor::{BenchmarkExecutor, InputFile};
