//! @ai:module:intent Monitored external-process execution
//! @ai:module:layer infrastructure
//! @ai:module:public_api CommandLine, InputMode, OutputMode, NonBlockingReader, MonitoredProcess, ResourceSampler, ProcessSupervisor, RunRequest, RunOutcome

pub mod command;
pub mod monitored;
pub mod reader;
pub mod sampler;
pub mod supervisor;

pub use command::{
    CommandLine, InputMode, OutputMode, INPUT_PATH_PLACEHOLDER, OUTPUT_PATH_PLACEHOLDER,
};
pub use monitored::{LaunchSpec, MonitoredProcess};
pub use reader::NonBlockingReader;
pub use sampler::{default_sampler, IoCounters, ResourceSampler, SysinfoSampler, UnavailableSampler};
pub use supervisor::{
    CaptureMode, ProcessSupervisor, RunOutcome, RunRequest, RunState, SamplerFactory,
};
