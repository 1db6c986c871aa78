//! Print-server supervision: one child process and the relay of its output.

mod error;
pub mod process;
pub mod relay;

pub use error::SupervisorError;
pub use process::{
    LaunchSpec, ProcessStatus, ReadOutcome, StartOutcome, StopOutcome, SupervisedProcess,
};
pub use relay::{Relay, RelayHandle, RelayIntervals, RelayState, RelayStats};
