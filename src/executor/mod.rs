//! Where a scan request is carried out
//!
//! [`LocalExecutor`] provisions and runs the scanner on this machine.
//! [`RemoteExecutor`] ships the request over a [`RemoteChannel`] to a worker,
//! which runs a `LocalExecutor` on its side, and relays the log stream and
//! result back.
//!
//! [`RemoteChannel`]: crate::workspace::RemoteChannel

pub mod local;
pub mod protocol;
pub mod remote;

use std::future::Future;

use crate::error::ScanError;
use crate::process::ExecutionResult;
use crate::scan::ScanRequest;
use crate::sink::LogSink;

pub use local::LocalExecutor;
pub use protocol::{EventWriter, WorkerEvent, serve};
pub use remote::RemoteExecutor;

pub trait Executor {
    /// Provision the scanner for `request` and run the scan, streaming the
    /// pipeline log to `sink`.
    fn provision_and_run(
        &self,
        request: &ScanRequest,
        sink: &dyn LogSink,
    ) -> impl Future<Output = Result<ExecutionResult, ScanError>> + Send;
}
