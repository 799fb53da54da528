//! Physical mount execution.
//!
//! - [`Invoker`]: runs an external command under a deadline
//! - [`MountExecutor`]: turns mount/unmount requests into command lines

mod executor;
mod invoker;

pub use executor::MountExecutor;
pub use invoker::{InvokeContext, Invoker, ProcessInvoker};
