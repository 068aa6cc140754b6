//! Runs async SDK and HTTP calls from the synchronous ports.

use std::future::Future;

use aws_sdk_ec2::error::DisplayErrorContext;
use vm_scaling_core::CloudError;

/// Requires a multi-thread tokio runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Keeps the full source chain; plain `Display` on SDK errors says only
/// "service error".
pub fn sdk_error<E>(operation: &str, error: E) -> CloudError
where
    E: std::error::Error,
{
    CloudError::new(operation, format!("{}", DisplayErrorContext(error)))
}
