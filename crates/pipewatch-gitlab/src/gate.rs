//! Rate-limiter call gate contract.

use std::future::Future;

/// A delaying checkpoint enforcing the outbound request rate.
///
/// Awaited exactly once immediately before every provider API call. The
/// delay policy (sliding window, token bucket, provider budget) belongs to
/// the implementor; callers only require that the future eventually
/// resolves. The gate takes no parameters and returns nothing.
#[allow(async_fn_in_trait)]
pub trait CallGate: Send + Sync {
    /// Wait until the next outbound call is allowed.
    fn acquire(&self) -> impl Future<Output = ()> + Send;
}

/// Gate that never delays.
///
/// For tests and deployments without a provider rate budget.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGate;

impl CallGate for NoopGate {
    async fn acquire(&self) {}
}
