//! [`Publisher`](crate::publish::Publisher) implementations.

#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(any(test, feature = "mock"))]
#[allow(unreachable_pub)]
pub use mock::*;
