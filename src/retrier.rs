#[path = "retrier/policy.rs"]
mod policy;

#[path = "retrier/invoke.rs"]
mod invoke;

pub use invoke::{Retried, RetriedBlocking};
pub use policy::{KindFilter, Retrier, RetrierParams, RetryCallback};
