//! Operations-support utilities for the Local Volume Mapper (LVM)
//! observatory.
//!
//! The crate aggregates small helpers shared by the higher-level control
//! software. Its centrepiece is the [`Retrier`] policy engine, which
//! re-invokes fallible callables, synchronous or asynchronous, according to a
//! configurable backoff schedule:
//!
//! ```no_run
//! use std::time::Duration;
//! use lvmops::{ErrorKind, KindFilter, OpsError, Retrier};
//!
//! # async fn example() -> Result<(), OpsError> {
//! let retrier = Retrier::new()
//!     .with_max_attempts(5)
//!     .with_delay(Duration::from_millis(100))
//!     .with_exponential_backoff_base(2.0)
//!     .with_retry_on(KindFilter::Kinds(vec![
//!         ErrorKind::Connection,
//!         ErrorKind::Timeout,
//!     ]));
//!
//! let pressure = retrier.run(|| read_ion_pump()).await?;
//! # Ok(())
//! # }
//! # async fn read_ion_pump() -> Result<f64, OpsError> { Ok(1e-9) }
//! ```
//!
//! Device and broker clients are expected to be the *wrapped* callables; the
//! engine performs no I/O of its own.

pub mod error;
pub mod retrier;
pub mod utils;

pub use error::{ErrorKind, OpsError};
pub use retrier::{KindFilter, Retried, RetriedBlocking, Retrier, RetrierParams, RetryCallback};
pub use utils::with_timeout;
