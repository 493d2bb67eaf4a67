use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, OpsError};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE: f64 = 1.0;

/// Maximum random noise added to a wait when jitter is enabled, in seconds.
const JITTER_SPAN_SECS: f64 = 0.1;

/// Callback invoked with the triggering failure before each retry wait.
///
/// Returning an `Err` aborts the retry loop and propagates that error.
pub type RetryCallback = Arc<dyn Fn(&OpsError) -> Result<(), OpsError> + Send + Sync>;

/// Which failure kinds a [`Retrier`] re-attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    /// Retry on any failure kind.
    #[default]
    All,
    /// Retry only on the listed kinds. An empty list retries nothing.
    Kinds(Vec<ErrorKind>),
}

impl KindFilter {
    /// Whether a failure of the given kind matches this filter.
    pub fn matches(&self, kind: ErrorKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// A retry policy for wrapped callables.
///
/// A `Retrier` holds the full backoff schedule and failure filters for
/// re-invoking a fallible operation. It is immutable once built and keeps no
/// state between invocations, so a single instance can be shared across many
/// concurrent calls:
///
/// ```no_run
/// use std::time::Duration;
/// use lvmops::{ErrorKind, KindFilter, Retrier};
///
/// let retrier = Retrier::new()
///     .with_max_attempts(5)
///     .with_delay(Duration::from_millis(100))
///     .with_retry_on(KindFilter::Kinds(vec![ErrorKind::Connection]));
/// ```
///
/// Wrapped callables run through [`Retrier::run`] (asynchronous) or
/// [`Retrier::run_blocking`] (synchronous), or through the decorator-style
/// [`Retrier::wrap`] / [`Retrier::wrap_blocking`].
#[derive(Clone)]
pub struct Retrier {
    pub(super) max_attempts: u32,
    pub(super) delay: Duration,
    pub(super) exponential_backoff_base: f64,
    pub(super) jitter: bool,
    pub(super) max_delay: Option<Duration>,
    pub(super) timeout: Option<Duration>,
    pub(super) retry_on: KindFilter,
    pub(super) raise_on: Vec<ErrorKind>,
    pub(super) on_retry: Option<RetryCallback>,
}

impl Default for Retrier {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
            exponential_backoff_base: DEFAULT_BACKOFF_BASE,
            jitter: false,
            max_delay: None,
            timeout: None,
            retry_on: KindFilter::All,
            raise_on: Vec::new(),
            on_retry: None,
        }
    }
}

impl Retrier {
    /// Creates a policy with the default settings: three attempts,
    /// back-to-back, retrying every failure kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total number of attempts, first try included.
    ///
    /// Values below 1 behave as 1: the first attempt always runs.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the exponential backoff base.
    ///
    /// The wait after the *n*-th failed attempt is `delay * base^(n-1)`, so a
    /// base of 1 keeps the delay constant.
    pub fn with_exponential_backoff_base(mut self, base: f64) -> Self {
        self.exponential_backoff_base = base;
        self
    }

    /// Adds up to 100 ms of random noise to each wait, to avoid synchronised
    /// retries across tasks hitting the same device.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps any single wait between attempts.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Bounds each individual attempt. An attempt that exceeds the limit is
    /// treated as a failure of kind [`ErrorKind::Timeout`], subject to the
    /// same filters as any other failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets which failure kinds are retried. Failures outside the filter
    /// propagate immediately.
    pub fn with_retry_on(mut self, retry_on: KindFilter) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Sets failure kinds that always propagate immediately, even when they
    /// match the retry filter.
    pub fn with_raise_on(mut self, raise_on: Vec<ErrorKind>) -> Self {
        self.raise_on = raise_on;
        self
    }

    /// Sets a callback invoked with the failure before each retry wait.
    pub fn with_on_retry<C>(mut self, callback: C) -> Self
    where
        C: Fn(&OpsError) -> Result<(), OpsError> + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Whether the policy allows re-attempting after this failure.
    ///
    /// The bypass list takes priority over the retry filter; attempt
    /// accounting is up to the caller.
    pub(super) fn should_retry(&self, err: &OpsError) -> bool {
        let kind = err.kind();
        if self.raise_on.contains(&kind) {
            return false;
        }
        self.retry_on.matches(kind)
    }

    /// Calculates the wait after the `attempt`-th failure (1-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let mut wait = self.delay.as_secs_f64() * self.exponential_backoff_base.powi(exponent);

        if self.jitter {
            wait += JITTER_SPAN_SECS * rand::random::<f64>();
        }
        if let Some(max_delay) = self.max_delay {
            wait = wait.min(max_delay.as_secs_f64());
        }

        if wait.is_finite() && wait > 0.0 {
            Duration::from_secs_f64(wait)
        } else {
            Duration::ZERO
        }
    }
}

impl fmt::Debug for Retrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("exponential_backoff_base", &self.exponential_backoff_base)
            .field("jitter", &self.jitter)
            .field("max_delay", &self.max_delay)
            .field("timeout", &self.timeout)
            .field("retry_on", &self.retry_on)
            .field("raise_on", &self.raise_on)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Plain-data description of a [`Retrier`], as found in ops configuration
/// files. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrierParams {
    pub max_attempts: u32,
    pub delay: f64,
    pub exponential_backoff_base: f64,
    pub jitter: bool,
    pub max_delay: Option<f64>,
    pub timeout: Option<f64>,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub retry_on: KindFilter,
    pub raise_on: Vec<ErrorKind>,
}

impl Default for RetrierParams {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: 0.0,
            exponential_backoff_base: DEFAULT_BACKOFF_BASE,
            jitter: false,
            max_delay: None,
            timeout: None,
            retry_on: KindFilter::All,
            raise_on: Vec::new(),
        }
    }
}

impl From<RetrierParams> for Retrier {
    fn from(params: RetrierParams) -> Self {
        let mut retrier = Retrier::new()
            .with_max_attempts(params.max_attempts)
            .with_delay(Duration::from_secs_f64(params.delay.max(0.0)))
            .with_exponential_backoff_base(params.exponential_backoff_base)
            .with_jitter(params.jitter)
            .with_retry_on(params.retry_on)
            .with_raise_on(params.raise_on);

        if let Some(max_delay) = params.max_delay {
            retrier = retrier.with_max_delay(Duration::from_secs_f64(max_delay.max(0.0)));
        }
        if let Some(timeout) = params.timeout {
            retrier = retrier.with_timeout(Duration::from_secs_f64(timeout.max(0.0)));
        }

        retrier
    }
}
