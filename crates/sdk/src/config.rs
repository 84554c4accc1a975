//! Client configuration with builder pattern.
//!
//! Covers the gateway endpoint, HTTP timeouts, the user agent, and the
//! retry policy applied by the HTTP transport. The query engine itself never
//! retries or enforces timeouts; both belong to the transport layer
//! configured here.

use std::time::Duration;

use snafu::ensure;
use url::Url;

use crate::error::{ConfigSnafu, InvalidUrlSnafu, Result};

/// Default request timeout (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (5 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default user agent sent with every request.
const DEFAULT_USER_AGENT: &str = concat!("tessera-gateway-sdk/", env!("CARGO_PKG_VERSION"));

/// Configuration for a gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway base URL (e.g. `https://gateway.example.net`).
    pub(crate) endpoint: String,

    /// Request timeout.
    pub(crate) timeout: Duration,

    /// Connection establishment timeout.
    pub(crate) connect_timeout: Duration,

    /// User agent header value.
    pub(crate) user_agent: String,

    /// Retry policy for transient read failures.
    pub(crate) retry_policy: RetryPolicy,
}

impl GatewayConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Returns the gateway base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the user agent header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    retry_policy: Option<RetryPolicy>,
}

impl GatewayConfigBuilder {
    /// Sets the gateway base URL.
    ///
    /// Must be a valid HTTP(S) URL. A trailing slash is stripped so paths can
    /// be joined uniformly.
    #[must_use]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the request timeout.
    ///
    /// Default: 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection establishment timeout.
    ///
    /// Default: 5 seconds.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the user agent header value.
    #[must_use]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the retry policy for transient read failures.
    ///
    /// Default: [`RetryPolicy::default()`].
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint was provided
    /// - The endpoint URL is not valid HTTP(S)
    /// - A timeout is zero
    pub fn build(self) -> Result<GatewayConfig> {
        let endpoint =
            self.endpoint.ok_or_else(|| ConfigSnafu { message: "endpoint is required" }.build())?;
        validate_endpoint(&endpoint)?;
        let endpoint = endpoint.trim_end_matches('/').to_owned();

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        ensure!(!timeout.is_zero(), ConfigSnafu { message: "timeout cannot be zero" });

        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        ensure!(
            !connect_timeout.is_zero(),
            ConfigSnafu { message: "connect_timeout cannot be zero" }
        );

        let user_agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        ensure!(!user_agent.is_empty(), ConfigSnafu { message: "user_agent cannot be empty" });

        Ok(GatewayConfig {
            endpoint,
            timeout,
            connect_timeout,
            user_agent,
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

/// Retry policy applied to idempotent gateway reads.
///
/// Writes are never retried; posting the same entry twice would create two
/// entries on an append-only ledger.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,

    /// Initial backoff duration before the first retry.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,

    /// Backoff multiplier for exponential increase.
    pub multiplier: f64,

    /// Whether to randomize backoff to avoid synchronized retries.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy builder.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Default::default() }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<bool>,
}

impl RetryPolicyBuilder {
    /// Sets the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the initial backoff duration.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = Some(backoff);
        self
    }

    /// Sets the maximum backoff duration.
    #[must_use]
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = Some(backoff);
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Enables or disables backoff jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Builds the retry policy.
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self.initial_backoff.unwrap_or(defaults.initial_backoff),
            max_backoff: self.max_backoff.unwrap_or(defaults.max_backoff),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

/// Validates that an endpoint is a well-formed HTTP(S) URL with a host.
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let parsed = match Url::parse(endpoint) {
        Ok(parsed) => parsed,
        Err(err) => {
            return InvalidUrlSnafu { url: endpoint, message: err.to_string() }.fail();
        },
    };

    ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        InvalidUrlSnafu { url: endpoint, message: "URL must start with http:// or https://" }
    );
    ensure!(
        parsed.host_str().is_some(),
        InvalidUrlSnafu { url: endpoint, message: "URL must have a host" }
    );

    Ok(())
}
