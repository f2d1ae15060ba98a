//! Harness configuration.

use crate::mock::SimulationConfig;
use crate::panel::{PanelDescriptor, PanelMode};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default handshake timeout (30 seconds)
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 30_000;

/// Social provider whose sidebar and worker open the chats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderManifest {
    /// Display name, used as panel title
    pub name: String,
    /// Provider origin
    pub origin: String,
    /// Sidebar document
    pub sidebar_url: String,
    /// Worker script
    pub worker_url: String,
    /// Toolbar icon
    pub icon_url: String,
}

impl Default for ProviderManifest {
    fn default() -> Self {
        let base = "https://example.com/browser/browser/base/content/test";
        Self {
            name: "provider 1".to_string(),
            origin: "https://example.com".to_string(),
            sidebar_url: format!("{base}/social/social_sidebar.html"),
            worker_url: format!("{base}/social/social_worker.js"),
            icon_url: format!("{base}/general/moz.png"),
        }
    }
}

impl ProviderManifest {
    /// Descriptor for a chat at `url` opened on behalf of this provider
    #[must_use]
    pub fn chat_descriptor(&self, url: impl Into<String>, mode: PanelMode) -> PanelDescriptor {
        PanelDescriptor::new(&self.origin, &self.name, url).with_mode(mode)
    }
}

/// Top-level configuration for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Polling bounds for every condition wait
    pub wait: WaitOptions,
    /// Bound on the sidebar initialization handshake
    pub handshake_timeout_ms: u64,
    /// Provider under test
    pub provider: ProviderManifest,
    /// Chat document the sidebar opens
    pub chat_url: String,
    /// Behaviour of the in-process collaborators
    pub simulation: SimulationConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            wait: WaitOptions::default(),
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            provider: ProviderManifest::default(),
            chat_url: "https://example.com/browser/browser/base/content/test/social/social_chat.html"
                .to_string(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML, filling missing fields with defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the result is invalid.
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> HarnessResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check that the polling bounds make sense
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] describing the first problem found.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.wait.poll_interval_ms == 0 {
            return Err(HarnessError::config("wait.poll_interval_ms must be non-zero"));
        }
        if self.wait.poll_interval_ms > self.wait.timeout_ms {
            return Err(HarnessError::config(format!(
                "wait.poll_interval_ms ({}) exceeds wait.timeout_ms ({})",
                self.wait.poll_interval_ms, self.wait.timeout_ms
            )));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(HarnessError::config("handshake_timeout_ms must be non-zero"));
        }
        if self.chat_url.is_empty() {
            return Err(HarnessError::config("chat_url must not be empty"));
        }
        Ok(())
    }

    /// Set polling bounds
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the handshake timeout
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout_ms: u64) -> Self {
        self.handshake_timeout_ms = timeout_ms;
        self
    }

    /// Set the simulation behaviour
    #[must_use]
    pub const fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Handshake timeout as Duration
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{FocusPolicy, ReadinessOrder};
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        HarnessConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_provider_manifest() {
        let provider = ProviderManifest::default();
        assert_eq!(provider.origin, "https://example.com");
        assert_eq!(provider.name, "provider 1");
        assert!(provider.sidebar_url.ends_with("social_sidebar.html"));
    }

    #[test]
    fn test_chat_descriptor_uses_provider_identity() {
        let provider = ProviderManifest::default();
        let descriptor = provider.chat_descriptor("https://example.com/c", PanelMode::Minimized);
        assert_eq!(descriptor.origin, provider.origin);
        assert_eq!(descriptor.title, provider.name);
        assert_eq!(descriptor.mode, PanelMode::Minimized);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = HarnessConfig::from_yaml_str(
            "wait:\n  poll_interval_ms: 10\nsimulation:\n  readiness: on-query-only\n",
        )
        .unwrap();
        assert_eq!(config.wait.poll_interval_ms, 10);
        assert_eq!(config.wait.timeout_ms, crate::wait::DEFAULT_WAIT_TIMEOUT_MS);
        assert_eq!(config.simulation.readiness, ReadinessOrder::OnQueryOnly);
        assert_eq!(config.simulation.policy, FocusPolicy::Enforced);
        assert_eq!(config.provider, ProviderManifest::default());
    }

    #[test]
    fn test_yaml_round_trip_preserves_config() {
        let config = HarnessConfig::default().with_handshake_timeout(1234);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(HarnessConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = HarnessConfig::from_yaml_str("wait:\n  poll_interval_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_poll_interval_larger_than_timeout_rejected() {
        let config = HarnessConfig::default()
            .with_wait(WaitOptions::new().with_timeout(10).with_poll_interval(50));
        assert!(matches!(
            config.validate(),
            Err(HarnessError::Config { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chat_url: https://example.com/other.html").unwrap();
        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chat_url, "https://example.com/other.html");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = HarnessConfig::from_file("/nonexistent/chatfocus.yaml").unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
