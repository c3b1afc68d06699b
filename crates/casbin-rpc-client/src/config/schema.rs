use serde::Deserialize;
use casbin_rpc_core::error::{CasbinRpcError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub channel: ChannelSection,

    #[serde(default)]
    pub enforcers: Vec<EnforcerConfig>,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CasbinRpcError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.channel.validate()?;

        let mut seen = std::collections::HashSet::new();
        for e in &self.enforcers {
            e.validate()?;
            if !seen.insert(e.name.as_str()) {
                return Err(CasbinRpcError::Config(format!(
                    "duplicate enforcer name: {}",
                    e.name
                )));
            }
        }
        Ok(())
    }

    /// Look up an enforcer profile by name.
    pub fn enforcer(&self, name: &str) -> Option<&EnforcerConfig> {
        self.enforcers.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSection {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Applied to calls whose context carries no deadline. `0` disables it.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl ChannelSection {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(CasbinRpcError::Config("channel.address must not be empty".into()));
        }
        if !(100..=60000).contains(&self.connect_timeout_ms) {
            return Err(CasbinRpcError::Config(
                "channel.connect_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if self.request_timeout_ms > 600000 {
            return Err(CasbinRpcError::Config(
                "channel.request_timeout_ms must be at most 600000".into(),
            ));
        }
        if !(1024..=64 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(CasbinRpcError::Config(
                "channel.max_frame_bytes must be between 1024 and 67108864".into(),
            ));
        }
        Ok(())
    }
}

fn default_address() -> String {
    "127.0.0.1:50051".into()
}
fn default_connect_timeout_ms() -> u64 {
    3000
}
fn default_request_timeout_ms() -> u64 {
    1000
}
fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

/// Everything needed to create one remote enforcer.
///
/// The adapter phase runs only when both `driver_name` and `connect_string`
/// are non-empty; otherwise the enforcer is created without an adapter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnforcerConfig {
    #[serde(default = "default_enforcer_name")]
    pub name: String,

    #[serde(default)]
    pub model_text: String,

    #[serde(default)]
    pub driver_name: String,

    #[serde(default)]
    pub connect_string: String,

    #[serde(default)]
    pub db_specified: bool,

    /// When set, `enforce` rejects a parameter count other than this locally.
    #[serde(default)]
    pub request_arity: Option<usize>,

    /// Ask the server to accept JSON-object enforce parameters.
    #[serde(default)]
    pub enable_accept_json_request: bool,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            name: default_enforcer_name(),
            model_text: String::new(),
            driver_name: String::new(),
            connect_string: String::new(),
            db_specified: false,
            request_arity: None,
            enable_accept_json_request: false,
        }
    }
}

impl EnforcerConfig {
    pub fn new(model_text: impl Into<String>) -> Self {
        Self {
            model_text: model_text.into(),
            ..Self::default()
        }
    }

    pub fn with_adapter(
        mut self,
        driver_name: impl Into<String>,
        connect_string: impl Into<String>,
        db_specified: bool,
    ) -> Self {
        self.driver_name = driver_name.into();
        self.connect_string = connect_string.into();
        self.db_specified = db_specified;
        self
    }

    pub fn with_request_arity(mut self, arity: usize) -> Self {
        self.request_arity = Some(arity);
        self
    }

    pub fn with_json_requests(mut self, enable: bool) -> Self {
        self.enable_accept_json_request = enable;
        self
    }

    /// True when an adapter must be created before the enforcer.
    pub fn wants_adapter(&self) -> bool {
        !self.driver_name.is_empty() && !self.connect_string.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CasbinRpcError::Config("enforcer name must not be empty".into()));
        }
        if self.request_arity == Some(0) {
            return Err(CasbinRpcError::Config(format!(
                "enforcer {}: request_arity must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_enforcer_name() -> String {
    "default".into()
}
