//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `linkhub.toml` in the working directory, or at the path named by
//! `LINKHUB_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use linkhub_domain::channel::Channel;
use linkhub_domain::error::{LinkHubError, ValidationError};
use linkhub_domain::item::{Item, ItemKind};
use linkhub_domain::thing::Thing;
use linkhub_domain::uid::{ChannelUid, ThingUid};
use serde::Deserialize;

const DEFAULT_PATH: &str = "linkhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Automatic provisioning settings.
    pub provisioning: ProvisioningConfig,
    /// Things fed into the thing registry at startup.
    pub things: Vec<ThingConfig>,
    /// Items present in the item registry before provisioning starts.
    pub items: Vec<ItemConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Bindings whose things get items generated automatically.
    pub auto_bindings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThingConfig {
    /// `binding:type:id`
    pub uid: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    #[serde(default)]
    pub group: Option<String>,
    /// Accepted item type, e.g. `Number` or `Switch`.
    pub item_type: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    /// One of `Number`, `Switch`, `String`, `Contact`.
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Config {
    /// Load configuration from `linkhub.toml` (or `LINKHUB_CONFIG`) if
    /// present, then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if it
    /// describes invalid things or items.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LINKHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LINKHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("LINKHUB_AUTO_BINDINGS") {
            self.provisioning.auto_bindings = val
                .split(',')
                .map(str::trim)
                .filter(|binding| !binding.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binding) = self
            .provisioning
            .auto_bindings
            .iter()
            .find(|binding| binding.is_empty() || binding.contains(':'))
        {
            return Err(ConfigError::Validation(format!(
                "invalid binding id {binding:?}"
            )));
        }
        self.things()?;
        self.items()?;
        Ok(())
    }

    /// Build the configured things.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Domain`] for malformed UIDs or inconsistent
    /// channels.
    pub fn things(&self) -> Result<Vec<Thing>, ConfigError> {
        self.things.iter().map(ThingConfig::to_thing).collect()
    }

    /// Build the configured items.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Domain`] for invalid names or unknown kinds.
    pub fn items(&self) -> Result<Vec<Item>, ConfigError> {
        self.items.iter().map(ItemConfig::to_item).collect()
    }
}

impl ThingConfig {
    fn to_thing(&self) -> Result<Thing, ConfigError> {
        let uid: ThingUid = self.uid.parse()?;
        let channels = self
            .channels
            .iter()
            .map(|channel| channel.to_channel(&uid))
            .collect::<Result<Vec<_>, _>>()?;
        let mut builder = Thing::builder().uid(uid).channels(channels);
        if let Some(label) = &self.label {
            builder = builder.label(label);
        }
        Ok(builder.build()?)
    }
}

impl ChannelConfig {
    fn to_channel(&self, thing_uid: &ThingUid) -> Result<Channel, ConfigError> {
        let uid = ChannelUid::new(thing_uid.clone(), self.group.clone(), &self.id)?;
        let channel = Channel::new(uid, &self.item_type);
        Ok(match &self.label {
            Some(label) => channel.with_label(label),
            None => channel,
        })
    }
}

impl ItemConfig {
    fn to_item(&self) -> Result<Item, ConfigError> {
        let kind: ItemKind = self.kind.parse()?;
        let item = Item::new(&self.name, kind)?;
        Ok(match &self.label {
            Some(label) => item.with_label(label),
            None => item,
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "linkhubd=info,linkhub_app=info,linkhub_adapter_memory=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A configured thing or item is invalid.
    #[error("invalid thing or item in configuration")]
    Domain(#[from] LinkHubError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}
