use anyhow::{Context, Result};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::{ClientConfig, ClientOptions, ConfigurationError};

/// Named configurations, plus which one (if any) is the default.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    configs: HashMap<String, ClientConfig>,
    default: Option<String>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configuration for `name`, creating an unconfigured entry
    /// on first reference.
    pub fn get_or_create(&mut self, name: &str) -> Result<&ClientConfig, ConfigurationError> {
        self.entry(name).map(|config| &*config)
    }

    fn entry(&mut self, name: &str) -> Result<&mut ClientConfig, ConfigurationError> {
        match self.configs.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let config = ClientConfig::new(name)?;
                debug!("Created configuration '{}'", name);
                Ok(entry.insert(config))
            }
        }
    }

    /// Applies `options` to the configuration called `name`.
    ///
    /// A config that becomes the default takes the flag away from the
    /// previous default. Dropping the flag on the current default leaves the
    /// registry without one.
    pub fn configure(
        &mut self,
        name: &str,
        options: ClientOptions,
    ) -> Result<&ClientConfig, ConfigurationError> {
        let config = self.entry(name)?;
        config.configure(options)?;
        let is_default = config.is_default();

        if is_default {
            if let Some(previous) = self.default.replace(name.to_string())
                && previous != name
            {
                debug!("Configuration '{}' replaces '{}' as default", name, previous);
                if let Some(previous) = self.configs.get_mut(&previous) {
                    previous.set_default(false);
                }
            }
        } else if self.default.as_deref() == Some(name) {
            self.default = None;
        }

        Ok(&self.configs[name])
    }

    /// Removes `name`. Clients already built from it keep their copy.
    pub fn unconfigure(&mut self, name: &str) -> Option<ClientConfig> {
        if self.default.as_deref() == Some(name) {
            self.default = None;
        }
        let removed = self.configs.remove(name);
        if removed.is_some() {
            debug!("Removed configuration '{}'", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&ClientConfig> {
        self.configs.get(name)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn default_config(&self) -> Option<&ClientConfig> {
        self.default.as_deref().and_then(|name| self.configs.get(name))
    }

    /// Configuration names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Configures every entry of a JSON object mapping names to
    /// [`ClientOptions`].
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let entries: BTreeMap<String, ClientOptions> =
            serde_json::from_str(json).context("Failed to parse client configurations")?;

        let defaults: Vec<&str> = entries
            .iter()
            .filter(|(_, options)| options.use_by_default == Some(true))
            .map(|(name, _)| name.as_str())
            .collect();
        if defaults.len() > 1 {
            anyhow::bail!(
                "Only one configuration may set use_by_default, found: {}",
                defaults.join(", ")
            );
        }

        for (name, options) in entries {
            self.configure(&name, options)
                .with_context(|| format!("Invalid configuration '{}'", name))?;
        }
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        debug!("Loading client configurations from {:?}", path);
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;
        self.load_json(&json)
            .with_context(|| format!("Failed to load configuration file {:?}", path))
    }
}
