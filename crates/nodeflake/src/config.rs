use std::collections::HashMap;
use std::str::FromStr;

use crate::{DEFAULT_EPOCH, Error, GeneratorBuilder, NodeIdSource, Result};

/// Key holding the explicit node ID. Absent means "derive from hardware".
pub const NODE_ID_KEY: &str = "node_id";

/// Key holding the epoch in milliseconds since the Unix epoch.
pub const EPOCH_KEY: &str = "epoch";

/// A flat string key-value configuration store.
///
/// This is the seam to whatever the application keeps its settings in
/// (properties files, the environment, a database row). `nodeflake` only
/// reads and writes plain strings through it.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_owned(), value);
    }
}

/// The process environment. Keys are upper-cased and prefixed, so with the
/// prefix `NODEFLAKE_` the key `node_id` reads `NODEFLAKE_NODE_ID`.
///
/// Writes go to an in-memory overlay that shadows the environment for this
/// source only; the process environment itself is never modified.
#[derive(Clone, Debug, Default)]
pub struct EnvSource {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key).to_uppercase()
    }
}

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        let name = self.var_name(key);
        self.overrides
            .get(&name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    fn set(&mut self, key: &str, value: String) {
        self.overrides.insert(self.var_name(key), value);
    }
}

/// Generator settings as stored in a [`ConfigSource`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Explicit node ID; `None` derives it from the network hardware.
    pub node_id: Option<i64>,
    /// Epoch in milliseconds since the Unix epoch; `None` means
    /// [`DEFAULT_EPOCH`].
    pub epoch: Option<u64>,
}

impl GeneratorConfig {
    /// Reads [`NODE_ID_KEY`] and [`EPOCH_KEY`] from `source`. Blank values
    /// count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if a present value is not an
    /// integer.
    pub fn from_source(source: &impl ConfigSource) -> Result<Self> {
        Ok(Self {
            node_id: parse_key(source, NODE_ID_KEY)?,
            epoch: parse_key(source, EPOCH_KEY)?,
        })
    }

    /// Writes the set values back to `source`.
    pub fn store(&self, source: &mut impl ConfigSource) {
        if let Some(node_id) = self.node_id {
            source.set(NODE_ID_KEY, node_id.to_string());
        }
        if let Some(epoch) = self.epoch {
            source.set(EPOCH_KEY, epoch.to_string());
        }
    }

    /// The effective epoch.
    pub fn epoch_or_default(&self) -> u64 {
        self.epoch.unwrap_or(DEFAULT_EPOCH)
    }

    /// A builder preloaded with these settings and the system clock.
    pub fn builder(&self) -> GeneratorBuilder {
        GeneratorBuilder::new()
            .node_source(NodeIdSource::from(self.node_id))
            .epoch(self.epoch_or_default())
    }
}

fn parse_key<T>(source: &impl ConfigSource, key: &str) -> Result<Option<T>>
where
    T: FromStr,
{
    let Some(raw) = source.get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| {
        Error::invalid_configuration(format!("{key} must be an integer, got {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn empty_source_uses_defaults() {
        let config = GeneratorConfig::from_source(&HashMap::<String, String>::new()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.epoch_or_default(), DEFAULT_EPOCH);
    }

    #[test]
    fn reads_numeric_values() {
        let config =
            GeneratorConfig::from_source(&source(&[("node_id", " 12 "), ("epoch", "0")])).unwrap();
        assert_eq!(config.node_id, Some(12));
        assert_eq!(config.epoch, Some(0));

        let generator = config.builder().build().unwrap();
        assert_eq!(generator.node_id().get(), 12);
        assert_eq!(generator.epoch(), 0);
    }

    #[test]
    fn blank_values_are_absent() {
        let config = GeneratorConfig::from_source(&source(&[("node_id", "  ")])).unwrap();
        assert_eq!(config.node_id, None);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = GeneratorConfig::from_source(&source(&[("node_id", "twelve")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));

        let err = GeneratorConfig::from_source(&source(&[("epoch", "-5")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn out_of_range_node_id_fails_at_build() {
        let config = GeneratorConfig::from_source(&source(&[("node_id", "1024")])).unwrap();
        assert!(matches!(
            config.builder().build(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn store_round_trips() {
        let config = GeneratorConfig {
            node_id: Some(7),
            epoch: Some(1_000),
        };
        let mut store = HashMap::<String, String>::new();
        config.store(&mut store);
        assert_eq!(GeneratorConfig::from_source(&store).unwrap(), config);
    }

    #[test]
    fn env_source_prefixes_and_uppercases() {
        let env = EnvSource::new("nodeflake_test_");
        assert_eq!(env.var_name("node_id"), "NODEFLAKE_TEST_NODE_ID");
        assert_eq!(env.get("definitely_unset_key"), None);
    }

    #[test]
    fn env_source_overlay_shadows_environment() {
        let mut env = EnvSource::new("nodeflake_overlay_test_");
        GeneratorConfig {
            node_id: Some(9),
            epoch: None,
        }
        .store(&mut env);

        assert_eq!(env.get("node_id").as_deref(), Some("9"));
        assert!(std::env::var("NODEFLAKE_OVERLAY_TEST_NODE_ID").is_err());
        assert_eq!(GeneratorConfig::from_source(&env).unwrap().node_id, Some(9));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_missing_fields() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"node_id": 3}"#).unwrap();
        assert_eq!(
            config,
            GeneratorConfig {
                node_id: Some(3),
                epoch: None,
            }
        );
    }
}
