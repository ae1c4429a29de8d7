use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptor of a plugin: name, version and free-form extra data.
///
/// Declared at registration (see [`Runtime::plugin_versions`](crate::Runtime::plugin_versions))
/// and returned again by the init function; the returned records make up
/// [`PluginsInitializedEvent::plugins`](crate::PluginsInitializedEvent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginData {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PluginData {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Adds one extra entry.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let data = PluginData::new("gateway", "1.2.0").with_extra("schema", 3);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "gateway", "version": "1.2.0", "extra": {"schema": 3}})
        );

        let bare: PluginData = serde_json::from_str(r#"{"name":"a","version":"0"}"#).unwrap();
        assert!(bare.extra.is_empty());
    }
}
