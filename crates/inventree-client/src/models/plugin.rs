//! Server plugin configuration

use serde_json::{Value, json};

use super::{Entity, Model, PkKind};
use crate::error::InvenTreeError;
use crate::mixins::Metadata;

/// Marker for [`InvenTreePlugin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginModel;

impl Model for PluginModel {
    const URL: &'static str = "plugins";
    const NAME: &'static str = "InvenTreePlugin";
    const PK_FIELD: &'static str = "key";
    const PK_KIND: PkKind = PkKind::Text;
    const MIN_API_VERSION: Option<u32> = Some(197);
}

impl Metadata for PluginModel {}

/// Plugin installed on the server, keyed by its slug
pub type InvenTreePlugin = Entity<PluginModel>;

impl InvenTreePlugin {
    /// Human readable plugin name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn is_active(&self) -> bool {
        self.bool_field("active").unwrap_or(false)
    }

    /// Activate or deactivate the plugin
    pub async fn set_active(&mut self, active: bool) -> Result<Value, InvenTreeError> {
        let url = format!("{}{}/activate/", PluginModel::collection_url(), self.pk());
        let response = self.api().post(&url, json!({ "active": active })).await?;
        self.reload().await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Method;
    use crate::inventree_trait::SharedClient;
    use crate::mock::MockInvenTreeClient;
    use std::sync::Arc;

    fn setup() -> (MockInvenTreeClient, SharedClient) {
        let mock = MockInvenTreeClient::new("http://inventree.local");
        mock.register_with_pk("plugins", "key");
        mock.insert("plugins", json!({"key": "bom-exporter", "name": "BOM Exporter", "active": false}));
        mock.insert("plugins", json!({"key": "digikey", "name": "DigiKey", "active": true}));
        let api: SharedClient = Arc::new(mock.clone());
        (mock, api)
    }

    #[tokio::test]
    async fn test_plugins_use_text_keys() {
        let (_mock, api) = setup();

        let plugins = InvenTreePlugin::list(&api, &[]).await.expect("list");
        assert_eq!(plugins.len(), 2);

        let plugin = InvenTreePlugin::with_pk(&api, "digikey").await.expect("plugin");
        assert_eq!(plugin.url(), "plugins/digikey/");
        assert_eq!(plugin.id(), None);
        assert_eq!(plugin.to_string(), "InvenTreePlugin<key=digikey>");
        assert!(plugin.is_active());
    }

    #[tokio::test]
    async fn test_set_active_posts_flag() {
        let (mock, api) = setup();
        mock.stub(Method::Post, "plugins/bom-exporter/activate/", 200, json!({"active": true}));

        let mut plugin = InvenTreePlugin::with_pk(&api, "bom-exporter").await.expect("plugin");
        plugin.set_active(true).await.expect("activate");

        let request = mock
            .last_request_to("plugins/bom-exporter/activate/")
            .expect("activate request");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.json, Some(json!({"active": true})));
    }

    #[tokio::test]
    async fn test_plugins_need_api_197() {
        let (mock, _) = setup();
        let api: SharedClient = Arc::new(mock.with_api_version(190));

        let err = InvenTreePlugin::list(&api, &[]).await.expect_err("too old");
        assert!(matches!(err, InvenTreeError::UnsupportedModel { model: "InvenTreePlugin", .. }));
    }
}
