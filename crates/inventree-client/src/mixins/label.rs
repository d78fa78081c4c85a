//! Label printing
//!
//! Servers before api version 201 expose one print endpoint per label type
//! that renders the file directly. Newer servers accept a generic
//! `label/print/` request and answer with a descriptor naming the generated
//! output file, which is downloaded separately.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::common::PrintProtocol;
use crate::error::InvenTreeError;
use crate::models::{Entity, Model};

/// Result of a print request
#[derive(Debug, Clone, PartialEq)]
pub enum PrintOutput {
    /// The rendered file was saved locally
    Downloaded(PathBuf),
    /// The server response (plugin printing, or no destination given)
    Response(Value),
}

/// Models that labels can be printed for
pub trait LabelPrinting: Model {
    /// Label type segment of the legacy endpoint (e.g. "part", "stock")
    const LABEL_NAME: &'static str;
    /// Item parameter of the legacy endpoint (e.g. "parts", "items")
    const LABEL_ITEM: &'static str;
}

impl<M: LabelPrinting> Entity<M> {
    /// Print a label for this record
    ///
    /// With a `plugin` the server hands the label to that plugin. Otherwise,
    /// if a `destination` is given, the rendered label is downloaded there.
    pub async fn print_label(
        &self,
        template: u64,
        plugin: Option<&str>,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PrintOutput, InvenTreeError> {
        match self.api().print_protocol() {
            PrintProtocol::Legacy => self.print_label_legacy(template, plugin, destination, overwrite).await,
            PrintProtocol::Modern => self.print_label_modern(template, plugin, destination, overwrite).await,
        }
    }

    async fn print_label_legacy(
        &self,
        template: u64,
        plugin: Option<&str>,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PrintOutput, InvenTreeError> {
        let url = format!("label/{}/{}/print/", M::LABEL_NAME, template);

        let mut params = vec![(format!("{}[]", M::LABEL_ITEM), self.pk().to_string())];
        if let Some(plugin) = plugin {
            params.push(("plugin".to_string(), plugin.to_string()));
        }

        if let (None, Some(destination)) = (plugin, destination) {
            let destination = self.label_destination(template, destination).await;
            let path = self
                .api()
                .download_file(&format!("api/{}", url), &destination, overwrite, &params)
                .await?;
            return Ok(PrintOutput::Downloaded(path));
        }

        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let response = self.api().get(&url, &pairs).await?;

        match (response.get("file").and_then(Value::as_str), destination) {
            (Some(file), Some(destination)) => {
                let destination = self.label_destination(template, destination).await;
                let path = self.api().download_file(file, &destination, overwrite, &[]).await?;
                Ok(PrintOutput::Downloaded(path))
            }
            _ => Ok(PrintOutput::Response(response)),
        }
    }

    async fn print_label_modern(
        &self,
        template: u64,
        plugin: Option<&str>,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PrintOutput, InvenTreeError> {
        let mut body = Map::new();
        body.insert("template".to_string(), Value::from(template));
        body.insert("items".to_string(), Value::Array(vec![self.pk().to_value()]));
        if let Some(plugin) = plugin {
            body.insert("plugin".to_string(), Value::from(plugin));
        }

        let response = self.api().post("label/print/", Value::Object(body)).await?;
        debug!("Label print response for {}: {}", self, response);

        match (response.get("output").and_then(Value::as_str), destination) {
            (Some(output), Some(destination)) => {
                let path = self.api().download_file(output, destination, overwrite, &[]).await?;
                Ok(PrintOutput::Downloaded(path))
            }
            _ => Ok(PrintOutput::Response(response)),
        }
    }

    /// Directories get a generated file name; the print URL has none
    async fn label_destination(&self, template: u64, destination: &Path) -> PathBuf {
        let is_dir = tokio::fs::metadata(destination)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if is_dir {
            destination.join(format!("Label_{}{}_{}.pdf", M::LABEL_NAME, template, self.pk()))
        } else {
            destination.to_path_buf()
        }
    }
}
