//! Report printing
//!
//! Follows the same legacy/modern split as label printing: legacy servers
//! render from `report/{type}/{id}/print/`, modern ones take a
//! `report/print/` request and return a descriptor with the output file.

use std::path::Path;

use serde_json::{Map, Value};

use crate::common::PrintProtocol;
use crate::error::InvenTreeError;
use crate::models::{Entity, Model, ReportTemplate};

use super::PrintOutput;

/// Models that reports can be generated for
pub trait ReportPrinting: Model {
    /// Report type segment of the legacy endpoint (e.g. "po", "bom")
    const REPORT_NAME: &'static str;
    /// Item parameter of the legacy endpoint (e.g. "order", "part")
    const REPORT_ITEM: &'static str;
}

impl<M: ReportPrinting> Entity<M> {
    /// Print a report for this record
    ///
    /// Legacy servers always return the rendered file, so a destination is
    /// required there.
    pub async fn print_report(
        &self,
        template: u64,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PrintOutput, InvenTreeError> {
        match self.api().print_protocol() {
            PrintProtocol::Legacy => {
                let destination = destination.ok_or_else(|| {
                    InvenTreeError::InvalidArgument("Legacy report printing requires a destination".to_string())
                })?;

                let url = format!("api/report/{}/{}/print/", M::REPORT_NAME, template);
                let params = vec![(format!("{}[]", M::REPORT_ITEM), self.pk().to_string())];
                let path = self.api().download_file(&url, destination, overwrite, &params).await?;
                Ok(PrintOutput::Downloaded(path))
            }
            PrintProtocol::Modern => {
                let mut body = Map::new();
                body.insert("template".to_string(), Value::from(template));
                body.insert("items".to_string(), Value::Array(vec![self.pk().to_value()]));

                let response = self.api().post("report/print/", Value::Object(body)).await?;

                match (response.get("output").and_then(Value::as_str), destination) {
                    (Some(output), Some(destination)) => {
                        let path = self.api().download_file(output, destination, overwrite, &[]).await?;
                        Ok(PrintOutput::Downloaded(path))
                    }
                    _ => Ok(PrintOutput::Response(response)),
                }
            }
        }
    }

    /// Report templates available for this model type
    pub async fn get_report_templates(&self, filters: &[(&str, &str)]) -> Result<Vec<ReportTemplate>, InvenTreeError> {
        let mut params: Vec<(&str, &str)> = vec![("model_type", M::MODEL_TYPE.unwrap_or_default())];
        params.extend(filters.iter().filter(|(k, _)| *k != "model_type"));
        ReportTemplate::list(self.api(), &params).await
    }
}
