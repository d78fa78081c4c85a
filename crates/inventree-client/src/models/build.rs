//! Build orders

use serde_json::{Map, Value};

use super::{Part, model};
use crate::error::InvenTreeError;
use crate::mixins::{Attachments, Metadata, ReportPrinting, Status, StatusAction};

model! {
    /// Build order
    Build(BuildModel) => "build", model_type = "build"
}

impl Metadata for BuildModel {}
impl Attachments for BuildModel {}
impl Status for BuildModel {}

impl ReportPrinting for BuildModel {
    const REPORT_NAME: &'static str = "build";
    const REPORT_ITEM: &'static str = "build";
}

impl Build {
    /// Build reference, e.g. "BO-0012"
    pub fn build_reference(&self) -> Option<&str> {
        self.str_field("reference")
    }

    /// Quantity to build
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// Status code
    pub fn status(&self) -> Option<u64> {
        self.u64_field("status")
    }

    /// The part being built
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// Issue the build order
    pub async fn issue(&mut self) -> Result<Value, InvenTreeError> {
        self.status_update(StatusAction::Issue, None, true).await
    }

    /// Place the build order on hold
    pub async fn hold(&mut self) -> Result<Value, InvenTreeError> {
        self.status_update(StatusAction::Hold, None, true).await
    }

    /// Cancel the build order
    pub async fn cancel(&mut self) -> Result<Value, InvenTreeError> {
        self.status_update(StatusAction::Cancel, None, true).await
    }

    /// Finish the build order
    ///
    /// `data` may carry the server's finish options (e.g. `accept_unallocated`).
    pub async fn finish(&mut self, data: Option<Map<String, Value>>) -> Result<Value, InvenTreeError> {
        self.status_update(StatusAction::Finish, data, true).await
    }
}
