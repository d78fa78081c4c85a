//! Label templates
//!
//! Servers from api version 201 keep every label template in a single
//! `label/template` collection filtered by model type. Older servers split
//! them per label type.

use super::model;
use crate::mixins::{Metadata, Template};

model! {
    /// Label template (api 201 and newer)
    LabelTemplate(LabelTemplateModel) => "label/template", min_api = 201
}

model! {
    /// Legacy part label template
    LabelPart(LabelPartModel) => "label/part", max_api = 201
}

model! {
    /// Legacy stock item label template
    LabelStock(LabelStockModel) => "label/stock", max_api = 201
}

model! {
    /// Legacy stock location label template
    LabelLocation(LabelLocationModel) => "label/location", max_api = 201
}

impl Metadata for LabelTemplateModel {}
impl Metadata for LabelPartModel {}
impl Metadata for LabelStockModel {}
impl Metadata for LabelLocationModel {}

impl Template for LabelTemplateModel {
    const TEMPLATE_FIELD: &'static str = "template";
}

impl Template for LabelPartModel {
    const TEMPLATE_FIELD: &'static str = "label";
}

impl Template for LabelStockModel {
    const TEMPLATE_FIELD: &'static str = "label";
}

impl Template for LabelLocationModel {
    const TEMPLATE_FIELD: &'static str = "label";
}

impl LabelTemplate {
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Model type the template renders (e.g. "part")
    pub fn model_type(&self) -> Option<&str> {
        self.str_field("model_type")
    }

    pub fn enabled(&self) -> bool {
        self.bool_field("enabled").unwrap_or(true)
    }
}
