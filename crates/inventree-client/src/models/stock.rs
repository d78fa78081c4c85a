//! Stock locations, stock items, tracking and test results

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::{Model, Part, PartTestTemplate, model};
use crate::common::UploadFile;
use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::mixins::{Attachments, Barcode, BulkDelete, LabelPrinting, Metadata, ReportPrinting};

model! {
    /// Stock location
    StockLocation(StockLocationModel) => "stock/location", model_type = "stocklocation"
}

model! {
    /// Stock item
    StockItem(StockItemModel) => "stock", model_type = "stockitem"
}

model! {
    /// Stock history entry
    StockItemTracking(StockItemTrackingModel) => "stock/track"
}

model! {
    /// Test result recorded against a stock item
    StockItemTestResult(StockItemTestResultModel) => "stock/test", model_type = "stockitem"
}

impl Metadata for StockLocationModel {}
impl Metadata for StockItemModel {}
impl Metadata for StockItemTestResultModel {}

impl Attachments for StockItemModel {}
impl BulkDelete for StockItemModel {}
impl BulkDelete for StockItemTestResultModel {}

impl Barcode for StockLocationModel {
    const BARCODE_MODEL_TYPE: &'static str = "stocklocation";
}

impl Barcode for StockItemModel {
    const BARCODE_MODEL_TYPE: &'static str = "stockitem";
}

impl LabelPrinting for StockLocationModel {
    const LABEL_NAME: &'static str = "location";
    const LABEL_ITEM: &'static str = "locations";
}

impl LabelPrinting for StockItemModel {
    const LABEL_NAME: &'static str = "stock";
    const LABEL_ITEM: &'static str = "items";
}

impl ReportPrinting for StockLocationModel {
    const REPORT_NAME: &'static str = "slr";
    const REPORT_ITEM: &'static str = "location";
}

impl ReportPrinting for StockItemModel {
    const REPORT_NAME: &'static str = "test";
    const REPORT_ITEM: &'static str = "item";
}

/// Stock adjustment actions served at `stock/{action}/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockAdjustment {
    /// Stocktake
    Count,
    /// Add quantity
    Add,
    /// Remove quantity
    Remove,
    /// Move to another location
    Transfer,
    /// Assign to a customer
    Assign,
}

impl StockAdjustment {
    /// Endpoint segment for this action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Transfer => "transfer",
            Self::Assign => "assign",
        }
    }
}

impl fmt::Display for StockAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockAdjustment {
    type Err = InvenTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Self::Count),
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "transfer" => Ok(Self::Transfer),
            "assign" => Ok(Self::Assign),
            other => Err(InvenTreeError::InvalidArgument(format!(
                "Stock adjustment method '{}' not supported",
                other
            ))),
        }
    }
}

impl StockLocation {
    /// Location name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Stock items at this location
    pub async fn stock_items(&self, filters: &[(&str, &str)]) -> Result<Vec<StockItem>, InvenTreeError> {
        self.children("location", filters).await
    }

    /// Parent location, if any
    pub async fn parent(&self) -> Result<Option<StockLocation>, InvenTreeError> {
        self.related("parent").await
    }

    /// Direct child locations
    pub async fn child_locations(&self, filters: &[(&str, &str)]) -> Result<Vec<StockLocation>, InvenTreeError> {
        self.children("parent", filters).await
    }
}

fn item_line(pk: Value, quantity: f64) -> Value {
    json!({ "pk": pk, "quantity": quantity })
}

impl StockItem {
    /// Perform a stock adjustment on several items
    ///
    /// Each entry in `items` is an object with `pk` and `quantity` (or
    /// `item` for assignment).
    pub async fn adjust_stock_items(
        api: &SharedClient,
        method: StockAdjustment,
        items: Vec<Value>,
        mut extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        extra.insert("items".to_string(), Value::Array(items));
        let url = format!("{}{}/", StockItemModel::collection_url(), method);
        api.post(&url, Value::Object(extra)).await
    }

    /// Stocktake for several items
    pub async fn count_stock_items(
        api: &SharedClient,
        items: Vec<Value>,
        extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        Self::adjust_stock_items(api, StockAdjustment::Count, items, extra).await
    }

    /// Add quantity to several items
    pub async fn add_stock_items(
        api: &SharedClient,
        items: Vec<Value>,
        extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        Self::adjust_stock_items(api, StockAdjustment::Add, items, extra).await
    }

    /// Remove quantity from several items
    pub async fn remove_stock_items(
        api: &SharedClient,
        items: Vec<Value>,
        extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        Self::adjust_stock_items(api, StockAdjustment::Remove, items, extra).await
    }

    /// Move several items to a location
    pub async fn transfer_stock_items(
        api: &SharedClient,
        items: Vec<Value>,
        location: u64,
        mut extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        extra.insert("location".to_string(), Value::from(location));
        Self::adjust_stock_items(api, StockAdjustment::Transfer, items, extra).await
    }

    /// Assign several items to a customer company
    pub async fn assign_stock_items(
        api: &SharedClient,
        items: Vec<Value>,
        customer: u64,
        mut extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        extra.insert("customer".to_string(), Value::from(customer));
        Self::adjust_stock_items(api, StockAdjustment::Assign, items, extra).await
    }

    /// Quantity in this item
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// Serial number
    pub fn serial(&self) -> Option<&str> {
        self.str_field("serial")
    }

    /// Batch code
    pub fn batch(&self) -> Option<&str> {
        self.str_field("batch")
    }

    /// Id of the item's part
    pub fn part_id(&self) -> Option<u64> {
        self.u64_field("part")
    }

    /// Id of the item's location
    pub fn location_id(&self) -> Option<u64> {
        self.u64_field("location")
    }

    /// Stocktake this item
    pub async fn count_stock(&self, quantity: f64, extra: Map<String, Value>) -> Result<Value, InvenTreeError> {
        Self::count_stock_items(self.api(), vec![item_line(self.pk().to_value(), quantity)], extra).await
    }

    /// Add quantity to this item
    pub async fn add_stock(&self, quantity: f64, extra: Map<String, Value>) -> Result<Value, InvenTreeError> {
        Self::add_stock_items(self.api(), vec![item_line(self.pk().to_value(), quantity)], extra).await
    }

    /// Remove quantity from this item
    pub async fn remove_stock(&self, quantity: f64, extra: Map<String, Value>) -> Result<Value, InvenTreeError> {
        Self::remove_stock_items(self.api(), vec![item_line(self.pk().to_value(), quantity)], extra).await
    }

    /// Move this item (or part of it) to a location
    ///
    /// Without a quantity the whole item is transferred.
    pub async fn transfer_stock(
        &self,
        location: u64,
        quantity: Option<f64>,
        extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        let quantity = match quantity.or_else(|| self.quantity()) {
            Some(quantity) => quantity,
            None => return Err(InvenTreeError::KeyNotFound("quantity".to_string())),
        };

        Self::transfer_stock_items(
            self.api(),
            vec![item_line(self.pk().to_value(), quantity)],
            location,
            extra,
        )
        .await
    }

    /// Assign this item to a customer company
    pub async fn assign_stock(&self, customer: u64, extra: Map<String, Value>) -> Result<Value, InvenTreeError> {
        // The assign endpoint identifies items by "item", not "pk"
        let items = vec![json!({ "item": self.pk().to_value() })];
        Self::assign_stock_items(self.api(), items, customer, extra).await
    }

    /// Install another stock item into this one
    pub async fn install_stock(
        &self,
        item: u64,
        quantity: f64,
        mut extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        extra.insert("stock_item".to_string(), Value::from(item));
        extra.insert("quantity".to_string(), json!(quantity));
        self.post_action("install", Value::Object(extra)).await
    }

    /// Remove this item from the item it is installed in
    pub async fn uninstall_stock(
        &self,
        location: u64,
        quantity: f64,
        mut extra: Map<String, Value>,
    ) -> Result<Value, InvenTreeError> {
        extra.insert("stock_item".to_string(), self.pk().to_value());
        extra.insert("location".to_string(), Value::from(location));
        extra.insert("quantity".to_string(), json!(quantity));
        self.post_action("uninstall", Value::Object(extra)).await
    }

    /// The part this item is an instance of
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// Current location, if any
    pub async fn location(&self) -> Result<Option<StockLocation>, InvenTreeError> {
        self.related("location").await
    }

    /// History entries for this item
    pub async fn tracking_entries(&self, filters: &[(&str, &str)]) -> Result<Vec<StockItemTracking>, InvenTreeError> {
        self.children("item", filters).await
    }

    /// Test results recorded against this item
    pub async fn test_results(&self, filters: &[(&str, &str)]) -> Result<Vec<StockItemTestResult>, InvenTreeError> {
        self.children("stock_item", filters).await
    }

    /// Record a test result against this item
    pub async fn upload_test_result(&self, result: TestResult) -> Result<Value, InvenTreeError> {
        let pk = self
            .id()
            .ok_or_else(|| InvenTreeError::MissingPrimaryKey(StockItemModel::NAME))?;
        StockItemTestResult::upload_result(self.api(), pk, result).await
    }
}

/// How a test result names its test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestReference {
    /// Test name; the server matches it to a template
    Name(String),
    /// Id of a [`PartTestTemplate`]
    Template(u64),
}

impl From<&str> for TestReference {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<u64> for TestReference {
    fn from(template: u64) -> Self {
        Self::Template(template)
    }
}

/// A test result to upload
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test the result is for
    pub test: TestReference,
    /// Pass or fail
    pub result: bool,
    /// Free text notes
    pub notes: String,
    /// Measured value
    pub value: String,
    /// Optional file attached to the result
    pub attachment: Option<UploadFile>,
}

impl TestResult {
    /// Result for a test
    pub fn new(test: impl Into<TestReference>, result: bool) -> Self {
        Self {
            test: test.into(),
            result,
            notes: String::new(),
            value: String::new(),
            attachment: None,
        }
    }

    /// Add notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Add a measured value
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Attach a file
    pub fn attachment(mut self, file: UploadFile) -> Self {
        self.attachment = Some(UploadFile {
            field: "attachment".to_string(),
            ..file
        });
        self
    }
}

impl StockItemTestResult {
    /// Upload a test result for a stock item
    pub async fn upload_result(api: &SharedClient, stock_item: u64, result: TestResult) -> Result<Value, InvenTreeError> {
        let mut data = Map::new();
        data.insert("stock_item".to_string(), Value::from(stock_item));
        data.insert("result".to_string(), Value::from(result.result));
        data.insert("notes".to_string(), Value::from(result.notes));
        data.insert("value".to_string(), Value::from(result.value));

        let label = match &result.test {
            TestReference::Name(name) => {
                data.insert("test".to_string(), Value::from(name.as_str()));
                name.clone()
            }
            TestReference::Template(id) => {
                data.insert("template".to_string(), Value::from(*id));
                format!("template {}", id)
            }
        };

        let files: Vec<UploadFile> = result.attachment.into_iter().collect();
        let url = StockItemTestResultModel::collection_url();

        let response = if files.is_empty() {
            api.post(&url, Value::Object(data)).await
        } else {
            api.post_files(&url, Value::Object(data), files).await
        };

        match &response {
            Ok(_) => info!("Uploaded test result: '{}'", label),
            Err(e) => warn!("Test upload failed: {}", e),
        }

        response
    }

    /// The test template this result refers to
    pub async fn test_template(&self) -> Result<PartTestTemplate, InvenTreeError> {
        self.related_required("template").await
    }

    /// Key of the referenced test
    pub async fn test_key(&self) -> Result<String, InvenTreeError> {
        Ok(self.test_template().await?.test_key())
    }

    /// Whether the test passed
    pub fn passed(&self) -> bool {
        self.bool_field("result").unwrap_or(false)
    }
}
