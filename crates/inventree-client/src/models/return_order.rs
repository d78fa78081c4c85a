//! Return orders

use serde_json::{Map, Value};

use super::{Company, Contact, StockItem, model, order_status_helpers};
use crate::error::InvenTreeError;
use crate::mixins::{Attachments, Metadata, ReportPrinting, Status};

model! {
    /// Return order
    ReturnOrder(ReturnOrderModel) => "order/ro", model_type = "returnorder", min_api = 104
}

model! {
    /// Return order line (a stock item being returned)
    ReturnOrderLineItem(ReturnOrderLineItemModel) => "order/ro-line/", min_api = 104
}

model! {
    /// Return order line not tied to stock
    ReturnOrderExtraLineItem(ReturnOrderExtraLineItemModel) => "order/ro-extra-line/", min_api = 104
}

impl Metadata for ReturnOrderModel {}
impl Attachments for ReturnOrderModel {}
impl Status for ReturnOrderModel {}

impl ReportPrinting for ReturnOrderModel {
    const REPORT_NAME: &'static str = "ro";
    const REPORT_ITEM: &'static str = "order";
}

order_status_helpers!(ReturnOrder);

impl ReturnOrder {
    /// The customer returning the goods
    pub async fn customer(&self) -> Result<Company, InvenTreeError> {
        self.related_required("customer").await
    }

    /// The customer contact, if set
    pub async fn contact(&self) -> Result<Option<Contact>, InvenTreeError> {
        self.related("contact").await
    }

    /// Line items of this order
    pub async fn line_items(&self, filters: &[(&str, &str)]) -> Result<Vec<ReturnOrderLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Extra line items of this order
    pub async fn extra_line_items(&self, filters: &[(&str, &str)]) -> Result<Vec<ReturnOrderExtraLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Create a line item against this order
    pub async fn add_line_item(&self, mut data: Map<String, Value>) -> Result<ReturnOrderLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        ReturnOrderLineItem::create(self.api(), data).await
    }

    /// Create an extra line item against this order
    pub async fn add_extra_line_item(
        &self,
        mut data: Map<String, Value>,
    ) -> Result<ReturnOrderExtraLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        ReturnOrderExtraLineItem::create(self.api(), data).await
    }
}

impl ReturnOrderLineItem {
    /// The order this line belongs to
    pub async fn order(&self) -> Result<ReturnOrder, InvenTreeError> {
        self.related_required("order").await
    }

    /// The stock item being returned
    pub async fn stock_item(&self) -> Result<StockItem, InvenTreeError> {
        self.related_required("item").await
    }
}

impl ReturnOrderExtraLineItem {
    pub async fn order(&self) -> Result<ReturnOrder, InvenTreeError> {
        self.related_required("order").await
    }
}
