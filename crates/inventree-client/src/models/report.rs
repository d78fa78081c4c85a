//! Report templates
//!
//! As with labels, servers from api version 201 use a single
//! `report/template` collection; older ones split templates per report type.

use super::model;
use crate::mixins::{Metadata, Template};

model! {
    /// Report template (api 201 and newer)
    ReportTemplate(ReportTemplateModel) => "report/template", min_api = 201
}

model! {
    /// Legacy bill of materials report
    ReportBoM(ReportBoMModel) => "report/bom", max_api = 201
}

model! {
    /// Legacy build order report
    ReportBuild(ReportBuildModel) => "report/build", max_api = 201
}

model! {
    /// Legacy purchase order report
    ReportPurchaseOrder(ReportPurchaseOrderModel) => "report/po", max_api = 201
}

model! {
    /// Legacy sales order report
    ReportSalesOrder(ReportSalesOrderModel) => "report/so", max_api = 201
}

model! {
    /// Legacy return order report
    ReportReturnOrder(ReportReturnOrderModel) => "report/ro", max_api = 201
}

model! {
    /// Legacy stock location report
    ReportStockLocation(ReportStockLocationModel) => "report/slr", min_api = 128, max_api = 201
}

model! {
    /// Legacy stock item test report
    ReportTest(ReportTestModel) => "report/test", max_api = 201
}

macro_rules! report_template {
    ($($marker:ident),+ $(,)?) => {
        $(
            impl Metadata for $marker {}

            impl Template for $marker {
                const TEMPLATE_FIELD: &'static str = "template";
            }
        )+
    };
}

report_template!(
    ReportTemplateModel,
    ReportBoMModel,
    ReportBuildModel,
    ReportPurchaseOrderModel,
    ReportSalesOrderModel,
    ReportReturnOrderModel,
    ReportStockLocationModel,
    ReportTestModel,
);

impl ReportTemplate {
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Model type the report renders (e.g. "purchaseorder")
    pub fn model_type(&self) -> Option<&str> {
        self.str_field("model_type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Method;
    use crate::error::InvenTreeError;
    use crate::inventree_trait::SharedClient;
    use crate::mixins::PrintOutput;
    use crate::mock::MockInvenTreeClient;
    use crate::models::PurchaseOrder;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_templates_filtered_by_model_type() {
        let mock = MockInvenTreeClient::new("http://inventree.local").with_api_version(250);
        mock.insert("order/po", json!({"pk": 4, "reference": "PO-4"}));
        mock.insert("report/template", json!({"pk": 1, "name": "PO", "model_type": "purchaseorder"}));
        mock.insert("report/template", json!({"pk": 2, "name": "BOM", "model_type": "part"}));
        let api: SharedClient = Arc::new(mock);

        let order = PurchaseOrder::with_pk(&api, 4).await.expect("order");
        let templates = order.get_report_templates(&[]).await.expect("templates");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name(), Some("PO"));
    }

    #[tokio::test]
    async fn test_modern_report_downloads_output() {
        let mock = MockInvenTreeClient::new("http://inventree.local").with_api_version(250);
        mock.insert("order/po", json!({"pk": 4, "reference": "PO-4"}));
        mock.stub(
            Method::Post,
            "report/print/",
            201,
            json!({"pk": 9, "complete": true, "output": "/media/report/po-4.pdf"}),
        );
        mock.add_download("/media/report/po-4.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let api: SharedClient = Arc::new(mock.clone());

        let order = PurchaseOrder::with_pk(&api, 4).await.expect("order");
        let dir = tempfile::tempdir().expect("tempdir");
        let output = order.print_report(1, Some(dir.path()), false).await.expect("print");

        assert_eq!(output, PrintOutput::Downloaded(dir.path().join("po-4.pdf")));
        let request = mock.last_request_to("report/print/").expect("print request");
        assert_eq!(request.json, Some(json!({"template": 1, "items": [4]})));
    }

    #[tokio::test]
    async fn test_legacy_report_downloads_directly() {
        let mock = MockInvenTreeClient::new("http://inventree.local").with_api_version(180);
        mock.insert("order/po", json!({"pk": 4, "reference": "PO-4"}));
        mock.add_download("api/report/po/2/print/", "application/pdf", b"%PDF".to_vec());
        let api: SharedClient = Arc::new(mock.clone());

        let order = PurchaseOrder::with_pk(&api, 4).await.expect("order");

        let err = order.print_report(2, None, false).await.expect_err("destination required");
        assert!(matches!(err, InvenTreeError::InvalidArgument(_)));

        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("po.pdf");
        let output = order.print_report(2, Some(&target), false).await.expect("print");
        assert_eq!(output, PrintOutput::Downloaded(target.clone()));

        let download = mock.last_request().expect("download");
        assert_eq!(download.endpoint, "api/report/po/2/print/");
        assert_eq!(download.params, vec![("order[]".to_string(), "4".to_string())]);
    }
}
