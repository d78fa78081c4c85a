//! Part, category, BOM, pricing and parameter models

use serde_json::{Value, json};

use super::{Build, Entity, ManufacturerPart, Model, StockItem, SupplierPart, model, object};
use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::mixins::{Attachments, Barcode, Image, LabelPrinting, Metadata};

model! {
    /// Link between a [`ParameterTemplate`] and a [`PartCategory`]
    PartCategoryParameterTemplate(PartCategoryParameterTemplateModel) => "part/category/parameters"
}

model! {
    /// Part category
    PartCategory(PartCategoryModel) => "part/category", model_type = "partcategory"
}

model! {
    /// Part
    Part(PartModel) => "part", model_type = "part"
}

model! {
    /// Test template defined against a part
    PartTestTemplate(PartTestTemplateModel) => "part/test-template"
}

model! {
    /// Bill of materials line
    BomItem(BomItemModel) => "bom"
}

model! {
    /// Substitute part for a BOM line
    BomItemSubstitute(BomItemSubstituteModel) => "bom/substitute"
}

model! {
    /// Internal price break
    InternalPrice(InternalPriceModel) => "part/internal-price"
}

model! {
    /// Sale price break
    SalePrice(SalePriceModel) => "part/sale-price"
}

model! {
    /// Relationship between two parts
    PartRelated(PartRelatedModel) => "part/related"
}

model! {
    /// Parameter value attached to a part
    Parameter(ParameterModel) => "part/parameter"
}

model! {
    /// Parameter definition (name and units)
    ParameterTemplate(ParameterTemplateModel) => "part/parameter/template"
}

impl Metadata for PartCategoryModel {}
impl Metadata for PartModel {}
impl Metadata for PartTestTemplateModel {}
impl Metadata for BomItemModel {}
impl Metadata for BomItemSubstituteModel {}

impl Attachments for PartModel {}
impl Image for PartModel {}

impl Barcode for PartModel {
    const BARCODE_MODEL_TYPE: &'static str = "part";
}

impl LabelPrinting for PartModel {
    const LABEL_NAME: &'static str = "part";
    const LABEL_ITEM: &'static str = "parts";
}

impl PartCategoryParameterTemplate {
    /// The category this template applies to
    pub async fn category(&self) -> Result<PartCategory, InvenTreeError> {
        self.related_required("category").await
    }

    /// The referenced parameter template
    pub async fn template(&self) -> Result<ParameterTemplate, InvenTreeError> {
        self.related_required("parameter_template").await
    }
}

impl PartCategory {
    /// Category name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Category path, e.g. "Electronics/Passives"
    pub fn pathstring(&self) -> Option<&str> {
        self.str_field("pathstring")
    }

    /// Parts in this category
    pub async fn parts(&self, filters: &[(&str, &str)]) -> Result<Vec<Part>, InvenTreeError> {
        self.children("category", filters).await
    }

    /// Parent category, if any
    pub async fn parent(&self) -> Result<Option<PartCategory>, InvenTreeError> {
        self.related("parent").await
    }

    /// Direct child categories
    pub async fn child_categories(&self, filters: &[(&str, &str)]) -> Result<Vec<PartCategory>, InvenTreeError> {
        self.children("parent", filters).await
    }

    /// Default parameter templates for this category
    ///
    /// With `fetch_parent` templates of parent categories are included.
    pub async fn category_parameter_templates(
        &self,
        fetch_parent: bool,
    ) -> Result<Vec<PartCategoryParameterTemplate>, InvenTreeError> {
        let fetch_parent = fetch_parent.to_string();
        self.children("category", &[("fetch_parent", fetch_parent.as_str())])
            .await
    }
}

impl Part {
    /// Part name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Part description
    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    /// Internal part number
    pub fn ipn(&self) -> Option<&str> {
        self.str_field("IPN")
    }

    /// Whether the part is active
    pub fn active(&self) -> bool {
        self.bool_field("active").unwrap_or(false)
    }

    /// Whether the part can be made from other parts
    pub fn assembly(&self) -> bool {
        self.bool_field("assembly").unwrap_or(false)
    }

    /// Whether the part can be used in assemblies
    pub fn component(&self) -> bool {
        self.bool_field("component").unwrap_or(false)
    }

    /// Whether the part can be bought from suppliers
    pub fn purchaseable(&self) -> bool {
        self.bool_field("purchaseable").unwrap_or(false)
    }

    /// Quantity in stock
    pub fn in_stock(&self) -> Option<f64> {
        self.f64_field("in_stock")
    }

    /// Id of the part's category
    pub fn category_id(&self) -> Option<u64> {
        self.u64_field("category")
    }

    /// The part's category
    pub async fn category(&self) -> Result<Option<PartCategory>, InvenTreeError> {
        self.related("category").await
    }

    /// Test templates defined for this part
    pub async fn test_templates(&self) -> Result<Vec<PartTestTemplate>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// Supplier parts (empty when the part is not purchaseable)
    pub async fn supplier_parts(&self) -> Result<Vec<SupplierPart>, InvenTreeError> {
        if !self.purchaseable() {
            return Ok(Vec::new());
        }
        self.children("part", &[]).await
    }

    /// Manufacturer parts
    pub async fn manufacturer_parts(&self) -> Result<Vec<ManufacturerPart>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// BOM lines required to make this part
    pub async fn bom_items(&self, filters: &[(&str, &str)]) -> Result<Vec<BomItem>, InvenTreeError> {
        self.children("part", filters).await
    }

    /// BOM lines of assemblies that use this part
    pub async fn used_in(&self) -> Result<Vec<BomItem>, InvenTreeError> {
        Entity::<BomItemModel>::list(self.api(), &[("uses", self.pk().to_string().as_str())]).await
    }

    /// Build orders for this part
    pub async fn builds(&self, filters: &[(&str, &str)]) -> Result<Vec<Build>, InvenTreeError> {
        self.children("part", filters).await
    }

    /// Stock items of this part
    pub async fn stock_items(&self, filters: &[(&str, &str)]) -> Result<Vec<StockItem>, InvenTreeError> {
        self.children("part", filters).await
    }

    /// Parameters attached to this part
    pub async fn parameters(&self) -> Result<Vec<Parameter>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// Parts related to this one
    pub async fn related_parts(&self) -> Result<Vec<PartRelated>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// Internal price breaks
    pub async fn internal_prices(&self) -> Result<Vec<InternalPrice>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// Set an internal price break for this part
    pub async fn set_internal_price(&self, quantity: u64, price: f64) -> Result<Value, InvenTreeError> {
        InternalPrice::set_internal_price(self.api(), self.pk().to_value(), quantity, price).await
    }

    /// Sale price of the first price break, if any
    pub async fn sale_price(&self) -> Result<Option<Value>, InvenTreeError> {
        let prices: Vec<SalePrice> = self.children("part", &[]).await?;
        Ok(prices.first().and_then(|p| p.get("price")).cloned())
    }

    /// Stock requirement figures from the `requirements/` endpoint
    pub async fn requirements(&self) -> Result<Value, InvenTreeError> {
        let url = format!("{}requirements/", self.url());
        self.api().get(&url, &[]).await
    }
}

impl PartTestTemplate {
    /// Derive a test key from a test name
    ///
    /// Lower case, with anything that is not an ASCII letter or digit removed.
    pub fn generate_test_key(test_name: &str) -> String {
        test_name
            .trim()
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    }

    /// Test name
    pub fn test_name(&self) -> Option<&str> {
        self.str_field("test_name")
    }

    /// Key of this test; older servers do not report one, so it is derived
    pub fn test_key(&self) -> String {
        match self.str_field("key") {
            Some(key) => key.to_string(),
            None => Self::generate_test_key(self.test_name().unwrap_or_default()),
        }
    }

    /// Whether the test must pass
    pub fn required(&self) -> bool {
        self.bool_field("required").unwrap_or(false)
    }
}

impl BomItem {
    /// Quantity of the sub part per assembly
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// The assembly this line belongs to
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// The component part
    pub async fn sub_part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("sub_part").await
    }

    /// Substitutes registered for this line
    pub async fn substitutes(&self) -> Result<Vec<BomItemSubstitute>, InvenTreeError> {
        self.children("bom_item", &[]).await
    }
}

impl InternalPrice {
    /// Create an internal price break
    pub async fn set_internal_price(
        api: &SharedClient,
        part: impl Into<Value>,
        quantity: u64,
        price: f64,
    ) -> Result<Value, InvenTreeError> {
        let data = object([
            ("part", part.into()),
            ("quantity", json!(quantity)),
            ("price", json!(price)),
        ]);
        api.post(&InternalPriceModel::collection_url(), Value::Object(data)).await
    }
}

impl SalePrice {
    /// Create a sale price break
    pub async fn set_sale_price(
        api: &SharedClient,
        part: impl Into<Value>,
        quantity: u64,
        price: f64,
        price_currency: &str,
    ) -> Result<Value, InvenTreeError> {
        let data = object([
            ("part", part.into()),
            ("quantity", json!(quantity)),
            ("price", json!(price)),
            ("price_currency", json!(price_currency)),
        ]);
        api.post(&SalePriceModel::collection_url(), Value::Object(data)).await
    }
}

impl PartRelated {
    /// Relate two parts
    pub async fn add_related(api: &SharedClient, part_1: u64, part_2: u64) -> Result<Value, InvenTreeError> {
        let data = object([("part_1", json!(part_1)), ("part_2", json!(part_2))]);
        api.post(&PartRelatedModel::collection_url(), Value::Object(data)).await
    }
}

impl Parameter {
    /// Parameter value as entered
    pub fn value(&self) -> Option<&str> {
        self.str_field("data")
    }

    /// Units from the parameter template
    pub fn units(&self) -> Result<&str, InvenTreeError> {
        self.field("template_detail")?
            .get("units")
            .and_then(Value::as_str)
            .ok_or_else(|| InvenTreeError::KeyNotFound("template_detail.units".to_string()))
    }
}

impl ParameterTemplate {
    /// Template name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Units of measure
    pub fn units(&self) -> Option<&str> {
        self.str_field("units")
    }
}
