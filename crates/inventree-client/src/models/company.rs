//! Companies, contacts, supplier and manufacturer parts

use super::{Part, model};
use crate::error::InvenTreeError;
use crate::mixins::{Attachments, Barcode, Image, Metadata};

model! {
    /// Company (supplier, manufacturer or customer)
    Company(CompanyModel) => "company", model_type = "company"
}

model! {
    /// Contact person at a company
    Contact(ContactModel) => "company/contact"
}

model! {
    /// Part as sold by a supplier
    SupplierPart(SupplierPartModel) => "company/part", model_type = "supplierpart"
}

model! {
    /// Part as made by a manufacturer
    ManufacturerPart(ManufacturerPartModel) => "company/part/manufacturer", model_type = "manufacturerpart"
}

model! {
    /// Parameter value attached to a manufacturer part
    ManufacturerPartParameter(ManufacturerPartParameterModel) => "company/part/manufacturer/parameter"
}

model! {
    /// Quantity price break for a supplier part
    SupplierPriceBreak(SupplierPriceBreakModel) => "company/price-break"
}

impl Metadata for CompanyModel {}
impl Metadata for ContactModel {}
impl Metadata for SupplierPartModel {}
impl Metadata for ManufacturerPartModel {}

impl Attachments for CompanyModel {}
impl Attachments for ManufacturerPartModel {}
impl Image for CompanyModel {}

impl Barcode for SupplierPartModel {
    const BARCODE_MODEL_TYPE: &'static str = "supplierpart";
}

impl Company {
    /// Company name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Whether the company supplies parts
    pub fn is_supplier(&self) -> bool {
        self.bool_field("is_supplier").unwrap_or(false)
    }

    /// Whether the company buys from us
    pub fn is_customer(&self) -> bool {
        self.bool_field("is_customer").unwrap_or(false)
    }

    /// Whether the company manufactures parts
    pub fn is_manufacturer(&self) -> bool {
        self.bool_field("is_manufacturer").unwrap_or(false)
    }

    /// Parts supplied by this company
    pub async fn supplier_parts(&self, filters: &[(&str, &str)]) -> Result<Vec<SupplierPart>, InvenTreeError> {
        self.children("supplier", filters).await
    }

    /// Parts made by this company
    pub async fn manufactured_parts(&self, filters: &[(&str, &str)]) -> Result<Vec<ManufacturerPart>, InvenTreeError> {
        self.children("manufacturer", filters).await
    }

    /// Contacts at this company
    pub async fn contacts(&self) -> Result<Vec<Contact>, InvenTreeError> {
        self.children("company", &[]).await
    }
}

impl Contact {
    /// Contact name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Company this contact belongs to
    pub async fn company(&self) -> Result<Company, InvenTreeError> {
        self.related_required("company").await
    }
}

impl SupplierPart {
    /// Supplier's stock keeping unit
    pub fn sku(&self) -> Option<&str> {
        self.str_field("SKU")
    }

    /// Price breaks for this supplier part
    pub async fn price_breaks(&self) -> Result<Vec<SupplierPriceBreak>, InvenTreeError> {
        self.children("part", &[]).await
    }

    /// The internal part
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// The supplying company
    pub async fn supplier(&self) -> Result<Company, InvenTreeError> {
        self.related_required("supplier").await
    }

    /// The manufacturer part, if linked
    pub async fn manufacturer_part(&self) -> Result<Option<ManufacturerPart>, InvenTreeError> {
        self.related("manufacturer_part").await
    }
}

impl ManufacturerPart {
    /// Manufacturer part number
    pub fn mpn(&self) -> Option<&str> {
        self.str_field("MPN")
    }

    /// The internal part
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// The manufacturing company
    pub async fn manufacturer(&self) -> Result<Company, InvenTreeError> {
        self.related_required("manufacturer").await
    }

    /// Parameters attached to this manufacturer part
    pub async fn parameters(&self) -> Result<Vec<ManufacturerPartParameter>, InvenTreeError> {
        self.children("manufacturer_part", &[]).await
    }
}

impl SupplierPriceBreak {
    /// Minimum quantity for this price
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// Unit price (servers report it as a decimal string)
    pub fn price(&self) -> Option<f64> {
        self.f64_field("price")
    }
}
