//! Capability traits for entity types
//!
//! Each trait is a marker (plus a few constants) implemented by the model
//! types that support the capability on the server. Implementing it unlocks
//! the matching methods on [`crate::models::Entity`].

mod attachment;
mod barcode;
mod bulk_delete;
mod image;
mod label;
mod metadata;
mod report;
mod status;
mod template;

pub use attachment::Attachments;
pub use barcode::{Barcode, scan_barcode};
pub use bulk_delete::BulkDelete;
pub use image::Image;
pub use label::{LabelPrinting, PrintOutput};
pub use metadata::Metadata;
pub use report::ReportPrinting;
pub use status::{Status, StatusAction};
pub use template::{TEMPLATE_UPLOAD_API_VERSION, Template};
