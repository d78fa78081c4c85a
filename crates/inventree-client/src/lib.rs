//! InvenTree REST API Client
//!
//! A Rust client library for the InvenTree inventory management REST API.
//! Server records are exposed as typed proxies ([`Part`], [`StockItem`],
//! [`PurchaseOrder`], ...) over a shared transport.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inventree_client::{ClientConfig, InvenTreeClient, Part, SharedClient, StockItem};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Connect (checks the server and the credentials)
//! let config = ClientConfig::new("http://inventree.local:8000")
//!     .with_basic_auth("admin", "inventree");
//! let api: SharedClient = Arc::new(InvenTreeClient::connect(config).await?);
//!
//! // Query parts
//! let parts = Part::list(&api, &[("active", "true")]).await?;
//!
//! // Follow relationships and update a record
//! let mut item = StockItem::with_pk(&api, 42).await?;
//! let part = item.part().await?;
//! item.set("notes", format!("Checked against {}", part))?;
//! item.save().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Model proxies**: list, fetch, create, save, reload and delete records
//! - **Capabilities**: metadata, attachments, images, barcodes, status
//!   transitions, label and report printing
//! - **Version aware**: every model checks the server api version it needs
//! - **Testing**: [`MockInvenTreeClient`] (feature `test-util`) serves an
//!   in-memory InvenTree API

pub mod client;
pub mod common;
pub mod config;
pub mod error;
#[path = "trait.rs"]
pub mod inventree_trait;
pub mod mixins;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod models;

pub use client::InvenTreeClient;
pub use common::{ApiRequest, ApiResponse, ListResponse, Method, PrintProtocol, UploadFile};
pub use config::{ClientConfig, Credentials};
pub use error::{HttpErrorDetail, InvenTreeError};
pub use inventree_trait::{InvenTreeClientTrait, SharedClient};
pub use mixins::{PrintOutput, StatusAction, scan_barcode};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockInvenTreeClient, RecordedRequest};
pub use models::*;
