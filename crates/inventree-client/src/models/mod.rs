//! InvenTree entity types
//!
//! Every entity type is a zero-sized marker implementing [`Model`], and a
//! type alias over [`Entity`] (e.g. [`Part`] is `Entity<PartModel>`).
//! Capabilities such as metadata or attachments are attached by
//! implementing the traits in [`crate::mixins`] for the marker.

/// Declare a marker type, its [`Model`] impl and the entity alias
macro_rules! model {
    (
        $(#[$meta:meta])*
        $alias:ident($marker:ident) => $url:literal
        $(, model_type = $model_type:literal)?
        $(, min_api = $min:literal)?
        $(, max_api = $max:literal)?
        $(,)?
    ) => {
        #[doc = concat!("Marker for [`", stringify!($alias), "`]")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $marker;

        impl $crate::models::Model for $marker {
            const URL: &'static str = $url;
            const NAME: &'static str = stringify!($alias);
            $(const MODEL_TYPE: Option<&'static str> = Some($model_type);)?
            $(const MIN_API_VERSION: Option<u32> = Some($min);)?
            $(const MAX_API_VERSION: Option<u32> = Some($max);)?
        }

        $(#[$meta])*
        pub type $alias = $crate::models::Entity<$marker>;
    };
}

pub(crate) use model;

/// Order status shortcuts (issue, hold, cancel, complete) for an entity alias
macro_rules! order_status_helpers {
    ($alias:ident) => {
        impl $alias {
            /// Issue (send) this order
            pub async fn issue(&mut self) -> Result<serde_json::Value, $crate::error::InvenTreeError> {
                self.status_update($crate::mixins::StatusAction::Issue, None, true).await
            }

            /// Place this order on hold
            pub async fn hold(&mut self) -> Result<serde_json::Value, $crate::error::InvenTreeError> {
                self.status_update($crate::mixins::StatusAction::Hold, None, true).await
            }

            /// Cancel this order
            pub async fn cancel(&mut self) -> Result<serde_json::Value, $crate::error::InvenTreeError> {
                self.status_update($crate::mixins::StatusAction::Cancel, None, true).await
            }

            /// Mark this order as complete
            pub async fn complete(&mut self) -> Result<serde_json::Value, $crate::error::InvenTreeError> {
                self.status_update($crate::mixins::StatusAction::Complete, None, true).await
            }

            /// Order reference, e.g. "PO-0042"
            pub fn order_reference(&self) -> Option<&str> {
                self.str_field("reference")
            }
        }
    };
}

pub(crate) use order_status_helpers;

mod entity;

pub mod attachment;
pub mod build;
pub mod company;
pub mod currency;
pub mod label;
pub mod part;
pub mod plugin;
pub mod project_code;
pub mod purchase_order;
pub mod report;
pub mod return_order;
pub mod sales_order;
pub mod stock;
pub mod user;

pub use entity::{Entity, EntityRef, Model, PkKind, PrimaryKey, SaveMethod, check_api_version};

pub use attachment::{Attachment, AttachmentModel};
pub use build::{Build, BuildModel};
pub use company::*;
pub use currency::CurrencyManager;
pub use label::*;
pub use part::*;
pub use plugin::{InvenTreePlugin, PluginModel};
pub use project_code::{ProjectCode, ProjectCodeModel};
pub use purchase_order::*;
pub use report::*;
pub use return_order::*;
pub use sales_order::*;
pub use stock::*;
pub use user::{User, UserModel};

/// JSON object from key/value pairs, for request bodies
pub(crate) fn object<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> serde_json::Map<String, serde_json::Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
