//! Order and build state transitions

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::InvenTreeError;
use crate::models::{Entity, Model, check_api_version};

/// Transitions accepted by `{url}/{pk}/{action}/` endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAction {
    /// Mark complete
    Complete,
    /// Cancel
    Cancel,
    /// Place on hold
    Hold,
    /// Ship (sales order shipments)
    Ship,
    /// Issue (send to supplier or customer)
    Issue,
    /// Finish (build orders)
    Finish,
}

impl StatusAction {
    /// Every supported action
    pub const ALL: [StatusAction; 6] = [
        Self::Complete,
        Self::Cancel,
        Self::Hold,
        Self::Ship,
        Self::Issue,
        Self::Finish,
    ];

    /// Endpoint segment for this action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Hold => "hold",
            Self::Ship => "ship",
            Self::Issue => "issue",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusAction {
    type Err = InvenTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| InvenTreeError::InvalidStatus(s.to_string()))
    }
}

/// Models with status transition endpoints
pub trait Status: Model {}

impl<M: Status> Entity<M> {
    /// POST a status transition and optionally reload the record
    pub async fn status_update(
        &mut self,
        action: StatusAction,
        data: Option<Map<String, Value>>,
        reload: bool,
    ) -> Result<Value, InvenTreeError> {
        check_api_version::<M>(self.api().api_version())?;

        debug!("{} status update: {}", self, action);
        let response = self
            .post_action(action.as_str(), Value::Object(data.unwrap_or_default()))
            .await?;

        if reload {
            self.reload().await?;
        }

        Ok(response)
    }

    /// Status transition named by a string
    ///
    /// Names outside the supported vocabulary fail before any request is made.
    pub async fn status_update_named(
        &mut self,
        action: &str,
        data: Option<Map<String, Value>>,
        reload: bool,
    ) -> Result<Value, InvenTreeError> {
        let action: StatusAction = action.parse()?;
        self.status_update(action, data, reload).await
    }
}
