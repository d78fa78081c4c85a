//! Currency exchange data

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tracing::{error, warn};

use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;

const CURRENCY_ENDPOINT: &str = "currency/exchange/";
const REFRESH_ENDPOINT: &str = "currency/refresh/";

/// Api version exposing exchange rate data
pub const CURRENCY_API_VERSION: u32 = 92;
/// Api version allowing a manual exchange rate refresh
pub const CURRENCY_REFRESH_API_VERSION: u32 = 93;

/// Cached view of the server's currency settings
#[derive(Clone)]
pub struct CurrencyManager {
    api: SharedClient,
    base_currency: Option<String>,
    exchange_rates: Option<Map<String, Value>>,
    updated: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for CurrencyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyManager")
            .field("base_currency", &self.base_currency)
            .field("exchange_rates", &self.exchange_rates)
            .field("updated", &self.updated)
            .finish()
    }
}

impl CurrencyManager {
    /// Manager with an empty cache; nothing is fetched until first use
    pub fn new(api: &SharedClient) -> Self {
        Self {
            api: api.clone(),
            base_currency: None,
            exchange_rates: None,
            updated: None,
        }
    }

    /// Ask the server to refresh its rates from the external provider
    pub async fn refresh_exchange_rates(&self) -> Result<Value, InvenTreeError> {
        require_api_version(self.api.api_version(), CURRENCY_REFRESH_API_VERSION, "manual exchange rate updates")?;
        self.api.post(REFRESH_ENDPOINT, json!({})).await
    }

    /// Fetch base currency and exchange rates from the server
    pub async fn update_from_server(&mut self) -> Result<(), InvenTreeError> {
        require_api_version(self.api.api_version(), CURRENCY_API_VERSION, "currency support")?;

        let response = self.api.get(CURRENCY_ENDPOINT, &[]).await?;
        if response.is_null() {
            error!("Could not retrieve currency data from InvenTree server");
            return Ok(());
        }

        self.base_currency = response
            .get("base_currency")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.exchange_rates = response.get("exchange_rates").and_then(Value::as_object).cloned();
        self.updated = Some(Utc::now());

        if self.base_currency.is_none() {
            warn!("'base_currency' missing from server response");
        }
        if self.exchange_rates.is_none() {
            warn!("'exchange_rates' missing from server response");
        }

        Ok(())
    }

    /// Base currency code (e.g. "USD")
    ///
    /// With `cache` set the server is only queried when nothing is cached.
    pub async fn base_currency(&mut self, cache: bool) -> Result<Option<String>, InvenTreeError> {
        if !cache || self.base_currency.as_deref().is_none_or(str::is_empty) {
            self.update_from_server().await?;
        }
        Ok(self.base_currency.clone())
    }

    /// Exchange rates relative to the base currency
    pub async fn exchange_rates(&mut self, cache: bool) -> Result<Option<Map<String, Value>>, InvenTreeError> {
        if !cache || self.exchange_rates.as_ref().is_none_or(Map::is_empty) {
            self.update_from_server().await?;
        }
        Ok(self.exchange_rates.clone())
    }

    /// Rate for a single currency code, if the server reports one
    pub async fn exchange_rate(&mut self, currency: &str) -> Result<Option<f64>, InvenTreeError> {
        let rates = self.exchange_rates(true).await?;
        Ok(rates.and_then(|r| r.get(currency).and_then(Value::as_f64)))
    }

    /// When rates were last fetched by this manager
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }
}

fn require_api_version(api_version: u32, required: u32, feature: &str) -> Result<(), InvenTreeError> {
    if api_version < required {
        return Err(InvenTreeError::UnsupportedModel {
            model: "CurrencyManager",
            api_version,
            requirement: format!("{} requires API version >= {}", feature, required),
        });
    }
    Ok(())
}
