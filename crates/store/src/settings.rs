//! Application settings persistence.

use serde::{Deserialize, Serialize};

use salesbook_core::Money;
use salesbook_invoicing::{Governorate, ShippingRates};

use crate::error::{StoreError, StoreResult};
use crate::kv::{KeyValueStore, keys};

pub const DEFAULT_APP_NAME: &str = "SalesBook";

/// Settings passed explicitly into the components that need them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub app_name: String,
    pub shipping_rates: ShippingRates,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            shipping_rates: ShippingRates::new(),
        }
    }
}

/// Reads and writes [`AppSettings`] under their well-known keys.
pub struct SettingsStore<K> {
    kv: K,
}

impl<K: KeyValueStore> SettingsStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Missing keys use defaults; unreadable or corrupt ones are logged and
    /// also fall back to defaults.
    pub async fn load(&self) -> AppSettings {
        let mut settings = AppSettings::default();

        match self.kv.get(keys::APP_NAME).await {
            Ok(Some(name)) if !name.trim().is_empty() => settings.app_name = name,
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "failed to read app name; using default"),
        }

        match self.kv.get(keys::SHIPPING_RATES).await {
            Ok(Some(raw)) => match serde_json::from_str::<ShippingRates>(&raw) {
                Ok(rates) => settings.shipping_rates = rates,
                Err(err) => tracing::error!(error = %err, "failed to parse shipping rates; using none"),
            },
            Ok(None) => {}
            Err(err) => tracing::error!(error = %err, "failed to read shipping rates; using none"),
        }

        settings
    }

    pub async fn save_app_name(&self, name: &str) -> StoreResult<()> {
        self.kv
            .set(keys::APP_NAME, name.trim().to_string())
            .await
            .map_err(|e| StoreError::persistence("save_app_name", e))?;
        tracing::info!(app_name = name.trim(), "app name saved");
        Ok(())
    }

    pub async fn save_shipping_rates(&self, rates: &ShippingRates) -> StoreResult<()> {
        let payload = serde_json::to_string(rates)?;
        self.kv
            .set(keys::SHIPPING_RATES, payload)
            .await
            .map_err(|e| StoreError::persistence("save_shipping_rates", e))?;
        tracing::info!(count = rates.len(), "shipping rates saved");
        Ok(())
    }

    /// Set (or with `None`, clear) one governorate's rate and persist the
    /// table. Returns the updated table.
    pub async fn set_shipping_rate(
        &self,
        governorate: Governorate,
        cost: Option<Money>,
    ) -> StoreResult<ShippingRates> {
        let mut rates = self.load().await.shipping_rates;
        match cost {
            Some(cost) => rates.set_rate(governorate, cost),
            None => {
                rates.remove_rate(governorate);
            }
        }
        self.save_shipping_rates(&rates).await?;
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn defaults_when_nothing_is_stored() {
        let settings = SettingsStore::new(InMemoryKeyValueStore::new()).load().await;
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.app_name, "SalesBook");
    }

    #[tokio::test]
    async fn saves_and_reloads() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = SettingsStore::new(kv.clone());
        store.save_app_name("  Mrs Fashion ").await.unwrap();
        store
            .set_shipping_rate(Governorate::Giza, Some(Money::from_units(40)))
            .await
            .unwrap();
        let rates = store
            .set_shipping_rate(Governorate::Aswan, Some(Money::from_units(90)))
            .await
            .unwrap();
        assert_eq!(rates.len(), 2);

        let reloaded = SettingsStore::new(kv).load().await;
        assert_eq!(reloaded.app_name, "Mrs Fashion");
        assert_eq!(reloaded.shipping_rates.rate(Governorate::Giza), Some(Money::from_units(40)));
        assert_eq!(reloaded.shipping_rates.rate(Governorate::Aswan), Some(Money::from_units(90)));
    }

    #[tokio::test]
    async fn clearing_a_rate_removes_it() {
        let store = SettingsStore::new(InMemoryKeyValueStore::new());
        store
            .set_shipping_rate(Governorate::Cairo, Some(Money::from_units(35)))
            .await
            .unwrap();
        let rates = store.set_shipping_rate(Governorate::Cairo, None).await.unwrap();
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn corrupt_rates_fall_back_to_empty_table() {
        let kv = InMemoryKeyValueStore::new();
        kv.set(keys::SHIPPING_RATES, "[oops".to_string()).await.unwrap();
        kv.set(keys::APP_NAME, "Boutique".to_string()).await.unwrap();
        let settings = SettingsStore::new(kv).load().await;
        assert_eq!(settings.app_name, "Boutique");
        assert!(settings.shipping_rates.is_empty());
    }
}
