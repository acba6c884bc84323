//! Driver registry
//!
//! Built once at start-up from the known driver implementations. Lookups by
//! key return `None` for unknown keys so the orchestrator can skip the
//! provider instead of failing the request.

use super::http::HttpClient;
use super::shipping::{FlatRateShippingDriver, ZoneShippingDriver, J3_SHIPPING_KEY};
use super::webhook::{GenericWebhookDriver, NOTIFICATION_WEBHOOK_KEY};
use super::ServiceDriver;
use crate::error::{Result, RuntimeError};
use atelie_core::ServiceType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn ServiceDriver>>,
}

impl DriverRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in driver
    ///
    /// - `generic.webhook`, `notification.webhook`
    /// - `shipping.zone`, `shipping.j3`, `shipping.flat_rate`
    pub fn with_builtin_drivers(http: Arc<dyn HttpClient>) -> Self {
        Self::new()
            .with_driver(Arc::new(GenericWebhookDriver::new(http.clone())))
            .with_driver(Arc::new(GenericWebhookDriver::for_service(
                NOTIFICATION_WEBHOOK_KEY,
                ServiceType::Notification,
                http,
            )))
            .with_driver(Arc::new(ZoneShippingDriver::new()))
            .with_driver(Arc::new(ZoneShippingDriver::with_key(J3_SHIPPING_KEY)))
            .with_driver(Arc::new(FlatRateShippingDriver::new()))
    }

    /// Register a driver; its key must not be taken yet
    pub fn register(&mut self, driver: Arc<dyn ServiceDriver>) -> Result<()> {
        let key = driver.driver_key().to_string();
        if self.drivers.contains_key(&key) {
            return Err(RuntimeError::DuplicateDriver(key));
        }
        self.drivers.insert(key, driver);
        Ok(())
    }

    /// Builder-style registration; replaces a driver already under the same key
    pub fn with_driver(mut self, driver: Arc<dyn ServiceDriver>) -> Self {
        let key = driver.driver_key().to_string();
        if self.drivers.insert(key.clone(), driver).is_some() {
            tracing::debug!("Driver '{}' replaced", key);
        }
        self
    }

    pub fn find_by_driver_key(&self, driver_key: &str) -> Option<Arc<dyn ServiceDriver>> {
        self.drivers.get(driver_key).cloned()
    }

    /// Registered keys, sorted
    pub fn driver_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.driver_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::http::{HttpSettings, ReqwestHttpClient};
    use crate::driver::{FLAT_RATE_SHIPPING_KEY, GENERIC_WEBHOOK_KEY, ZONE_SHIPPING_KEY};

    fn builtin() -> DriverRegistry {
        let http = ReqwestHttpClient::new(HttpSettings::default()).unwrap();
        DriverRegistry::with_builtin_drivers(Arc::new(http))
    }

    #[test]
    fn test_builtin_keys() {
        let registry = builtin();
        assert_eq!(
            registry.driver_keys(),
            vec![
                GENERIC_WEBHOOK_KEY,
                NOTIFICATION_WEBHOOK_KEY,
                FLAT_RATE_SHIPPING_KEY,
                J3_SHIPPING_KEY,
                ZONE_SHIPPING_KEY,
            ]
        );
    }

    #[test]
    fn test_lookup() {
        let registry = builtin();
        let driver = registry.find_by_driver_key(J3_SHIPPING_KEY).unwrap();
        assert_eq!(driver.service_type(), ServiceType::Shipping);
        assert!(registry.find_by_driver_key("shipping.unknown").is_none());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FlatRateShippingDriver::new())).unwrap();

        let err = registry
            .register(Arc::new(FlatRateShippingDriver::new()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateDriver(key) if key == FLAT_RATE_SHIPPING_KEY));
        assert_eq!(registry.len(), 1);
    }
}
