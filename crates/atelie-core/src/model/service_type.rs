//! Service capabilities a provider can serve

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of service capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Shipping,
    Payment,
    Notification,
    Marketplace,
    Fiscal,
    /// Drivers declaring `Generic` can serve any other type
    Generic,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::Shipping,
        ServiceType::Payment,
        ServiceType::Notification,
        ServiceType::Marketplace,
        ServiceType::Fiscal,
        ServiceType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Shipping => "SHIPPING",
            ServiceType::Payment => "PAYMENT",
            ServiceType::Notification => "NOTIFICATION",
            ServiceType::Marketplace => "MARKETPLACE",
            ServiceType::Fiscal => "FISCAL",
            ServiceType::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownServiceType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_parse_case_insensitive() {
        assert_eq!("shipping".parse::<ServiceType>().unwrap(), ServiceType::Shipping);
        assert_eq!(" PAYMENT ".parse::<ServiceType>().unwrap(), ServiceType::Payment);
        assert!("teleport".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_service_type_serde_uses_upper_case() {
        let json = serde_json::to_string(&ServiceType::Notification).unwrap();
        assert_eq!(json, "\"NOTIFICATION\"");

        let parsed: ServiceType = serde_json::from_str("\"MARKETPLACE\"").unwrap();
        assert_eq!(parsed, ServiceType::Marketplace);
    }
}
