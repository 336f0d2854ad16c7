//! Shipping address value object.

use serde::{Deserialize, Serialize};

/// Immutable shipping-address snapshot captured at order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip_without_optional_fields() {
        let address = ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            address_line1: "12 Analytical Way".to_string(),
            address_line2: None,
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "EC1A".to_string(),
            country: "UK".to_string(),
            phone_number: None,
        };

        let json = serde_json::to_string(&address).unwrap();
        assert!(json.contains("fullName"));
        assert!(!json.contains("addressLine2"));
        let back: ShippingAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
