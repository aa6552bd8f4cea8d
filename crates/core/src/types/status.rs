//! Status enums for orders and loyalty activity.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
///
/// The lifecycle itself is driven server-side; the client only displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    /// A status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Lowercase label used in listings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the statuses an admin may set; `unknown` is not one of them.
impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!(
                "unknown status '{other}' (expected placed, confirmed, shipped, delivered or cancelled)"
            )),
        }
    }
}

/// Payment method for an order. Cash on delivery is the only one offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cod,
}

/// Direction of a loyalty points movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardEntryKind {
    Earn,
    Redeem,
    #[serde(other)]
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trip_labels() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.to_string(), "shipped");
    }

    #[test]
    fn test_unknown_order_status_does_not_fail() {
        let status: OrderStatus = serde_json::from_str("\"returned\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[test]
    fn test_payment_method_wire_name() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cod).unwrap(),
            "\"cod\""
        );
    }

    #[test]
    fn test_reward_entry_kind() {
        let kind: RewardEntryKind = serde_json::from_str("\"redeem\"").unwrap();
        assert_eq!(kind, RewardEntryKind::Redeem);
        let kind: RewardEntryKind = serde_json::from_str("\"expire\"").unwrap();
        assert_eq!(kind, RewardEntryKind::Other);
    }

    #[test]
    fn test_order_status_from_str() {
        assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("unknown".parse::<OrderStatus>().is_err());
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }
}
