//! Auction domain types shared across the workspace.

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an auction.
///
/// Status only ever moves forward (`New` → `Active` → `Completed`). The
/// expiry scheduler never writes anything except `Completed`, and only
/// through a conditional update guarded on the persisted status being
/// `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    New,
    Active,
    Completed,
}

impl AuctionStatus {
    /// The status code as persisted in the `auctions.status` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuctionStatus::New => "new",
            AuctionStatus::Active => "active",
            AuctionStatus::Completed => "completed",
        }
    }

    /// `true` while the auction still accepts bids.
    #[must_use]
    pub fn is_open(self) -> bool {
        self == AuctionStatus::Active
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(AuctionStatus::New),
            "active" => Ok(AuctionStatus::Active),
            "completed" => Ok(AuctionStatus::Completed),
            other => Err(crate::CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// Physical condition of the product being auctioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCondition {
    New,
    Used,
    Refurbished,
}

impl ProductCondition {
    /// The condition code as persisted in the `auctions.condition` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCondition::New => "new",
            ProductCondition::Used => "used",
            ProductCondition::Refurbished => "refurbished",
        }
    }
}

impl std::fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCondition {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProductCondition::New),
            "used" => Ok(ProductCondition::Used),
            "refurbished" => Ok(ProductCondition::Refurbished),
            other => Err(crate::CoreError::InvalidCondition(other.to_string())),
        }
    }
}

/// An auction record as seen by the scheduler and the catalog.
///
/// `id` is assigned once at creation and immutable. `started_at` is the
/// epoch-seconds timestamp marking the start of the bidding window, also
/// immutable once set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: Uuid,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    pub started_at: i64,
}

impl Auction {
    /// Builds a new `Active` auction whose bidding window starts now.
    #[must_use]
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        condition: ProductCondition,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name: product_name.into(),
            category: category.into(),
            description: description.into(),
            condition,
            status: AuctionStatus::Active,
            started_at: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AuctionStatus::New,
            AuctionStatus::Active,
            AuctionStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<AuctionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_rejects_unknown_code() {
        assert!("cancelled".parse::<AuctionStatus>().is_err());
    }

    #[test]
    fn only_active_is_open() {
        assert!(AuctionStatus::Active.is_open());
        assert!(!AuctionStatus::New.is_open());
        assert!(!AuctionStatus::Completed.is_open());
    }

    #[test]
    fn condition_round_trips_through_str() {
        for condition in [
            ProductCondition::New,
            ProductCondition::Used,
            ProductCondition::Refurbished,
        ] {
            assert_eq!(
                condition.as_str().parse::<ProductCondition>().unwrap(),
                condition
            );
        }
    }

    #[test]
    fn new_auction_starts_active_now() {
        let before = Utc::now().timestamp();
        let auction = Auction::new("Standing desk", "furniture", "oak, 140cm", ProductCondition::Used);
        let after = Utc::now().timestamp();

        assert_eq!(auction.status, AuctionStatus::Active);
        assert!(auction.started_at >= before && auction.started_at <= after);
        assert_eq!(auction.condition, ProductCondition::Used);
    }

    #[test]
    fn auction_serializes_with_lowercase_codes() {
        let auction = Auction::new("Lamp", "lighting", "brass", ProductCondition::Refurbished);
        let json = serde_json::to_value(&auction).unwrap();

        assert_eq!(json["status"], "active");
        assert_eq!(json["condition"], "refurbished");
    }
}
