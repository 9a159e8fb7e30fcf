//! Payment types: pending payments and the point-package catalog.
//!
//! A `PendingPayment` is created when a purchase starts and settled exactly
//! once when the processor confirms it. The credited amount always comes
//! from this record, never from webhook payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A point purchase awaiting (or past) confirmation.
///
/// Keyed by the processor's transaction ID: the Stripe checkout-session ID
/// or the PIX `txid`. The Pending → Paid transition happens exactly once;
/// replayed webhooks and polls find `Paid` and do nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Processor transaction ID (`cs_...` for Stripe, `txid` for PIX).
    pub payment_id: String,

    /// The buyer.
    pub user_id: UserId,

    /// Which processor carries this payment.
    pub provider: PaymentProvider,

    /// Catalog package that was bought.
    pub package_id: String,

    /// Points to credit on settlement.
    pub points: i64,

    /// Price in BRL centavos.
    pub amount_cents: i64,

    /// Current status.
    pub status: PaymentStatus,

    /// When the purchase was initiated.
    pub created_at: DateTime<Utc>,

    /// When the payment was confirmed, if it was.
    pub paid_at: Option<DateTime<Utc>>,
}

impl PendingPayment {
    /// Create a pending record for a freshly initiated purchase.
    #[must_use]
    pub fn new(
        payment_id: String,
        user_id: UserId,
        provider: PaymentProvider,
        package: &PointPackage,
    ) -> Self {
        Self {
            payment_id,
            user_id,
            provider,
            package_id: package.id.to_string(),
            points: package.points,
            amount_cents: package.price_cents,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    /// Whether this payment was already settled.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Payment processor behind a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    /// Stripe Checkout (card).
    Stripe,
    /// Brazilian instant payment (QR code / copy-paste code).
    Pix,
}

impl PaymentProvider {
    /// Stable identifier used in the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Pix => "pix",
        }
    }
}

/// Lifecycle of a pending payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Waiting for processor confirmation.
    Pending,
    /// Confirmed and credited.
    Paid,
}

/// A purchasable points package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointPackage {
    /// Catalog identifier sent by the client.
    pub id: &'static str,

    /// Points credited on settlement.
    pub points: i64,

    /// Price in BRL centavos.
    pub price_cents: i64,

    /// Portuguese display label.
    pub label: &'static str,
}

impl PointPackage {
    /// The fixed catalog, cheapest first.
    pub const ALL: [Self; 4] = [
        Self {
            id: "inicial",
            points: 50,
            price_cents: 990,
            label: "Pacote Inicial",
        },
        Self {
            id: "mistico",
            points: 120,
            price_cents: 1990,
            label: "Pacote Místico",
        },
        Self {
            id: "premium",
            points: 300,
            price_cents: 3990,
            label: "Pacote Premium",
        },
        Self {
            id: "cosmico",
            points: 700,
            price_cents: 7990,
            label: "Pacote Cósmico",
        },
    ];

    /// Look up a package by its catalog ID.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Self> {
        Self::ALL.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_lookup() {
        let pkg = PointPackage::find("mistico").unwrap();
        assert_eq!(pkg.points, 120);
        assert_eq!(pkg.price_cents, 1990);

        assert!(PointPackage::find("inexistente").is_none());
    }

    #[test]
    fn pending_payment_copies_package_terms() {
        let user_id = UserId::generate();
        let pkg = PointPackage::find("inicial").unwrap();
        let payment = PendingPayment::new("pix_tx_001".into(), user_id, PaymentProvider::Pix, pkg);

        assert_eq!(payment.points, 50);
        assert_eq!(payment.amount_cents, 990);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(!payment.is_paid());
        assert!(payment.paid_at.is_none());
    }

    #[test]
    fn catalog_is_sorted_by_price() {
        let prices: Vec<i64> = PointPackage::ALL.iter().map(|p| p.price_cents).collect();
        let mut sorted = prices.clone();
        sorted.sort_unstable();
        assert_eq!(prices, sorted);
    }
}
