//! Value objects for the order domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product identifier issued by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a product ID from a raw numeric value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ProductId> for i64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Externally visible, immutable order reference.
///
/// Generated exactly once when the order is placed and used as the
/// idempotent receipt reference when creating a gateway payment order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number.
    pub fn generate() -> Self {
        Self(format!("ORD-{}", Uuid::new_v4().simple()))
    }

    /// Wraps an existing order number read back from storage.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount in minor units (e.g. cents or paise) to avoid floating
/// point issues. Currency-agnostic at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a money amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a quantity, saturating at the i64 bounds rather
    /// than wrapping on absurd inputs.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(quantity as i64))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / 100;
        let frac = (self.0 % 100).abs();
        if self.0 < 0 && whole == 0 {
            write!(f, "-0.{frac:02}")
        } else {
            write!(f, "{whole}.{frac:02}")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// One purchased line of an order.
///
/// Name, image and price are snapshotted at purchase time so later catalog
/// mutations do not affect the order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Quantity ordered, always at least 1.
    pub quantity: u32,

    /// Unit price at the moment of purchase.
    pub price_at_purchase: Money,

    /// Denormalized product name for display and audit.
    pub product_name: String,

    /// Denormalized image URL for display and audit.
    pub image_url: String,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: u32,
        price_at_purchase: Money,
        product_name: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price_at_purchase,
            product_name: product_name.into(),
            image_url: image_url.into(),
        }
    }

    /// Returns the total price for this line (quantity * unit price).
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_is_unique_and_prefixed() {
        let a = OrderNumber::generate();
        let b = OrderNumber::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ORD-"));
        assert!(a.as_str().len() > 4);
    }

    #[test]
    fn test_money_from_minor() {
        let money = Money::from_minor(1234);
        assert_eq!(money.minor(), 1234);
        assert!(money.is_positive());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_minor(1234).to_string(), "12.34");
        assert_eq!(Money::from_minor(100).to_string(), "1.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-1234).to_string(), "-12.34");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);
        assert_eq!((a + b).minor(), 1500);
        assert_eq!(a.multiply(3).minor(), 3000);

        let mut acc = Money::zero();
        acc += a;
        acc += b;
        assert_eq!(acc.minor(), 1500);
    }

    #[test]
    fn test_money_multiply_saturates_instead_of_wrapping() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.multiply(3).minor(), i64::MAX);

        let negative = Money::from_minor(i64::MIN / 2);
        assert_eq!(negative.multiply(3).minor(), i64::MIN);
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem::new(7, 3, Money::from_minor(1000), "Widget", "http://img/7.png");
        assert_eq!(item.line_total().minor(), 3000);
    }

    #[test]
    fn test_order_item_serialization() {
        let item = OrderItem::new(7, 2, Money::from_minor(999), "Widget", "http://img/7.png");
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: OrderItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
