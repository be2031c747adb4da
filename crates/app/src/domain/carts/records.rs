//! Cart Records

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    domain::{
        identity::Identity,
        pricing::{PricingError, Totals, line_total},
        products::records::{ProductUuid, Size},
    },
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Longest accepted free-text note on a line.
pub const NOTES_MAX_CHARS: usize = 200;

/// A topping or extra with the price captured when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Customization {
    pub name: String,
    pub price: u64,
}

pub type Customizations = SmallVec<[Customization; 4]>;

/// Whether two customization lists hold the same entries, ignoring order.
#[must_use]
pub fn same_customizations(a: &[Customization], b: &[Customization]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut a: SmallVec<[&Customization; 4]> = a.iter().collect();
    let mut b: SmallVec<[&Customization; 4]> = b.iter().collect();

    a.sort_unstable();
    b.sort_unstable();

    a == b
}

/// CartItem Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub size: Size,
    pub quantity: u32,
    pub unit_price: u64,
    #[serde(default)]
    pub customizations: Customizations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CartItemRecord {
    #[must_use]
    pub fn customization_total(&self) -> u64 {
        self.customizations
            .iter()
            .fold(0_u64, |total, c| total.saturating_add(c.price))
    }

    /// `(unit_price + customization_total) * quantity`
    ///
    /// # Errors
    ///
    /// Returns an error on overflow.
    pub fn line_total(&self) -> Result<u64, PricingError> {
        line_total(self.unit_price, self.customization_total(), self.quantity)
    }

    /// Whether `other` describes the same product, size and customizations.
    #[must_use]
    pub fn matches(&self, product: ProductUuid, size: Size, customizations: &[Customization]) -> bool {
        self.product_uuid == product
            && self.size == size
            && same_customizations(&self.customizations, customizations)
    }

    /// Whether the line carries exactly these extras by name, ignoring order and prices.
    #[must_use]
    pub fn has_customization_names(&self, names: &[String]) -> bool {
        if self.customizations.len() != names.len() {
            return false;
        }

        let mut held: SmallVec<[&str; 4]> =
            self.customizations.iter().map(|c| c.name.as_str()).collect();
        let mut wanted: SmallVec<[&str; 4]> = names.iter().map(|name| name.trim()).collect();

        held.sort_unstable();
        wanted.sort_unstable();

        held == wanted
    }
}

/// Cart Record
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub owner: Identity,
    pub items: Vec<CartItemRecord>,
    pub subtotal: u64,
    pub tax: u64,
    pub total: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line that a new item with these attributes would merge into.
    #[must_use]
    pub fn matching_line(
        &self,
        product: ProductUuid,
        size: Size,
        customizations: &[Customization],
    ) -> Option<&CartItemRecord> {
        self.items
            .iter()
            .find(|item| item.matches(product, size, customizations))
    }

    #[must_use]
    pub fn item(&self, item: CartItemUuid) -> Option<&CartItemRecord> {
        self.items.iter().find(|line| line.uuid == item)
    }

    /// Add a line, folding it into an identical existing line when there is one.
    ///
    /// Returns the uuid of the line now holding the quantity.
    pub fn add_line(&mut self, line: CartItemRecord) -> CartItemUuid {
        let existing = self
            .items
            .iter_mut()
            .find(|item| item.matches(line.product_uuid, line.size, &line.customizations));

        match existing {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.uuid
            }
            None => {
                let uuid = line.uuid;
                self.items.push(line);
                uuid
            }
        }
    }

    /// Set a line's quantity; zero or below removes the line.
    ///
    /// Returns `false` when no such line exists.
    pub fn set_quantity(&mut self, item: CartItemUuid, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_line(item);
        }

        let Some(line) = self.items.iter_mut().find(|line| line.uuid == item) else {
            return false;
        };

        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        true
    }

    /// Returns `false` when no such line exists.
    pub fn remove_line(&mut self, item: CartItemUuid) -> bool {
        let before = self.items.len();

        self.items.retain(|line| line.uuid != item);

        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.subtotal = 0;
        self.tax = 0;
        self.total = 0;
    }

    /// Fold every line of `other` into this cart with the add-item matching rule.
    pub fn merge_lines(&mut self, other: Vec<CartItemRecord>) {
        for line in other {
            self.add_line(line);
        }
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns an error on overflow.
    pub fn items_subtotal(&self) -> Result<u64, PricingError> {
        self.items.iter().try_fold(0_u64, |subtotal, line| {
            subtotal
                .checked_add(line.line_total()?)
                .ok_or(PricingError::Overflow)
        })
    }

    /// Recompute subtotal, tax and total from the current lines.
    ///
    /// # Errors
    ///
    /// Returns an error on overflow or a negative tax rate.
    pub fn recompute(&mut self, tax_rate: Decimal) -> Result<(), PricingError> {
        let totals = Totals::from_subtotal(self.items_subtotal()?, tax_rate)?;

        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;

        Ok(())
    }
}
