//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    auth::UserUuid,
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::{
                CartItemRecord, CartItemUuid, CartRecord, Customization, Customizations,
                NOTES_MAX_CHARS,
            },
            repository::PgCartsRepository,
        },
        identity::{GuestSession, Identity},
        pricing::PricingSettings,
        products::{records::ProductRecord, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    products_repository: PgProductsRepository,
    pricing: PricingSettings,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db, pricing: PricingSettings) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            products_repository: PgProductsRepository::new(),
            pricing,
        }
    }
}

fn validate_new_item(item: &NewCartItem) -> Result<(), CartsServiceError> {
    if item.quantity == 0 {
        return Err(CartsServiceError::InvalidQuantity);
    }

    if item
        .notes
        .as_deref()
        .is_some_and(|notes| notes.chars().count() > NOTES_MAX_CHARS)
    {
        return Err(CartsServiceError::NotesTooLong);
    }

    if item.customizations.iter().any(|name| name.trim().is_empty()) {
        return Err(CartsServiceError::InvalidCustomization);
    }

    Ok(())
}

/// Price each requested extra from the product's own catalog.
fn priced_customizations(
    product: &ProductRecord,
    names: &[String],
) -> Result<Customizations, CartsServiceError> {
    names
        .iter()
        .map(|name| {
            let price = product
                .customization_price(name)
                .ok_or(CartsServiceError::InvalidCustomization)?;

            Ok(Customization {
                name: name.trim().to_string(),
                price,
            })
        })
        .collect()
}

fn ensure_supply(product: &ProductRecord, quantity: u64) -> Result<(), CartsServiceError> {
    if !product.available {
        return Err(CartsServiceError::ProductUnavailable {
            product: product.uuid,
        });
    }

    if quantity > product.stock {
        return Err(CartsServiceError::InsufficientStock {
            product: product.uuid,
            name: product.name.clone(),
            available: product.stock,
        });
    }

    Ok(())
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(name = "carts.service.get_cart", skip(self), fields(owner = %owner), err)]
    async fn get_cart(&self, owner: &Identity) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, owner)
            .await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(owner = %owner, product_uuid = %item.product_uuid, quantity = item.quantity),
        err
    )]
    async fn add_item(
        &self,
        owner: &Identity,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError> {
        validate_new_item(&item)?;

        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, owner)
            .await?;

        let product = self
            .products_repository
            .find_product(&mut tx, item.product_uuid)
            .await?
            .ok_or(CartsServiceError::ProductNotFound)?;

        let customizations = priced_customizations(&product, &item.customizations)?;

        let already_in_cart = cart
            .matching_line(product.uuid, item.size, &customizations)
            .map_or(0, |line| line.quantity);

        ensure_supply(
            &product,
            u64::from(already_in_cart) + u64::from(item.quantity),
        )?;

        cart.add_line(CartItemRecord {
            uuid: CartItemUuid::new(),
            product_uuid: product.uuid,
            unit_price: product.price_for(item.size),
            name: product.name,
            size: item.size,
            quantity: item.quantity,
            customizations,
            notes: item.notes,
        });

        cart.recompute(self.pricing.tax_rate)?;

        let saved = self.carts_repository.save_cart(&mut tx, &cart).await?;

        tx.commit().await?;

        Ok(saved)
    }

    #[tracing::instrument(name = "carts.service.update_item_quantity", skip(self), fields(owner = %owner, item_uuid = %item), err)]
    async fn update_item_quantity(
        &self,
        owner: &Identity,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, owner)
            .await?;

        let line = cart.item(item).ok_or(CartsServiceError::NotFound)?;

        if quantity > 0 {
            let wanted = u32::try_from(quantity).map_err(|_| CartsServiceError::InvalidQuantity)?;

            if wanted > line.quantity {
                let product = self
                    .products_repository
                    .find_product(&mut tx, line.product_uuid)
                    .await?
                    .ok_or(CartsServiceError::ProductNotFound)?;

                ensure_supply(&product, u64::from(wanted))?;
            }
        }

        cart.set_quantity(item, quantity);
        cart.recompute(self.pricing.tax_rate)?;

        let saved = self.carts_repository.save_cart(&mut tx, &cart).await?;

        tx.commit().await?;

        Ok(saved)
    }

    #[tracing::instrument(name = "carts.service.remove_item", skip(self), fields(owner = %owner, item_uuid = %item), err)]
    async fn remove_item(
        &self,
        owner: &Identity,
        item: CartItemUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, owner)
            .await?;

        if !cart.remove_line(item) {
            return Err(CartsServiceError::NotFound);
        }

        cart.recompute(self.pricing.tax_rate)?;

        let saved = self.carts_repository.save_cart(&mut tx, &cart).await?;

        tx.commit().await?;

        Ok(saved)
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), fields(owner = %owner), err)]
    async fn clear_cart(&self, owner: &Identity) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, owner)
            .await?;

        cart.clear();

        let saved = self.carts_repository.save_cart(&mut tx, &cart).await?;

        tx.commit().await?;

        Ok(saved)
    }

    #[tracing::instrument(name = "carts.service.merge_carts", skip(self, guest), fields(user_uuid = %user), err)]
    async fn merge_carts(
        &self,
        user: UserUuid,
        guest: GuestSession,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        // User cart first, then guest cart, so concurrent merges lock in the same order.
        let mut cart = self
            .carts_repository
            .lock_or_create_cart(&mut tx, &Identity::User(user))
            .await?;

        let guest_cart = self
            .carts_repository
            .lock_cart(&mut tx, &Identity::Guest(guest))
            .await?;

        let Some(guest_cart) = guest_cart.filter(|guest_cart| !guest_cart.is_empty()) else {
            debug!("no guest lines to merge");

            tx.commit().await?;

            return Ok(cart);
        };

        let guest_cart_uuid = guest_cart.uuid;

        cart.merge_lines(guest_cart.items);
        cart.recompute(self.pricing.tax_rate)?;

        let saved = self.carts_repository.save_cart(&mut tx, &cart).await?;

        self.carts_repository
            .delete_cart(&mut tx, guest_cart_uuid)
            .await?;

        tx.commit().await?;

        Ok(saved)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the owner's cart, creating an empty one on first access.
    async fn get_cart(&self, owner: &Identity) -> Result<CartRecord, CartsServiceError>;

    /// Add an item, merging it into an identical existing line.
    async fn add_item(
        &self,
        owner: &Identity,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Set a line's quantity. Zero or below removes the line.
    async fn update_item_quantity(
        &self,
        owner: &Identity,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove a single line.
    async fn remove_item(
        &self,
        owner: &Identity,
        item: CartItemUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove every line and zero the totals.
    async fn clear_cart(&self, owner: &Identity) -> Result<CartRecord, CartsServiceError>;

    /// Fold a guest session's cart into the user's cart and delete the guest cart.
    async fn merge_carts(
        &self,
        user: UserUuid,
        guest: GuestSession,
    ) -> Result<CartRecord, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        auth::Role,
        domain::products::{ProductsService, records::Size},
        test::{
            TestContext,
            helpers::{create_product, create_user, guest, new_item},
        },
    };

    use super::*;

    #[tokio::test]
    async fn get_cart_creates_an_empty_cart_once() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("guest-a");

        let first = ctx.carts.get_cart(&owner).await?;
        let second = ctx.carts.get_cart(&owner).await?;

        assert_eq!(first.uuid, second.uuid);
        assert!(first.is_empty());
        assert_eq!(first.owner, owner);
        assert_eq!((first.subtotal, first.tax, first.total), (0, 0, 0));

        Ok(())
    }

    #[tokio::test]
    async fn user_and_guest_carts_are_separate() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, Role::Customer).await?;

        let user_cart = ctx.carts.get_cart(&Identity::User(user)).await?;
        let guest_cart = ctx.carts.get_cart(&guest("guest-a")).await?;

        assert_ne!(user_cart.uuid, guest_cart.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_captures_price_and_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let owner = guest("guest-a");

        let cart = ctx.carts.add_item(&owner, new_item(product.uuid, 2)).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].unit_price, 2_99);
        assert_eq!(cart.items[0].name, "Margherita");
        assert_eq!(cart.subtotal, 5_98);
        assert_eq!(cart.tax, 60);
        assert_eq!(cart.total, 6_58);

        Ok(())
    }

    #[tokio::test]
    async fn identical_items_merge_into_one_line() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let owner = guest("guest-a");

        ctx.carts.add_item(&owner, new_item(product.uuid, 2)).await?;
        let cart = ctx.carts.add_item(&owner, new_item(product.uuid, 3)).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);

        Ok(())
    }

    #[tokio::test]
    async fn captured_price_survives_product_changes() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let owner = guest("guest-a");

        ctx.carts.add_item(&owner, new_item(product.uuid, 1)).await?;

        ctx.products
            .update_product(
                product.uuid,
                crate::domain::products::data::ProductUpdate {
                    name: product.name.clone(),
                    description: None,
                    category: product.category.clone(),
                    base_price: 9_99,
                    sizes: product.sizes.clone(),
                    customizations: product.customizations.clone(),
                    available: true,
                    stock: 10,
                },
            )
            .await?;

        let cart = ctx.carts.get_cart(&owner).await?;

        assert_eq!(cart.items[0].unit_price, 2_99);

        Ok(())
    }

    #[tokio::test]
    async fn exceeding_stock_fails_without_mutation() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 3).await?;
        let owner = guest("guest-a");

        ctx.carts.add_item(&owner, new_item(product.uuid, 2)).await?;

        let result = ctx.carts.add_item(&owner, new_item(product.uuid, 2)).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InsufficientStock { available: 3, .. })
            ),
            "expected InsufficientStock, got {result:?}"
        );

        let cart = ctx.carts.get_cart(&owner).await?;

        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.subtotal, 5_98);

        Ok(())
    }

    #[tokio::test]
    async fn unavailable_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let mut product = crate::test::helpers::new_product("Calzone", 8_00, 10);
        product.available = false;
        let product = ctx.products.create_product(product).await?;

        let result = ctx
            .carts
            .add_item(&guest("guest-a"), new_item(product.uuid, 1))
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductUnavailable { .. })),
            "expected ProductUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .add_item(
                &guest("guest-a"),
                new_item(crate::domain::products::records::ProductUuid::new(), 1),
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn zero_quantity_and_long_notes_are_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let owner = guest("guest-a");

        let zero = ctx.carts.add_item(&owner, new_item(product.uuid, 0)).await;
        assert!(matches!(zero, Err(CartsServiceError::InvalidQuantity)));

        let mut noisy = new_item(product.uuid, 1);
        noisy.notes = Some("x".repeat(NOTES_MAX_CHARS + 1));

        let notes = ctx.carts.add_item(&owner, noisy).await;
        assert!(matches!(notes, Err(CartsServiceError::NotesTooLong)));

        Ok(())
    }

    #[tokio::test]
    async fn size_prices_are_used_when_set() -> TestResult {
        let ctx = TestContext::new().await;
        let mut product = crate::test::helpers::new_product("Diavola", 10_00, 10);
        product.sizes.insert(Size::Large, 14_00);
        let product = ctx.products.create_product(product).await?;

        let mut item = new_item(product.uuid, 1);
        item.size = Size::Large;

        let cart = ctx.carts.add_item(&guest("guest-a"), item).await?;

        assert_eq!(cart.items[0].unit_price, 14_00);

        Ok(())
    }

    #[tokio::test]
    async fn customization_prices_come_from_the_product() -> TestResult {
        let ctx = TestContext::new().await;
        let mut product = crate::test::helpers::new_product("Diavola", 10_00, 10);
        product.customizations.insert("olives".to_string(), 50);
        product.customizations.insert("basil".to_string(), 25);
        let product = ctx.products.create_product(product).await?;
        let owner = guest("guest-a");

        let mut item = new_item(product.uuid, 2);
        item.customizations = smallvec!["olives".to_string(), " basil ".to_string()];

        let cart = ctx.carts.add_item(&owner, item).await?;

        let mut names: Vec<_> = cart.items[0]
            .customizations
            .iter()
            .map(|c| (c.name.as_str(), c.price))
            .collect();
        names.sort_unstable();

        assert_eq!(names, vec![("basil", 25), ("olives", 50)]);
        assert_eq!(cart.subtotal, 2 * (10_00 + 75));

        Ok(())
    }

    #[tokio::test]
    async fn repricing_an_extra_starts_a_new_line() -> TestResult {
        let ctx = TestContext::new().await;
        let mut product = crate::test::helpers::new_product("Diavola", 10_00, 10);
        product.customizations.insert("olives".to_string(), 50);
        let created = ctx.products.create_product(product).await?;
        let owner = guest("guest-a");

        let mut item = new_item(created.uuid, 1);
        item.customizations = smallvec!["olives".to_string()];

        ctx.carts.add_item(&owner, item.clone()).await?;

        let mut customizations = created.customizations.clone();
        customizations.insert("olives".to_string(), 80);

        ctx.products
            .update_product(
                created.uuid,
                crate::domain::products::data::ProductUpdate {
                    name: created.name.clone(),
                    description: None,
                    category: created.category.clone(),
                    base_price: created.base_price,
                    sizes: created.sizes.clone(),
                    customizations,
                    available: true,
                    stock: 10,
                },
            )
            .await?;

        let cart = ctx.carts.add_item(&owner, item).await?;

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].customizations[0].price, 50);
        assert_eq!(cart.items[1].customizations[0].price, 80);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_customization_is_rejected_without_mutation() -> TestResult {
        let ctx = TestContext::new().await;
        let mut product = crate::test::helpers::new_product("Diavola", 10_00, 10);
        product.customizations.insert("olives".to_string(), 50);
        let product = ctx.products.create_product(product).await?;
        let owner = guest("guest-a");

        let mut item = new_item(product.uuid, 1);
        item.customizations = smallvec!["olives".to_string(), "gold leaf".to_string()];

        let result = ctx.carts.add_item(&owner, item).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidCustomization)),
            "expected InvalidCustomization, got {result:?}"
        );

        let mut blank = new_item(product.uuid, 1);
        blank.customizations = smallvec!["  ".to_string()];

        let result = ctx.carts.add_item(&owner, blank).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidCustomization)),
            "expected InvalidCustomization, got {result:?}"
        );

        assert!(ctx.carts.get_cart(&owner).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_revalidates_against_new_total() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 4).await?;
        let owner = guest("guest-a");

        let cart = ctx.carts.add_item(&owner, new_item(product.uuid, 3)).await?;
        let line = cart.items[0].uuid;

        let result = ctx.carts.update_item_quantity(&owner, line, 5).await;
        assert!(
            matches!(result, Err(CartsServiceError::InsufficientStock { .. })),
            "expected InsufficientStock, got {result:?}"
        );

        let cart = ctx.carts.update_item_quantity(&owner, line, 4).await?;
        assert_eq!(cart.items[0].quantity, 4);
        assert_eq!(cart.subtotal, 11_96);

        let cart = ctx.carts.update_item_quantity(&owner, line, 0).await?;
        assert!(cart.is_empty());
        assert_eq!(cart.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_line_is_not_found() {
        let ctx = TestContext::new().await;
        let owner = guest("guest-a");

        let update = ctx
            .carts
            .update_item_quantity(&owner, CartItemUuid::new(), 1)
            .await;
        let remove = ctx.carts.remove_item(&owner, CartItemUuid::new()).await;

        assert!(matches!(update, Err(CartsServiceError::NotFound)));
        assert!(matches!(remove, Err(CartsServiceError::NotFound)));
    }

    #[tokio::test]
    async fn other_owners_cannot_touch_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 2_99, 10).await?;

        let cart = ctx
            .carts
            .add_item(&guest("guest-a"), new_item(product.uuid, 1))
            .await?;

        let result = ctx
            .carts
            .remove_item(&guest("guest-b"), cart.items[0].uuid)
            .await;

        assert!(matches!(result, Err(CartsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn remove_and_clear_recompute_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let pizza = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let drink = create_product(&ctx, "Cola", 1_50, 10).await?;
        let owner = guest("guest-a");

        ctx.carts.add_item(&owner, new_item(pizza.uuid, 1)).await?;
        let cart = ctx.carts.add_item(&owner, new_item(drink.uuid, 2)).await?;
        assert_eq!(cart.subtotal, 5_99);

        let cart = ctx.carts.remove_item(&owner, cart.items[0].uuid).await?;
        assert_eq!(cart.subtotal, 3_00);
        assert_eq!(cart.tax, 30);

        let cart = ctx.carts.clear_cart(&owner).await?;
        assert!(cart.is_empty());
        assert_eq!((cart.subtotal, cart.tax, cart.total), (0, 0, 0));

        Ok(())
    }

    #[tokio::test]
    async fn merge_folds_guest_lines_and_is_idempotent() -> TestResult {
        let ctx = TestContext::new().await;
        let pizza = create_product(&ctx, "Margherita", 2_99, 10).await?;
        let drink = create_product(&ctx, "Cola", 1_50, 10).await?;
        let user = create_user(&ctx, Role::Customer).await?;
        let session = GuestSession::parse("guest-a")?;

        ctx.carts
            .add_item(&Identity::User(user), new_item(pizza.uuid, 1))
            .await?;
        ctx.carts
            .add_item(&Identity::Guest(session.clone()), new_item(pizza.uuid, 2))
            .await?;
        ctx.carts
            .add_item(&Identity::Guest(session.clone()), new_item(drink.uuid, 1))
            .await?;

        let merged = ctx.carts.merge_carts(user, session.clone()).await?;

        assert_eq!(merged.items.len(), 2);
        assert_eq!(merged.items[0].quantity, 3);
        assert_eq!(merged.subtotal, 3 * 2_99 + 1_50);

        let again = ctx.carts.merge_carts(user, session.clone()).await?;

        assert_eq!(again.items, merged.items);
        assert_eq!(again.total, merged.total);

        let fresh_guest = ctx.carts.get_cart(&Identity::Guest(session)).await?;
        assert!(fresh_guest.is_empty(), "guest cart should have been deleted");

        Ok(())
    }

    #[tokio::test]
    async fn merge_without_guest_cart_returns_user_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, Role::Customer).await?;

        let cart = ctx
            .carts
            .merge_carts(user, GuestSession::parse("never-used")?)
            .await?;

        assert!(cart.is_empty());
        assert_eq!(cart.owner, Identity::User(user));

        Ok(())
    }
}
