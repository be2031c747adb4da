//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::{
    database::{amount_to_i64, try_get_amount},
    domain::{
        carts::records::{CartItemRecord, CartRecord, CartUuid},
        identity::Identity,
    },
};

const FIND_USER_CART_SQL: &str = include_str!("sql/find_user_cart.sql");
const FIND_SESSION_CART_SQL: &str = include_str!("sql/find_session_cart.sql");
const CREATE_CART_SQL: &str = include_str!("sql/create_cart.sql");
const SAVE_CART_SQL: &str = include_str!("sql/save_cart.sql");
const DELETE_CART_SQL: &str = include_str!("sql/delete_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Find and row-lock the cart owned by `owner`.
    pub(crate) async fn lock_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &Identity,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        match owner {
            Identity::User(user) => {
                query_as::<Postgres, CartRecord>(FIND_USER_CART_SQL)
                    .bind(user.into_uuid())
                    .fetch_optional(&mut **tx)
                    .await
            }
            Identity::Guest(session) => {
                query_as::<Postgres, CartRecord>(FIND_SESSION_CART_SQL)
                    .bind(session.as_str())
                    .fetch_optional(&mut **tx)
                    .await
            }
        }
    }

    /// Row-lock the owner's cart, creating an empty one first if needed.
    pub(crate) async fn lock_or_create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &Identity,
    ) -> Result<CartRecord, sqlx::Error> {
        if let Some(cart) = self.lock_cart(tx, owner).await? {
            return Ok(cart);
        }

        let (user_uuid, session_id) = owner.owner_columns();

        let created = query_as::<Postgres, CartRecord>(CREATE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(user_uuid)
            .bind(session_id)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(cart) = created {
            return Ok(cart);
        }

        // Lost the insert race; the winner has committed by now.
        self.lock_cart(tx, owner)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Persist items and derived totals in one statement.
    pub(crate) async fn save_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: &CartRecord,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(SAVE_CART_SQL)
            .bind(cart.uuid.into_uuid())
            .bind(Json(&cart.items))
            .bind(amount_to_i64(cart.subtotal)?)
            .bind(amount_to_i64(cart.tax)?)
            .bind(amount_to_i64(cart.total)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let owner = Identity::from_owner_columns(row.try_get("user_uuid")?, row.try_get("session_id")?)
            .ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "user_uuid".to_string(),
                source: "cart must have exactly one owner".into(),
            })?;

        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            owner,
            items: row.try_get::<Json<Vec<CartItemRecord>>, _>("items")?.0,
            subtotal: try_get_amount(row, "subtotal")?,
            tax: try_get_amount(row, "tax")?,
            total: try_get_amount(row, "total")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
