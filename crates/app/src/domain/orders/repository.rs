//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar, types::Json};

use crate::{
    database::{amount_to_i64, try_get_amount},
    domain::{
        identity::Identity,
        orders::{
            data::NewOrder,
            records::{OrderItemRecord, OrderRecord, OrderUuid},
            status::OrderStatus,
        },
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const LATEST_ORDER_NUMBER_SQL: &str = include_str!("sql/latest_order_number.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("sql/list_user_orders.sql");
const LIST_SESSION_ORDERS_SQL: &str = include_str!("sql/list_session_orders.sql");
const LIST_ALL_ORDERS_SQL: &str = include_str!("sql/list_all_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Highest order number issued so far that starts with `prefix`.
    pub(crate) async fn latest_order_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        prefix: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar(LATEST_ORDER_NUMBER_SQL)
            .bind(prefix)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Insert an order under `number`. Returns `None` when the number is taken.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        number: &str,
        order: &NewOrder,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let (user_uuid, session_id) = order.owner.owner_columns();

        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(number)
            .bind(user_uuid)
            .bind(session_id)
            .bind(Json(&order.items))
            .bind(order.order_type.as_str())
            .bind(order.payment_method.as_str())
            .bind(order.delivery_address.as_deref())
            .bind(order.notes.as_deref())
            .bind(amount_to_i64(order.subtotal)?)
            .bind(amount_to_i64(order.tax)?)
            .bind(amount_to_i64(order.delivery_fee)?)
            .bind(amount_to_i64(order.discount)?)
            .bind(amount_to_i64(order.total)?)
            .bind(order.coupon_code.as_deref())
            .bind(SqlxTimestamp::from(order.estimated_delivery_at))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch and row-lock an order for a status change.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders_for(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &Identity,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        match owner {
            Identity::User(user) => {
                query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
                    .bind(user.into_uuid())
                    .fetch_all(&mut **tx)
                    .await
            }
            Identity::Guest(session) => {
                query_as::<Postgres, OrderRecord>(LIST_SESSION_ORDERS_SQL)
                    .bind(session.as_str())
                    .fetch_all(&mut **tx)
                    .await
            }
        }
    }

    pub(crate) async fn list_all_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ALL_ORDERS_SQL)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(&mut **tx)
            .await
    }

    /// Write a new status, stamping delivery/cancellation times and settling
    /// payment on delivery.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

fn try_parse<T: std::str::FromStr>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(col)?;

    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let owner = Identity::from_owner_columns(row.try_get("user_uuid")?, row.try_get("session_id")?)
            .ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "user_uuid".to_string(),
                source: "order must have exactly one owner".into(),
            })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            number: row.try_get("number")?,
            owner,
            items: row.try_get::<Json<Vec<OrderItemRecord>>, _>("items")?.0,
            order_type: try_parse(row, "order_type")?,
            payment_method: try_parse(row, "payment_method")?,
            payment_status: try_parse(row, "payment_status")?,
            status: try_parse(row, "status")?,
            delivery_address: row.try_get("delivery_address")?,
            notes: row.try_get("notes")?,
            subtotal: try_get_amount(row, "subtotal")?,
            tax: try_get_amount(row, "tax")?,
            delivery_fee: try_get_amount(row, "delivery_fee")?,
            discount: try_get_amount(row, "discount")?,
            total: try_get_amount(row, "total")?,
            coupon_code: row.try_get("coupon_code")?,
            estimated_delivery_at: row
                .try_get::<SqlxTimestamp, _>("estimated_delivery_at")?
                .to_jiff(),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            cancelled_at: row
                .try_get::<Option<SqlxTimestamp>, _>("cancelled_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
