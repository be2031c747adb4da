//! Coupons Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    auth::UserUuid,
    database::{amount_to_i64, try_get_amount, try_get_optional_amount},
    domain::coupons::{
        data::{CouponUpdate, NewCoupon},
        records::{CouponDiscount, CouponRecord, CouponRejection, CouponUuid},
    },
};

const LIST_COUPONS_SQL: &str = include_str!("sql/list_coupons.sql");
const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const FIND_COUPON_BY_CODE_SQL: &str = include_str!("sql/find_coupon_by_code.sql");
const CREATE_COUPON_SQL: &str = include_str!("sql/create_coupon.sql");
const UPDATE_COUPON_SQL: &str = include_str!("sql/update_coupon.sql");
const SET_COUPON_ACTIVE_SQL: &str = include_str!("sql/set_coupon_active.sql");
const DELETE_COUPON_SQL: &str = include_str!("sql/delete_coupon.sql");
const GET_USER_REDEMPTIONS_SQL: &str = include_str!("sql/get_user_redemptions.sql");
const INCREMENT_COUPON_USAGE_SQL: &str = include_str!("sql/increment_coupon_usage.sql");
const RECORD_USER_REDEMPTION_SQL: &str = include_str!("sql/record_user_redemption.sql");

/// Column values for a [`CouponDiscount`]:
/// `(discount_kind, discount_percent, discount_amount, max_discount)`.
type DiscountColumns = (&'static str, Option<Decimal>, Option<i64>, Option<i64>);

fn discount_columns(discount: &CouponDiscount) -> Result<DiscountColumns, sqlx::Error> {
    Ok(match *discount {
        CouponDiscount::Percentage {
            percent,
            max_discount,
        } => (
            discount.kind(),
            Some(percent),
            None,
            max_discount.map(amount_to_i64).transpose()?,
        ),
        CouponDiscount::Fixed { amount } => {
            (discount.kind(), None, Some(amount_to_i64(amount)?), None)
        }
    })
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_coupons(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(LIST_COUPONS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Look up a coupon by its canonical (upper-case) code.
    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: &NewCoupon,
    ) -> Result<CouponRecord, sqlx::Error> {
        let (kind, percent, amount, max_discount) = discount_columns(&coupon.discount)?;

        query_as::<Postgres, CouponRecord>(CREATE_COUPON_SQL)
            .bind(coupon.uuid.into_uuid())
            .bind(&coupon.code)
            .bind(coupon.description.as_deref())
            .bind(kind)
            .bind(percent)
            .bind(amount)
            .bind(max_discount)
            .bind(amount_to_i64(coupon.min_order_amount)?)
            .bind(coupon.usage_limit.map(amount_to_i64).transpose()?)
            .bind(amount_to_i64(coupon.per_user_limit)?)
            .bind(coupon.active)
            .bind(SqlxTimestamp::from(coupon.valid_from))
            .bind(SqlxTimestamp::from(coupon.valid_until))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        update: &CouponUpdate,
    ) -> Result<CouponRecord, sqlx::Error> {
        let (kind, percent, amount, max_discount) = discount_columns(&update.discount)?;

        query_as::<Postgres, CouponRecord>(UPDATE_COUPON_SQL)
            .bind(coupon.into_uuid())
            .bind(update.description.as_deref())
            .bind(kind)
            .bind(percent)
            .bind(amount)
            .bind(max_discount)
            .bind(amount_to_i64(update.min_order_amount)?)
            .bind(update.usage_limit.map(amount_to_i64).transpose()?)
            .bind(amount_to_i64(update.per_user_limit)?)
            .bind(SqlxTimestamp::from(update.valid_from))
            .bind(SqlxTimestamp::from(update.valid_until))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_coupon_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        active: bool,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(SET_COUPON_ACTIVE_SQL)
            .bind(coupon.into_uuid())
            .bind(active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_COUPON_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn user_redemptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let count: Option<i64> = query_scalar(GET_USER_REDEMPTIONS_SQL)
            .bind(coupon.into_uuid())
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(count.map_or(0, |count| u64::try_from(count).unwrap_or(0)))
    }

    /// Record one redemption against the global counter and, for users, the
    /// per-user ledger. Each counter only moves while it is under its limit.
    pub(crate) async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: &CouponRecord,
        user: Option<UserUuid>,
    ) -> Result<Result<(), CouponRejection>, sqlx::Error> {
        let incremented = query(INCREMENT_COUPON_USAGE_SQL)
            .bind(coupon.uuid.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if incremented == 0 {
            return Ok(Err(CouponRejection::UsageLimitReached));
        }

        let Some(user) = user else {
            return Ok(Ok(()));
        };

        let recorded = query(RECORD_USER_REDEMPTION_SQL)
            .bind(coupon.uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(amount_to_i64(coupon.per_user_limit)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if recorded == 0 {
            return Ok(Err(CouponRejection::UserLimitReached));
        }

        Ok(Ok(()))
    }
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("discount_kind")?;

        let discount = match kind.as_str() {
            "percentage" => CouponDiscount::Percentage {
                percent: row.try_get("discount_percent")?,
                max_discount: try_get_optional_amount(row, "max_discount")?,
            },
            "fixed" => CouponDiscount::Fixed {
                amount: try_get_amount(row, "discount_amount")?,
            },
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "discount_kind".to_string(),
                    source: format!("unknown discount kind \"{other}\"").into(),
                });
            }
        };

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            discount,
            min_order_amount: try_get_amount(row, "min_order_amount")?,
            usage_limit: try_get_optional_amount(row, "usage_limit")?,
            used_count: try_get_amount(row, "used_count")?,
            per_user_limit: try_get_amount(row, "per_user_limit")?,
            active: row.try_get("active")?,
            valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
            valid_until: row.try_get::<SqlxTimestamp, _>("valid_until")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
