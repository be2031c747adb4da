//! Coupons service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    auth::UserUuid,
    database::Db,
    domain::coupons::{
        data::{CouponUpdate, NewCoupon},
        errors::CouponsServiceError,
        records::{
            CouponDiscount, CouponRecord, CouponRejection, CouponUuid, CouponValidation,
            canonical_code,
        },
        repository::PgCouponsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    repository: PgCouponsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCouponsRepository::new(),
        }
    }
}

fn validate_definition(
    discount: &CouponDiscount,
    valid_from: Timestamp,
    valid_until: Timestamp,
) -> Result<(), CouponsServiceError> {
    if !discount.is_valid() || valid_until < valid_from {
        return Err(CouponsServiceError::InvalidData);
    }

    Ok(())
}

/// Find a coupon by user supplied code and check it against `subtotal`.
///
/// Returns the coupon together with the discount it grants.
pub(crate) async fn evaluate_coupon(
    repository: &PgCouponsRepository,
    tx: &mut Transaction<'_, Postgres>,
    code: &str,
    subtotal: u64,
    user: Option<UserUuid>,
    now: Timestamp,
) -> Result<Result<(CouponRecord, u64), CouponRejection>, sqlx::Error> {
    let Some(code) = canonical_code(code) else {
        return Ok(Err(CouponRejection::NotFound));
    };

    let Some(coupon) = repository.find_by_code(tx, &code).await? else {
        return Ok(Err(CouponRejection::NotFound));
    };

    let user_redemptions = match user {
        Some(user) => Some(repository.user_redemptions(tx, coupon.uuid, user).await?),
        None => None,
    };

    Ok(coupon
        .validate(now, subtotal, user_redemptions)
        .map(|discount| (coupon, discount)))
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(name = "coupons.service.list_coupons", skip(self), err)]
    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupons = self.repository.list_coupons(&mut tx).await?;

        tx.commit().await?;

        Ok(coupons)
    }

    #[tracing::instrument(name = "coupons.service.get_coupon", skip(self), fields(coupon_uuid = %coupon), err)]
    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.repository.get_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    #[tracing::instrument(name = "coupons.service.create_coupon", skip(self, coupon), fields(coupon_uuid = %coupon.uuid), err)]
    async fn create_coupon(
        &self,
        mut coupon: NewCoupon,
    ) -> Result<CouponRecord, CouponsServiceError> {
        coupon.code = canonical_code(&coupon.code).ok_or(CouponsServiceError::InvalidCode)?;

        validate_definition(&coupon.discount, coupon.valid_from, coupon.valid_until)?;

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_coupon(&mut tx, &coupon).await?;

        tx.commit().await?;

        Ok(created)
    }

    #[tracing::instrument(name = "coupons.service.update_coupon", skip(self, update), fields(coupon_uuid = %coupon), err)]
    async fn update_coupon(
        &self,
        coupon: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError> {
        validate_definition(&update.discount, update.valid_from, update.valid_until)?;

        let mut tx = self.db.begin_transaction().await?;

        let updated = self
            .repository
            .update_coupon(&mut tx, coupon, &update)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(name = "coupons.service.set_coupon_active", skip(self), fields(coupon_uuid = %coupon), err)]
    async fn set_coupon_active(
        &self,
        coupon: CouponUuid,
        active: bool,
    ) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let updated = self
            .repository
            .set_coupon_active(&mut tx, coupon, active)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(name = "coupons.service.delete_coupon", skip(self), fields(coupon_uuid = %coupon), err)]
    async fn delete_coupon(&self, coupon: CouponUuid) -> Result<(), CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.delete_coupon(&mut tx, coupon).await?;

        if rows_affected == 0 {
            // Still there means orders reference its code.
            self.repository.get_coupon(&mut tx, coupon).await?;

            return Err(CouponsServiceError::InUse);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(name = "coupons.service.validate_coupon", skip(self, code), err)]
    async fn validate_coupon(
        &self,
        code: &str,
        subtotal: u64,
        user: Option<UserUuid>,
    ) -> Result<CouponValidation, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let evaluated =
            evaluate_coupon(&self.repository, &mut tx, code, subtotal, user, Timestamp::now())
                .await?;

        tx.commit().await?;

        Ok(match evaluated {
            Ok((coupon, discount)) => CouponValidation::Valid {
                code: coupon.code,
                discount,
            },
            Err(reason) => CouponValidation::Invalid { reason },
        })
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Retrieves every coupon, newest first.
    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, CouponsServiceError>;

    /// Retrieve a single coupon.
    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError>;

    /// Create a coupon. The code is stored trimmed and upper-cased.
    async fn create_coupon(&self, coupon: NewCoupon)
    -> Result<CouponRecord, CouponsServiceError>;

    /// Replace a coupon's definition. Code and redemption counters are untouched.
    async fn update_coupon(
        &self,
        coupon: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Enable or disable a coupon.
    async fn set_coupon_active(
        &self,
        coupon: CouponUuid,
        active: bool,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Delete a coupon that no order references.
    async fn delete_coupon(&self, coupon: CouponUuid) -> Result<(), CouponsServiceError>;

    /// Check whether `code` would apply to `subtotal` for `user`.
    async fn validate_coupon(
        &self,
        code: &str,
        subtotal: u64,
        user: Option<UserUuid>,
    ) -> Result<CouponValidation, CouponsServiceError>;
}
