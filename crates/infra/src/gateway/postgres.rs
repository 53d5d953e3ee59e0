//! Postgres-backed store.
//!
//! Tenant isolation is enforced by putting `user_id` in every WHERE clause;
//! a record from another tenant is indistinguishable from a missing one.
//! The three atomicity rules of the [`ReturnStore`] contract map to:
//!
//! - `set_default_policy`: both flag writes in one transaction.
//! - `insert_request`: request row and item rows in one transaction.
//! - `transition_request`: conditional `UPDATE .. WHERE status = <observed>`;
//!   zero rows affected means a concurrent transition won and the caller
//!   gets `InvalidTransition` built from the fresh status.
//!
//! Monetary columns are BIGINT minor units; status, category, and window
//! anchor are TEXT holding the closed enum spellings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use returnflow_core::{Money, TenantId, UserId};
use returnflow_eligibility::{
    ReasonId, ReturnCategory, ReturnReason, ReturnTypeOption, TypeOptionId,
};
use returnflow_fees::ShippingFeeSettings;
use returnflow_policy::{PolicyId, ReturnPolicy, WindowStart};
use returnflow_requests::{
    ItemId, RequestId, RequestStatus, ReturnItem, ReturnRequest, TransitionError,
};

use super::{GatewayError, RequestFilter, ReturnStore};

/// Postgres-backed [`ReturnStore`].
#[derive(Debug, Clone)]
pub struct PostgresReturnStore {
    pool: PgPool,
}

impl PostgresReturnStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS return_policies (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        name TEXT NOT NULL,
        return_window_days INTEGER NOT NULL,
        return_window_start TEXT NOT NULL,
        allow_refunds BOOLEAN NOT NULL,
        allow_exchanges BOOLEAN NOT NULL,
        allow_store_credit BOOLEAN NOT NULL,
        store_credit_bonus_percent SMALLINT,
        restocking_fee_percent SMALLINT,
        requires_receipt BOOLEAN NOT NULL,
        requires_original_packaging BOOLEAN NOT NULL,
        is_default BOOLEAN NOT NULL,
        is_active BOOLEAN NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_return_policies_user ON return_policies (user_id)",
    "CREATE TABLE IF NOT EXISTS return_reasons (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        reason TEXT NOT NULL,
        is_active BOOLEAN NOT NULL,
        sort_order INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_return_reasons_user ON return_reasons (user_id)",
    "CREATE TABLE IF NOT EXISTS return_type_options (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        label TEXT NOT NULL,
        description TEXT NOT NULL,
        return_type TEXT NOT NULL,
        is_active BOOLEAN NOT NULL,
        sort_order INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_return_type_options_user ON return_type_options (user_id)",
    "CREATE TABLE IF NOT EXISTS return_requests (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        order_id TEXT NOT NULL,
        order_number TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        customer_email TEXT NOT NULL,
        reason TEXT NOT NULL,
        other_reason_description TEXT,
        customer_notes TEXT,
        return_type TEXT NOT NULL,
        defect_image_urls TEXT[] NOT NULL DEFAULT '{}',
        original_amount BIGINT NOT NULL,
        refund_amount BIGINT,
        store_credit_amount BIGINT,
        policy_id UUID,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        approved_at TIMESTAMPTZ,
        approved_by UUID,
        shipped_at TIMESTAMPTZ,
        received_at TIMESTAMPTZ,
        completed_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS idx_return_requests_user_created \
     ON return_requests (user_id, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS return_items (
        id UUID PRIMARY KEY,
        return_request_id UUID NOT NULL REFERENCES return_requests (id) ON DELETE CASCADE,
        user_id UUID NOT NULL,
        product_id TEXT NOT NULL,
        product_name TEXT NOT NULL,
        variant_id TEXT,
        variant_name TEXT,
        quantity INTEGER NOT NULL,
        unit_price BIGINT NOT NULL,
        product_image_url TEXT,
        exchange_product_id TEXT,
        exchange_product_name TEXT,
        exchange_variant_name TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_return_items_request ON return_items (return_request_id)",
    "CREATE TABLE IF NOT EXISTS shipping_fee_settings (
        user_id UUID PRIMARY KEY,
        return_shipping_fee BIGINT NOT NULL,
        new_product_shipping_fee BIGINT NOT NULL,
        currency TEXT NOT NULL
    )",
];

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}

fn money_to_db(money: Money) -> Result<i64, GatewayError> {
    i64::try_from(money.minor())
        .map_err(|_| GatewayError::storage("money amount exceeds BIGINT range"))
}

fn db_to_money(minor: i64) -> Result<Money, GatewayError> {
    u64::try_from(minor)
        .map(Money::from_minor)
        .map_err(|_| GatewayError::storage("negative money amount in storage"))
}

fn db_to_percent(value: Option<i16>) -> Result<Option<u16>, GatewayError> {
    value
        .map(|v| u16::try_from(v).map_err(|_| GatewayError::storage("negative percent in storage")))
        .transpose()
}

fn map_policy(row: &PgRow) -> Result<ReturnPolicy, GatewayError> {
    let window_start: String = row.try_get("return_window_start")?;
    Ok(ReturnPolicy {
        id: PolicyId::new(row.try_get::<Uuid, _>("id")?.into()),
        tenant_id: row.try_get::<Uuid, _>("user_id")?.into(),
        name: row.try_get("name")?,
        return_window_days: u32::try_from(row.try_get::<i32, _>("return_window_days")?)
            .map_err(|_| GatewayError::storage("negative return window"))?,
        return_window_start: WindowStart::parse(&window_start)
            .ok_or_else(|| GatewayError::storage(format!("unknown window start {window_start:?}")))?,
        allow_refunds: row.try_get("allow_refunds")?,
        allow_exchanges: row.try_get("allow_exchanges")?,
        allow_store_credit: row.try_get("allow_store_credit")?,
        store_credit_bonus_percent: db_to_percent(row.try_get("store_credit_bonus_percent")?)?,
        restocking_fee_percent: db_to_percent(row.try_get("restocking_fee_percent")?)?,
        requires_receipt: row.try_get("requires_receipt")?,
        requires_original_packaging: row.try_get("requires_original_packaging")?,
        is_default: row.try_get("is_default")?,
        is_active: row.try_get("is_active")?,
    })
}

fn map_reason(row: &PgRow) -> Result<ReturnReason, GatewayError> {
    Ok(ReturnReason {
        id: ReasonId::new(row.try_get::<Uuid, _>("id")?.into()),
        tenant_id: row.try_get::<Uuid, _>("user_id")?.into(),
        reason: row.try_get("reason")?,
        is_active: row.try_get("is_active")?,
        sort_order: u32::try_from(row.try_get::<i32, _>("sort_order")?).unwrap_or(0),
    })
}

fn map_type_option(row: &PgRow) -> Result<ReturnTypeOption, GatewayError> {
    let category: String = row.try_get("return_type")?;
    Ok(ReturnTypeOption {
        id: TypeOptionId::new(row.try_get::<Uuid, _>("id")?.into()),
        tenant_id: row.try_get::<Uuid, _>("user_id")?.into(),
        label: row.try_get("label")?,
        description: row.try_get("description")?,
        category: ReturnCategory::parse(&category)
            .ok_or_else(|| GatewayError::storage(format!("unknown category {category:?}")))?,
        is_active: row.try_get("is_active")?,
        sort_order: u32::try_from(row.try_get::<i32, _>("sort_order")?).unwrap_or(0),
    })
}

fn map_request(row: &PgRow) -> Result<ReturnRequest, GatewayError> {
    let category: String = row.try_get("return_type")?;
    let status: String = row.try_get("status")?;
    Ok(ReturnRequest {
        id: RequestId::new(row.try_get::<Uuid, _>("id")?.into()),
        tenant_id: row.try_get::<Uuid, _>("user_id")?.into(),
        order_id: row.try_get("order_id")?,
        order_number: row.try_get("order_number")?,
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        reason: row.try_get("reason")?,
        other_reason_description: row.try_get("other_reason_description")?,
        customer_notes: row.try_get("customer_notes")?,
        category: ReturnCategory::parse(&category)
            .ok_or_else(|| GatewayError::storage(format!("unknown category {category:?}")))?,
        evidence_image_urls: row.try_get("defect_image_urls")?,
        original_amount: db_to_money(row.try_get("original_amount")?)?,
        refund_amount: row
            .try_get::<Option<i64>, _>("refund_amount")?
            .map(db_to_money)
            .transpose()?,
        store_credit_amount: row
            .try_get::<Option<i64>, _>("store_credit_amount")?
            .map(db_to_money)
            .transpose()?,
        policy_id: row
            .try_get::<Option<Uuid>, _>("policy_id")?
            .map(|id| PolicyId::new(id.into())),
        status: RequestStatus::parse(&status)
            .ok_or_else(|| GatewayError::storage(format!("unknown status {status:?}")))?,
        created_at: row.try_get("created_at")?,
        approved_at: row.try_get("approved_at")?,
        approved_by: row
            .try_get::<Option<Uuid>, _>("approved_by")?
            .map(UserId::from_uuid),
        shipped_at: row.try_get("shipped_at")?,
        received_at: row.try_get("received_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn map_item(row: &PgRow) -> Result<ReturnItem, GatewayError> {
    Ok(ReturnItem {
        id: ItemId::new(row.try_get::<Uuid, _>("id")?.into()),
        request_id: RequestId::new(row.try_get::<Uuid, _>("return_request_id")?.into()),
        product_id: row.try_get("product_id")?,
        product_name: row.try_get("product_name")?,
        variant_id: row.try_get("variant_id")?,
        variant_name: row.try_get("variant_name")?,
        quantity: u32::try_from(row.try_get::<i32, _>("quantity")?)
            .map_err(|_| GatewayError::storage("negative quantity in storage"))?,
        unit_price: db_to_money(row.try_get("unit_price")?)?,
        product_image_url: row.try_get("product_image_url")?,
        exchange_product_id: row.try_get("exchange_product_id")?,
        exchange_product_name: row.try_get("exchange_product_name")?,
        exchange_variant_name: row.try_get("exchange_variant_name")?,
    })
}

const POLICY_COLUMNS: &str = "id, user_id, name, return_window_days, return_window_start, \
     allow_refunds, allow_exchanges, allow_store_credit, store_credit_bonus_percent, \
     restocking_fee_percent, requires_receipt, requires_original_packaging, is_default, is_active";

const REQUEST_COLUMNS: &str = "id, user_id, order_id, order_number, customer_name, customer_email, \
     reason, other_reason_description, customer_notes, return_type, defect_image_urls, \
     original_amount, refund_amount, store_credit_amount, policy_id, status, created_at, \
     approved_at, approved_by, shipped_at, received_at, completed_at";

#[async_trait]
impl ReturnStore for PostgresReturnStore {
    async fn insert_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await?;

        if policy.is_default {
            sqlx::query("UPDATE return_policies SET is_default = FALSE WHERE user_id = $1")
                .bind(Uuid::from(policy.tenant_id))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO return_policies (id, user_id, name, return_window_days, \
             return_window_start, allow_refunds, allow_exchanges, allow_store_credit, \
             store_credit_bonus_percent, restocking_fee_percent, requires_receipt, \
             requires_original_packaging, is_default, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(Uuid::from(policy.id.0))
        .bind(Uuid::from(policy.tenant_id))
        .bind(&policy.name)
        .bind(i32::try_from(policy.return_window_days).unwrap_or(i32::MAX))
        .bind(policy.return_window_start.as_str())
        .bind(policy.allow_refunds)
        .bind(policy.allow_exchanges)
        .bind(policy.allow_store_credit)
        .bind(policy.store_credit_bonus_percent.map(|p| p as i16))
        .bind(policy.restocking_fee_percent.map(|p| p as i16))
        .bind(policy.requires_receipt)
        .bind(policy.requires_original_packaging)
        .bind(policy.is_default)
        .bind(policy.is_active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await?;

        if policy.is_default {
            sqlx::query(
                "UPDATE return_policies SET is_default = FALSE WHERE user_id = $1 AND id <> $2",
            )
            .bind(Uuid::from(policy.tenant_id))
            .bind(Uuid::from(policy.id.0))
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            "UPDATE return_policies SET name = $3, return_window_days = $4, \
             return_window_start = $5, allow_refunds = $6, allow_exchanges = $7, \
             allow_store_credit = $8, store_credit_bonus_percent = $9, \
             restocking_fee_percent = $10, requires_receipt = $11, \
             requires_original_packaging = $12, is_default = $13, is_active = $14 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(policy.id.0))
        .bind(Uuid::from(policy.tenant_id))
        .bind(&policy.name)
        .bind(i32::try_from(policy.return_window_days).unwrap_or(i32::MAX))
        .bind(policy.return_window_start.as_str())
        .bind(policy.allow_refunds)
        .bind(policy.allow_exchanges)
        .bind(policy.allow_store_credit)
        .bind(policy.store_credit_bonus_percent.map(|p| p as i16))
        .bind(policy.restocking_fee_percent.map(|p| p as i16))
        .bind(policy.requires_receipt)
        .bind(policy.requires_original_packaging)
        .bind(policy.is_default)
        .bind(policy.is_active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_policy(&self, tenant_id: TenantId, id: PolicyId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM return_policies WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id.0))
            .bind(Uuid::from(tenant_id))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn get_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<Option<ReturnPolicy>, GatewayError> {
        let row = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM return_policies WHERE id = $1 AND user_id = $2"
        ))
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_policy).transpose()
    }

    async fn list_policies(&self, tenant_id: TenantId) -> Result<Vec<ReturnPolicy>, GatewayError> {
        let rows = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM return_policies WHERE user_id = $1 ORDER BY name"
        ))
        .bind(Uuid::from(tenant_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_policy).collect()
    }

    async fn set_default_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE return_policies SET is_default = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back; nothing was cleared.
            return Err(GatewayError::NotFound);
        }

        sqlx::query(
            "UPDATE return_policies SET is_default = FALSE WHERE user_id = $1 AND id <> $2",
        )
        .bind(Uuid::from(tenant_id))
        .bind(Uuid::from(id.0))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn default_policy(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<ReturnPolicy>, GatewayError> {
        let row = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM return_policies \
             WHERE user_id = $1 AND is_default = TRUE AND is_active = TRUE"
        ))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_policy).transpose()
    }

    async fn upsert_reason(&self, reason: ReturnReason) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO return_reasons (id, user_id, reason, is_active, sort_order) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET reason = $3, is_active = $4, sort_order = $5",
        )
        .bind(Uuid::from(reason.id.0))
        .bind(Uuid::from(reason.tenant_id))
        .bind(&reason.reason)
        .bind(reason.is_active)
        .bind(reason.sort_order as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_reason(&self, tenant_id: TenantId, id: ReasonId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM return_reasons WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id.0))
            .bind(Uuid::from(tenant_id))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn list_reasons(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnReason>, GatewayError> {
        let rows = sqlx::query(
            "SELECT id, user_id, reason, is_active, sort_order FROM return_reasons \
             WHERE user_id = $1 AND (NOT $2 OR is_active) ORDER BY sort_order",
        )
        .bind(Uuid::from(tenant_id))
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reason).collect()
    }

    async fn upsert_type_option(&self, option: ReturnTypeOption) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO return_type_options \
             (id, user_id, label, description, return_type, is_active, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET label = $3, description = $4, return_type = $5, \
             is_active = $6, sort_order = $7",
        )
        .bind(Uuid::from(option.id.0))
        .bind(Uuid::from(option.tenant_id))
        .bind(&option.label)
        .bind(&option.description)
        .bind(option.category.as_str())
        .bind(option.is_active)
        .bind(option.sort_order as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM return_type_options WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id.0))
            .bind(Uuid::from(tenant_id))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn list_type_options(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnTypeOption>, GatewayError> {
        let rows = sqlx::query(
            "SELECT id, user_id, label, description, return_type, is_active, sort_order \
             FROM return_type_options \
             WHERE user_id = $1 AND (NOT $2 OR is_active) ORDER BY sort_order",
        )
        .bind(Uuid::from(tenant_id))
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_type_option).collect()
    }

    async fn get_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<Option<ReturnTypeOption>, GatewayError> {
        let row = sqlx::query(
            "SELECT id, user_id, label, description, return_type, is_active, sort_order \
             FROM return_type_options WHERE id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_type_option).transpose()
    }

    async fn shipping_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<ShippingFeeSettings>, GatewayError> {
        let row = sqlx::query(
            "SELECT user_id, return_shipping_fee, new_product_shipping_fee, currency \
             FROM shipping_fee_settings WHERE user_id = $1",
        )
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(ShippingFeeSettings {
                tenant_id: row.try_get::<Uuid, _>("user_id")?.into(),
                return_shipping_fee: db_to_money(row.try_get("return_shipping_fee")?)?,
                new_product_shipping_fee: db_to_money(row.try_get("new_product_shipping_fee")?)?,
                currency: row.try_get("currency")?,
            })
        })
        .transpose()
    }

    async fn upsert_shipping_settings(
        &self,
        settings: ShippingFeeSettings,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO shipping_fee_settings \
             (user_id, return_shipping_fee, new_product_shipping_fee, currency) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET return_shipping_fee = $2, \
             new_product_shipping_fee = $3, currency = $4",
        )
        .bind(Uuid::from(settings.tenant_id))
        .bind(money_to_db(settings.return_shipping_fee)?)
        .bind(money_to_db(settings.new_product_shipping_fee)?)
        .bind(&settings.currency)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_request(
        &self,
        request: ReturnRequest,
        items: Vec<ReturnItem>,
    ) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO return_requests (id, user_id, order_id, order_number, customer_name, \
             customer_email, reason, other_reason_description, customer_notes, return_type, \
             defect_image_urls, original_amount, refund_amount, store_credit_amount, policy_id, \
             status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(Uuid::from(request.id.0))
        .bind(Uuid::from(request.tenant_id))
        .bind(&request.order_id)
        .bind(&request.order_number)
        .bind(&request.customer_name)
        .bind(&request.customer_email)
        .bind(&request.reason)
        .bind(&request.other_reason_description)
        .bind(&request.customer_notes)
        .bind(request.category.as_str())
        .bind(&request.evidence_image_urls)
        .bind(money_to_db(request.original_amount)?)
        .bind(request.refund_amount.map(money_to_db).transpose()?)
        .bind(request.store_credit_amount.map(money_to_db).transpose()?)
        .bind(request.policy_id.map(|p| Uuid::from(p.0)))
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO return_items (id, return_request_id, user_id, product_id, \
                 product_name, variant_id, variant_name, quantity, unit_price, \
                 product_image_url, exchange_product_id, exchange_product_name, \
                 exchange_variant_name) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            )
            .bind(Uuid::from(item.id.0))
            .bind(Uuid::from(item.request_id.0))
            .bind(Uuid::from(request.tenant_id))
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.variant_id)
            .bind(&item.variant_name)
            .bind(item.quantity as i32)
            .bind(money_to_db(item.unit_price)?)
            .bind(&item.product_image_url)
            .bind(&item.exchange_product_id)
            .bind(&item.exchange_product_name)
            .bind(&item.exchange_variant_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Option<ReturnRequest>, GatewayError> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM return_requests WHERE id = $1 AND user_id = $2"
        ))
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_request).transpose()
    }

    async fn list_requests(
        &self,
        tenant_id: TenantId,
        filter: RequestFilter,
    ) -> Result<Vec<ReturnRequest>, GatewayError> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM return_requests \
             WHERE user_id = $1 \
             AND ($2::text IS NULL OR status = $2) \
             AND ($3::text IS NULL OR return_type = $3) \
             ORDER BY created_at DESC"
        ))
        .bind(Uuid::from(tenant_id))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_request).collect()
    }

    async fn request_items(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Vec<ReturnItem>, GatewayError> {
        let rows = sqlx::query(
            "SELECT id, return_request_id, product_id, product_name, variant_id, variant_name, \
             quantity, unit_price, product_image_url, exchange_product_id, \
             exchange_product_name, exchange_variant_name \
             FROM return_items WHERE return_request_id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_item).collect()
    }

    async fn transition_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
        to: RequestStatus,
        now: DateTime<Utc>,
        actor: Option<UserId>,
    ) -> Result<ReturnRequest, GatewayError> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM return_requests WHERE id = $1 AND user_id = $2"
        ))
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GatewayError::NotFound)?;

        let mut request = map_request(&row)?;
        let observed = request.status;
        request.transition(to, now, actor)?;

        let result = sqlx::query(
            "UPDATE return_requests SET status = $4, approved_at = $5, approved_by = $6, \
             shipped_at = $7, received_at = $8, completed_at = $9 \
             WHERE id = $1 AND user_id = $2 AND status = $3",
        )
        .bind(Uuid::from(id.0))
        .bind(Uuid::from(tenant_id))
        .bind(observed.as_str())
        .bind(request.status.as_str())
        .bind(request.approved_at)
        .bind(request.approved_by.map(Uuid::from))
        .bind(request.shipped_at)
        .bind(request.received_at)
        .bind(request.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // A concurrent transition won the race; report the edge against
            // whatever is stored now.
            let fresh = self
                .get_request(tenant_id, id)
                .await?
                .ok_or(GatewayError::NotFound)?;
            return Err(TransitionError {
                from: fresh.status,
                to,
            }
            .into());
        }

        Ok(request)
    }
}
