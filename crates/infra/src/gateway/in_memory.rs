//! In-memory store for tests and development.
//!
//! Single `RwLock` over the whole tenant-keyed state, so the cross-record
//! atomicity rules (default exclusivity, request+items insert, transition
//! CAS) hold trivially: every mutating operation runs under one write lock.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use returnflow_core::{TenantId, UserId};
use returnflow_eligibility::{ReasonId, ReturnReason, ReturnTypeOption, TypeOptionId};
use returnflow_fees::ShippingFeeSettings;
use returnflow_policy::{PolicyId, ReturnPolicy};
use returnflow_requests::{RequestId, RequestStatus, ReturnItem, ReturnRequest};

use super::{GatewayError, RequestFilter, ReturnStore};

#[derive(Debug, Default)]
struct State {
    policies: HashMap<(TenantId, PolicyId), ReturnPolicy>,
    reasons: HashMap<(TenantId, ReasonId), ReturnReason>,
    type_options: HashMap<(TenantId, TypeOptionId), ReturnTypeOption>,
    shipping: HashMap<TenantId, ShippingFeeSettings>,
    requests: HashMap<(TenantId, RequestId), ReturnRequest>,
    items: HashMap<(TenantId, RequestId), Vec<ReturnItem>>,
}

/// In-memory [`ReturnStore`]. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryReturnStore {
    state: RwLock<State>,
}

impl InMemoryReturnStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, GatewayError> {
        self.state
            .read()
            .map_err(|_| GatewayError::storage("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, GatewayError> {
        self.state
            .write()
            .map_err(|_| GatewayError::storage("lock poisoned"))
    }
}

#[async_trait]
impl ReturnStore for InMemoryReturnStore {
    async fn insert_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        if policy.is_default {
            clear_defaults(&mut state, policy.tenant_id);
        }
        state.policies.insert((policy.tenant_id, policy.id), policy);
        Ok(())
    }

    async fn update_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        let key = (policy.tenant_id, policy.id);
        if !state.policies.contains_key(&key) {
            return Err(GatewayError::NotFound);
        }
        if policy.is_default {
            clear_defaults(&mut state, policy.tenant_id);
        }
        state.policies.insert(key, policy);
        Ok(())
    }

    async fn delete_policy(&self, tenant_id: TenantId, id: PolicyId) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state
            .policies
            .remove(&(tenant_id, id))
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn get_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<Option<ReturnPolicy>, GatewayError> {
        Ok(self.read()?.policies.get(&(tenant_id, id)).cloned())
    }

    async fn list_policies(&self, tenant_id: TenantId) -> Result<Vec<ReturnPolicy>, GatewayError> {
        let state = self.read()?;
        let mut policies: Vec<_> = state
            .policies
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, p)| p.clone())
            .collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn set_default_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        if !state.policies.contains_key(&(tenant_id, id)) {
            return Err(GatewayError::NotFound);
        }

        // Both halves happen under the same write lock: exactly one default
        // at every observable point.
        clear_defaults(&mut state, tenant_id);
        if let Some(policy) = state.policies.get_mut(&(tenant_id, id)) {
            policy.is_default = true;
        }
        Ok(())
    }

    async fn default_policy(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<ReturnPolicy>, GatewayError> {
        let state = self.read()?;
        Ok(state
            .policies
            .iter()
            .find(|((t, _), p)| *t == tenant_id && p.is_default && p.is_active)
            .map(|(_, p)| p.clone()))
    }

    async fn upsert_reason(&self, reason: ReturnReason) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state.reasons.insert((reason.tenant_id, reason.id), reason);
        Ok(())
    }

    async fn delete_reason(&self, tenant_id: TenantId, id: ReasonId) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state
            .reasons
            .remove(&(tenant_id, id))
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn list_reasons(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnReason>, GatewayError> {
        let state = self.read()?;
        let mut reasons: Vec<_> = state
            .reasons
            .iter()
            .filter(|((t, _), r)| *t == tenant_id && (!only_active || r.is_active))
            .map(|(_, r)| r.clone())
            .collect();
        reasons.sort_by_key(|r| r.sort_order);
        Ok(reasons)
    }

    async fn upsert_type_option(&self, option: ReturnTypeOption) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state
            .type_options
            .insert((option.tenant_id, option.id), option);
        Ok(())
    }

    async fn delete_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state
            .type_options
            .remove(&(tenant_id, id))
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn list_type_options(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnTypeOption>, GatewayError> {
        let state = self.read()?;
        let mut options: Vec<_> = state
            .type_options
            .iter()
            .filter(|((t, _), o)| *t == tenant_id && (!only_active || o.is_active))
            .map(|(_, o)| o.clone())
            .collect();
        options.sort_by_key(|o| o.sort_order);
        Ok(options)
    }

    async fn get_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<Option<ReturnTypeOption>, GatewayError> {
        Ok(self.read()?.type_options.get(&(tenant_id, id)).cloned())
    }

    async fn shipping_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<ShippingFeeSettings>, GatewayError> {
        Ok(self.read()?.shipping.get(&tenant_id).cloned())
    }

    async fn upsert_shipping_settings(
        &self,
        settings: ShippingFeeSettings,
    ) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state.shipping.insert(settings.tenant_id, settings);
        Ok(())
    }

    async fn insert_request(
        &self,
        request: ReturnRequest,
        items: Vec<ReturnItem>,
    ) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        let key = (request.tenant_id, request.id);
        state.requests.insert(key, request);
        state.items.insert(key, items);
        Ok(())
    }

    async fn get_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Option<ReturnRequest>, GatewayError> {
        Ok(self.read()?.requests.get(&(tenant_id, id)).cloned())
    }

    async fn list_requests(
        &self,
        tenant_id: TenantId,
        filter: RequestFilter,
    ) -> Result<Vec<ReturnRequest>, GatewayError> {
        let state = self.read()?;
        let mut requests: Vec<_> = state
            .requests
            .iter()
            .filter(|((t, _), r)| *t == tenant_id && filter.matches(r))
            .map(|(_, r)| r.clone())
            .collect();
        // Newest first, like the dashboard.
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn request_items(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Vec<ReturnItem>, GatewayError> {
        Ok(self
            .read()?
            .items
            .get(&(tenant_id, id))
            .cloned()
            .unwrap_or_default())
    }

    async fn transition_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
        to: RequestStatus,
        now: DateTime<Utc>,
        actor: Option<UserId>,
    ) -> Result<ReturnRequest, GatewayError> {
        let mut state = self.write()?;
        let request = state
            .requests
            .get_mut(&(tenant_id, id))
            .ok_or(GatewayError::NotFound)?;

        // The write lock serializes concurrent transitions; a raced caller
        // re-reads the already-updated status and fails the edge check.
        request.transition(to, now, actor)?;
        Ok(request.clone())
    }
}

fn clear_defaults(state: &mut State, tenant_id: TenantId) {
    for ((t, _), policy) in state.policies.iter_mut() {
        if *t == tenant_id {
            policy.is_default = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use returnflow_core::EntityId;
    use returnflow_policy::WindowStart;

    fn policy(tenant_id: TenantId, name: &str, is_default: bool) -> ReturnPolicy {
        ReturnPolicy {
            id: PolicyId::new(EntityId::new()),
            tenant_id,
            name: name.to_string(),
            return_window_days: 30,
            return_window_start: WindowStart::Delivered,
            allow_refunds: true,
            allow_exchanges: true,
            allow_store_credit: true,
            store_credit_bonus_percent: None,
            restocking_fee_percent: None,
            requires_receipt: false,
            requires_original_packaging: false,
            is_default,
            is_active: true,
        }
    }

    async fn default_count(store: &InMemoryReturnStore, tenant_id: TenantId) -> usize {
        store
            .list_policies(tenant_id)
            .await
            .unwrap()
            .iter()
            .filter(|p| p.is_default)
            .count()
    }

    #[tokio::test]
    async fn set_default_leaves_exactly_one_default() {
        let store = InMemoryReturnStore::new();
        let tenant = TenantId::new();

        let a = policy(tenant, "A", true);
        let b = policy(tenant, "B", false);
        let c = policy(tenant, "C", false);
        let b_id = b.id;

        store.insert_policy(a).await.unwrap();
        store.insert_policy(b).await.unwrap();
        store.insert_policy(c).await.unwrap();

        store.set_default_policy(tenant, b_id).await.unwrap();

        assert_eq!(default_count(&store, tenant).await, 1);
        let found = store.default_policy(tenant).await.unwrap().unwrap();
        assert_eq!(found.id, b_id);
    }

    #[tokio::test]
    async fn set_default_for_missing_policy_changes_nothing() {
        let store = InMemoryReturnStore::new();
        let tenant = TenantId::new();

        let a = policy(tenant, "A", true);
        let a_id = a.id;
        store.insert_policy(a).await.unwrap();

        let err = store
            .set_default_policy(tenant, PolicyId::new(EntityId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));

        // The previous default is untouched.
        let found = store.default_policy(tenant).await.unwrap().unwrap();
        assert_eq!(found.id, a_id);
    }

    #[tokio::test]
    async fn default_policy_ignores_inactive_and_other_tenants() {
        let store = InMemoryReturnStore::new();
        let tenant = TenantId::new();
        let other = TenantId::new();

        let mut inactive = policy(tenant, "Old", true);
        inactive.is_active = false;
        store.insert_policy(inactive).await.unwrap();
        store.insert_policy(policy(other, "Theirs", true)).await.unwrap();

        assert!(store.default_policy(tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reason_listing_is_ordered_and_respects_active_flag() {
        let store = InMemoryReturnStore::new();
        let tenant = TenantId::new();

        for (i, (label, active)) in [("Other", true), ("Wrong size", true), ("Legacy", false)]
            .iter()
            .enumerate()
        {
            store
                .upsert_reason(ReturnReason {
                    id: ReasonId::new(EntityId::new()),
                    tenant_id: tenant,
                    reason: (*label).to_string(),
                    is_active: *active,
                    // Reverse insertion order to prove sorting.
                    sort_order: (2 - i) as u32,
                })
                .await
                .unwrap();
        }

        let visible = store.list_reasons(tenant, true).await.unwrap();
        let labels: Vec<_> = visible.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(labels, vec!["Wrong size", "Other"]);

        let all = store.list_reasons(tenant, false).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
