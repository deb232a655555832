use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::backend::traits::BackendApi;
use crate::errors::CoreError;
use crate::models::deposit::{Deposit, DepositChanges, NewDeposit};
use crate::services::in_flight::{LoadingFlag, UpdatingSet};
use crate::utils::validation;

/// Owns the user's bank deposits.
///
/// Same contract as the exchange ledger without the pricing: the backend is
/// authoritative, the local list changes only after a 200 answer, and every
/// mutation marks its id as updating until it settles.
pub struct DepositLedger {
    api: Arc<dyn BackendApi>,
    user_id: String,
    items: Mutex<Vec<Deposit>>,
    updating: UpdatingSet,
    loading: LoadingFlag,
}

impl DepositLedger {
    pub fn new(api: Arc<dyn BackendApi>, user_id: impl Into<String>) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            items: Mutex::new(Vec::new()),
            updating: UpdatingSet::new(),
            loading: LoadingFlag::default(),
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<Deposit>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn items(&self) -> Vec<Deposit> {
        self.lock_items().clone()
    }

    pub fn get(&self, id: &str) -> Option<Deposit> {
        self.lock_items().iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    pub fn is_updating(&self, id: &str) -> bool {
        self.updating.contains(id)
    }

    pub fn updating_ids(&self) -> Vec<String> {
        self.updating.ids()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    fn require(&self, id: &str) -> Result<Deposit, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))
    }

    /// Open a deposit on the backend and reload the list.
    pub async fn add(&self, deposit: NewDeposit) -> Result<(), CoreError> {
        validation::require_name(&deposit.name)?;
        validation::require_positive("amount", deposit.amount)?;
        validation::require_non_negative("rate", deposit.rate_percent)?;

        {
            let _loading = self.loading.begin();
            self.api
                .add_deposit(&self.user_id, &deposit)
                .await?
                .into_success("add-deposit")?;
        }
        info!(name = %deposit.name, amount = deposit.amount, "deposit added");

        self.load_all().await
    }

    /// Set the balance to `amount`.
    pub async fn update_amount(&self, id: &str, amount: f64) -> Result<Deposit, CoreError> {
        validation::require_non_negative("amount", amount)?;
        let previous = self.require(id)?;

        let _updating = self.updating.mark(id);
        let echoed = self
            .api
            .edit_deposit_amount(id, amount)
            .await?
            .into_success("edit-deposit-amount")?;

        let updated = echoed.unwrap_or(Deposit { amount, ..previous });
        self.splice(updated.clone());
        debug!(%id, amount = updated.amount, "deposit amount updated");
        Ok(updated)
    }

    /// Top up (`delta > 0`) or withdraw (`delta < 0`). The backend receives
    /// the resulting balance, which must not go below zero.
    pub async fn adjust_amount(&self, id: &str, delta: f64) -> Result<Deposit, CoreError> {
        if !delta.is_finite() {
            return Err(CoreError::ValidationError("amount change must be a finite number".into()));
        }
        let current = self.require(id)?;
        let amount = current.amount + delta;
        validation::require_non_negative("amount", amount)?;
        self.update_amount(id, amount).await
    }

    /// Edit name, maturity date and rate.
    pub async fn update_fields(&self, id: &str, changes: DepositChanges) -> Result<Deposit, CoreError> {
        validation::require_non_negative("rate", changes.rate_percent)?;
        let previous = self.require(id)?;

        let _updating = self.updating.mark(id);
        let echoed = self
            .api
            .edit_deposit(id, &changes)
            .await?
            .into_success("edit-deposit")?;

        let updated = echoed.unwrap_or_else(|| {
            let mut updated = previous;
            updated.apply_changes(&changes);
            updated
        });
        self.splice(updated.clone());
        Ok(updated)
    }

    /// Close a deposit. It stays in the list unless the backend confirms.
    pub async fn remove(&self, id: &str) -> Result<(), CoreError> {
        self.require(id)?;

        let _updating = self.updating.mark(id);
        self.api
            .delete_deposit(id)
            .await?
            .into_success("delete-deposit")?;

        self.lock_items().retain(|d| d.id != id);
        info!(%id, "deposit removed");
        Ok(())
    }

    /// Replace the list with the backend's. On failure the previous list
    /// stays in place.
    pub async fn load_all(&self) -> Result<(), CoreError> {
        let _loading = self.loading.begin();

        let body = self
            .api
            .list_deposits(&self.user_id)
            .await?
            .into_success("list-deposits")?;
        let Some(deposits) = body else {
            debug!("deposit list response without userDeposits, keeping current list");
            return Ok(());
        };

        debug!(count = deposits.len(), "deposits loaded");
        *self.lock_items() = deposits;
        Ok(())
    }

    fn splice(&self, updated: Deposit) {
        let mut items = self.lock_items();
        match items.iter_mut().find(|d| d.id == updated.id) {
            Some(slot) => *slot = updated,
            None => debug!(id = %updated.id, "deposit vanished during edit"),
        }
    }
}

impl std::fmt::Debug for DepositLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositLedger")
            .field("user_id", &self.user_id)
            .field("items", &self.len())
            .field("updating", &self.updating.ids())
            .field("loading", &self.is_loading())
            .finish()
    }
}
