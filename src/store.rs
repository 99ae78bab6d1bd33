// Account Store - persistence capability used by the request handlers
//
// Implementations:
// - `SqliteAccountStore` (db.rs) - durable, default for the server
// - `InMemoryAccountStore` (here) - tests and `--in-memory` mode
//
// Every implementation enforces the same record checks at its boundary:
// required fields, non-negative balance/count, unique account number.

use std::sync::{Arc, RwLock};

use crate::entities::{Account, AccountPatch, NewAccount};
use crate::error::{AccountError, AccountResult};

pub trait AccountStore: Send + Sync {
    /// Insert a new account; the store assigns the id.
    fn create(&self, data: NewAccount) -> AccountResult<Account>;

    /// All accounts in insertion order.
    fn find_all(&self) -> AccountResult<Vec<Account>>;

    fn find_by_id(&self, id: &str) -> AccountResult<Account>;

    /// Apply `patch` and return the stored result.
    fn update(&self, id: &str, patch: &AccountPatch) -> AccountResult<Account>;

    /// Remove and return the account.
    fn delete(&self, id: &str) -> AccountResult<Account>;
}

pub(crate) fn new_account_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Accounts held in memory, in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<Vec<Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    fn lock_err<T>(_: T) -> AccountError {
        AccountError::StoreUnavailable("account store lock poisoned".to_string())
    }
}

fn ensure_unique(accounts: &[Account], account_number: i64, except_id: Option<&str>) -> AccountResult<()> {
    let taken = accounts
        .iter()
        .any(|a| a.account_number == account_number && Some(a.id.as_str()) != except_id);

    if taken {
        return Err(AccountError::DuplicateKey(account_number.to_string()));
    }
    Ok(())
}

impl AccountStore for InMemoryAccountStore {
    fn create(&self, data: NewAccount) -> AccountResult<Account> {
        let account = data.into_account(new_account_id())?;

        let mut accounts = self.accounts.write().map_err(Self::lock_err)?;
        ensure_unique(&accounts, account.account_number, None)?;
        accounts.push(account.clone());

        Ok(account)
    }

    fn find_all(&self) -> AccountResult<Vec<Account>> {
        let accounts = self.accounts.read().map_err(Self::lock_err)?;
        Ok(accounts.clone())
    }

    fn find_by_id(&self, id: &str) -> AccountResult<Account> {
        let accounts = self.accounts.read().map_err(Self::lock_err)?;
        accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| AccountError::not_found(id))
    }

    fn update(&self, id: &str, patch: &AccountPatch) -> AccountResult<Account> {
        let mut accounts = self.accounts.write().map_err(Self::lock_err)?;

        let index = accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AccountError::not_found(id))?;

        let next = patch.apply(&accounts[index])?;
        ensure_unique(&accounts, next.account_number, Some(id))?;
        accounts[index] = next.clone();

        Ok(next)
    }

    fn delete(&self, id: &str) -> AccountResult<Account> {
        let mut accounts = self.accounts.write().map_err(Self::lock_err)?;

        let index = accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AccountError::not_found(id))?;

        Ok(accounts.remove(index))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_id_and_defaults() {
        let store = InMemoryAccountStore::new();

        let account = store
            .create(NewAccount::new(1001, "Ana").with_balance(100000.0))
            .unwrap();

        assert!(!account.id.is_empty());
        assert_eq!(account.balance, 100000.0);
        assert_eq!(account.transaction_count, 0);
        assert_eq!(store.find_by_id(&account.id).unwrap(), account);
    }

    #[test]
    fn test_duplicate_account_number() {
        let store = InMemoryAccountStore::new();
        store.create(NewAccount::new(1001, "Ana")).unwrap();

        let err = store.create(NewAccount::new(1001, "Luis")).unwrap_err();

        assert!(matches!(err, AccountError::DuplicateKey(_)));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_find_all_keeps_insertion_order() {
        let store = InMemoryAccountStore::new();
        store.create(NewAccount::new(3, "C")).unwrap();
        store.create(NewAccount::new(1, "A")).unwrap();
        store.create(NewAccount::new(2, "B")).unwrap();

        let numbers: Vec<i64> = store
            .find_all()
            .unwrap()
            .iter()
            .map(|a| a.account_number)
            .collect();
        assert_eq!(numbers, vec![3, 1, 2]);
    }

    #[test]
    fn test_update_applies_patch() {
        let store = InMemoryAccountStore::new();
        let account = store.create(NewAccount::new(1001, "Ana")).unwrap();

        let updated = store
            .update(
                &account.id,
                &AccountPatch {
                    balance: Some(50.0),
                    transaction_count: Some(1),
                    ..AccountPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.balance, 50.0);
        assert_eq!(updated.transaction_count, 1);
        assert_eq!(updated.holder_name, "Ana");
        assert_eq!(store.find_by_id(&account.id).unwrap(), updated);
    }

    #[test]
    fn test_update_rejects_taken_account_number() {
        let store = InMemoryAccountStore::new();
        store.create(NewAccount::new(1001, "Ana")).unwrap();
        let luis = store.create(NewAccount::new(2002, "Luis")).unwrap();

        let err = store
            .update(
                &luis.id,
                &AccountPatch {
                    account_number: Some(1001),
                    ..AccountPatch::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, AccountError::DuplicateKey(_)));
        assert_eq!(store.find_by_id(&luis.id).unwrap().account_number, 2002);
    }

    #[test]
    fn test_update_own_number_is_not_a_duplicate() {
        let store = InMemoryAccountStore::new();
        let ana = store.create(NewAccount::new(1001, "Ana")).unwrap();

        let result = store.update(&ana.id, &AccountPatch::snapshot(&ana));
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_ids() {
        let store = InMemoryAccountStore::new();

        assert!(store.find_by_id("nope").unwrap_err().is_not_found());
        assert!(store
            .update("nope", &AccountPatch::default())
            .unwrap_err()
            .is_not_found());
        assert!(store.delete("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_returns_removed_account() {
        let store = InMemoryAccountStore::new();
        let account = store.create(NewAccount::new(1001, "Ana")).unwrap();

        let removed = store.delete(&account.id).unwrap();

        assert_eq!(removed, account);
        assert_eq!(store.count(), 0);
        assert!(store.find_by_id(&account.id).is_err());
    }
}
