// 💳 Account Entity - Stable identity, mutable values
//
// "Account id is IDENTITY (never changes), holder name and balance are VALUES"
//
// - id is assigned by the store at creation and never changes
// - account_number is unique across all accounts
// - balance never goes negative once a change is committed
// - transaction_count only grows, one step per committed deposit/withdrawal

use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Bank account number, unique per store
    pub account_number: i64,

    /// Display name of the account holder
    pub holder_name: String,

    /// Current balance (>= 0)
    pub balance: f64,

    /// Number of committed deposits and withdrawals
    pub transaction_count: u64,
}

impl Account {
    /// Check if a withdrawal of `amount` would be covered
    pub fn covers(&self, amount: f64) -> bool {
        amount <= self.balance
    }
}

// ============================================================================
// NEW ACCOUNT (create input)
// ============================================================================

/// Data for a create request, before the store has checked and accepted it.
///
/// Required fields are optional here on purpose: a request that omits them is
/// still handed to the store, which rejects it with `InvalidRecord`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAccount {
    pub account_number: Option<i64>,
    pub holder_name: Option<String>,
    pub balance: f64,
    pub transaction_count: f64,
}

impl NewAccount {
    pub fn new(account_number: i64, holder_name: impl Into<String>) -> Self {
        NewAccount {
            account_number: Some(account_number),
            holder_name: Some(holder_name.into()),
            balance: 0.0,
            transaction_count: 0.0,
        }
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_transaction_count(mut self, transaction_count: f64) -> Self {
        self.transaction_count = transaction_count;
        self
    }

    /// Record checks applied by every store before inserting.
    pub fn into_account(self, id: String) -> AccountResult<Account> {
        let account_number = self
            .account_number
            .ok_or_else(|| AccountError::InvalidRecord("accountNumber is required".to_string()))?;

        let holder_name = self
            .holder_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AccountError::InvalidRecord("holderName is required".to_string()))?;

        check_balance(self.balance)?;
        let transaction_count = check_transaction_count(self.transaction_count)?;

        Ok(Account {
            id,
            account_number,
            holder_name,
            balance: self.balance,
            transaction_count,
        })
    }
}

// ============================================================================
// ACCOUNT PATCH (update input)
// ============================================================================

/// Partial update handed to `AccountStore::update`. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub account_number: Option<i64>,
    pub holder_name: Option<String>,
    pub balance: Option<f64>,
    pub transaction_count: Option<u64>,
}

impl AccountPatch {
    /// Patch that writes back every mutable field of `account`
    pub fn snapshot(account: &Account) -> Self {
        AccountPatch {
            account_number: Some(account.account_number),
            holder_name: Some(account.holder_name.clone()),
            balance: Some(account.balance),
            transaction_count: Some(account.transaction_count),
        }
    }

    /// Apply to a copy of the stored record, enforcing record checks.
    pub fn apply(&self, account: &Account) -> AccountResult<Account> {
        let mut next = account.clone();

        if let Some(account_number) = self.account_number {
            next.account_number = account_number;
        }
        if let Some(holder_name) = &self.holder_name {
            if holder_name.trim().is_empty() {
                return Err(AccountError::InvalidRecord(
                    "holderName cannot be empty".to_string(),
                ));
            }
            next.holder_name = holder_name.clone();
        }
        if let Some(balance) = self.balance {
            check_balance(balance)?;
            next.balance = balance;
        }
        if let Some(transaction_count) = self.transaction_count {
            next.transaction_count = transaction_count;
        }

        Ok(next)
    }
}

fn check_balance(balance: f64) -> AccountResult<()> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(AccountError::InvalidRecord(format!(
            "balance must be a non-negative number, got {}",
            balance
        )));
    }
    Ok(())
}

fn check_transaction_count(count: f64) -> AccountResult<u64> {
    if !count.is_finite() || count < 0.0 || count.fract() != 0.0 {
        return Err(AccountError::InvalidRecord(format!(
            "transactionCount must be a non-negative integer, got {}",
            count
        )));
    }
    Ok(count as u64)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_account() -> Account {
        NewAccount::new(1001, "Ana")
            .with_balance(100000.0)
            .into_account("test-id".to_string())
            .unwrap()
    }

    #[test]
    fn test_account_creation_defaults() {
        let account = NewAccount::new(1001, "Ana")
            .into_account("id-1".to_string())
            .unwrap();

        assert_eq!(account.id, "id-1");
        assert_eq!(account.account_number, 1001);
        assert_eq!(account.holder_name, "Ana");
        assert_eq!(account.balance, 0.0);
        assert_eq!(account.transaction_count, 0);
    }

    #[test]
    fn test_account_requires_number_and_name() {
        let missing_number = NewAccount {
            holder_name: Some("Ana".to_string()),
            ..NewAccount::default()
        };
        assert!(matches!(
            missing_number.into_account("x".to_string()),
            Err(AccountError::InvalidRecord(_))
        ));

        let blank_name = NewAccount::new(1001, "   ");
        assert!(matches!(
            blank_name.into_account("x".to_string()),
            Err(AccountError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_account_rejects_negative_values() {
        let negative_balance = NewAccount::new(1001, "Ana").with_balance(-1.0);
        assert!(negative_balance.into_account("x".to_string()).is_err());

        let negative_count = NewAccount::new(1001, "Ana").with_transaction_count(-3.0);
        assert!(negative_count.into_account("x".to_string()).is_err());

        let fractional_count = NewAccount::new(1001, "Ana").with_transaction_count(1.5);
        assert!(fractional_count.into_account("x".to_string()).is_err());
    }

    #[test]
    fn test_account_covers() {
        let account = create_test_account();
        assert!(account.covers(100000.0));
        assert!(account.covers(1.0));
        assert!(!account.covers(100000.01));
    }

    #[test]
    fn test_account_json_layout() {
        let account = create_test_account();
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["id"], "test-id");
        assert_eq!(json["accountNumber"], 1001);
        assert_eq!(json["holderName"], "Ana");
        assert_eq!(json["balance"], 100000.0);
        assert_eq!(json["transactionCount"], 0);
    }

    #[test]
    fn test_patch_apply_leaves_source_untouched() {
        let account = create_test_account();
        let patch = AccountPatch {
            holder_name: Some("Ana María".to_string()),
            ..AccountPatch::default()
        };

        let next = patch.apply(&account).unwrap();
        assert_eq!(next.holder_name, "Ana María");
        assert_eq!(next.balance, account.balance);
        assert_eq!(account.holder_name, "Ana");
    }

    #[test]
    fn test_patch_rejects_negative_balance() {
        let account = create_test_account();
        let patch = AccountPatch {
            balance: Some(-5.0),
            ..AccountPatch::default()
        };

        assert!(matches!(
            patch.apply(&account),
            Err(AccountError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_patch_rejects_infinite_balance() {
        let account = create_test_account();
        let patch = AccountPatch {
            balance: Some(1e308 + 1e308),
            ..AccountPatch::default()
        };

        assert!(matches!(
            patch.apply(&account),
            Err(AccountError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_patch_snapshot() {
        let account = create_test_account();
        let patch = AccountPatch::snapshot(&account);

        assert_eq!(patch.balance, Some(100000.0));
        assert_eq!(AccountPatch::default().apply(&account).unwrap(), account);
        assert_eq!(patch.apply(&account).unwrap(), account);
    }
}
