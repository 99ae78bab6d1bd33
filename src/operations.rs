// Account Operations - balance and transaction-count rules
//
// Pure with respect to persistence: each operation checks and mutates an
// in-memory record, the caller commits it through an `AccountStore`.
// A failed operation leaves the record exactly as it was.

use serde_json::Value;

use crate::coerce;
use crate::entities::Account;
use crate::error::{AccountError, AccountResult};

// ============================================================================
// AMOUNTS
// ============================================================================

/// Parse the `monto` value of a deposit/withdraw request.
///
/// Accepts whatever `coerce::to_number` accepts, then applies the same
/// positivity check as the operations. A missing value is not a number.
pub fn parse_amount(value: Option<&Value>) -> AccountResult<f64> {
    let raw = value.ok_or_else(|| AccountError::InvalidAmount("amount is required".to_string()))?;
    let amount = coerce::to_number(raw)
        .ok_or_else(|| AccountError::InvalidAmount(format!("{} is not a number", raw)))?;
    check_amount(amount)?;
    Ok(amount)
}

fn check_amount(amount: f64) -> AccountResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AccountError::InvalidAmount(format!(
            "amount must be a positive number, got {}",
            amount
        )));
    }
    Ok(())
}

// ============================================================================
// DEPOSIT / WITHDRAW
// ============================================================================

/// Add `amount` to the balance and count one transaction.
pub fn deposit(account: &mut Account, amount: f64) -> AccountResult<&mut Account> {
    check_amount(amount)?;

    account.balance += amount;
    account.transaction_count += 1;
    Ok(account)
}

/// Take `amount` from the balance and count one transaction.
///
/// Withdrawing the full balance is allowed and leaves it at zero.
pub fn withdraw(account: &mut Account, amount: f64) -> AccountResult<&mut Account> {
    check_amount(amount)?;

    if !account.covers(amount) {
        return Err(AccountError::InsufficientFunds {
            requested: amount,
            available: account.balance,
        });
    }

    account.balance -= amount;
    account.transaction_count += 1;
    Ok(account)
}

// ============================================================================
// FIELD UPDATE
// ============================================================================

/// Descriptive fields a client may change. Balance and transaction count are
/// deliberately absent: they only move through deposit/withdraw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    pub holder_name: Option<String>,
    pub account_number: Option<i64>,
}

impl FieldUpdate {
    /// Build from a JSON body, keeping only present and truthy fields.
    ///
    /// A truthy `accountNumber` that is not an integer is a bad record.
    pub fn from_json(body: &Value) -> AccountResult<Self> {
        let field = |camel: &str, legacy: &str| {
            body.get(camel)
                .or_else(|| body.get(legacy))
                .filter(|v| coerce::is_truthy(v))
                .cloned()
        };

        let holder_name = match field("holderName", "nombreCliente") {
            Some(Value::String(name)) => Some(name),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        let account_number = match field("accountNumber", "nroCuenta") {
            Some(raw) => Some(coerce::to_integer(&raw).ok_or_else(|| {
                AccountError::InvalidRecord(format!("accountNumber must be an integer, got {}", raw))
            })?),
            None => None,
        };

        Ok(FieldUpdate {
            holder_name,
            account_number,
        })
    }
}

/// Overwrite holder name and/or account number when present and truthy.
pub fn update_fields<'a>(account: &'a mut Account, update: &FieldUpdate) -> &'a mut Account {
    if let Some(name) = update.holder_name.as_ref().filter(|n| !n.is_empty()) {
        account.holder_name = name.clone();
    }
    if let Some(number) = update.account_number.filter(|n| *n != 0) {
        account.account_number = number;
    }
    account
}

// ============================================================================
// TESTS
// ============================================================================
