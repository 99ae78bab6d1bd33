// Account errors - one taxonomy shared by operations, stores and handlers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    // ========================================================================
    // CLIENT ERRORS (caller can fix the request)
    // ========================================================================
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Account not found: {0}")]
    NotFound(String),

    // ========================================================================
    // STORE ERRORS
    // ========================================================================
    #[error("Duplicate account number: {0}")]
    DuplicateKey(String),

    #[error("Invalid account record: {0}")]
    InvalidRecord(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    pub fn not_found(id: &str) -> Self {
        AccountError::NotFound(id.to_string())
    }

    /// Validation failures the caller can correct (mapped to 400)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AccountError::InvalidAmount(_) | AccountError::InsufficientFunds { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AccountError::NotFound(_))
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                AccountError::DuplicateKey(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            rusqlite::Error::SqliteFailure(code, msg)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL =>
            {
                AccountError::InvalidRecord(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => AccountError::StoreUnavailable(err.to_string()),
        }
    }
}
