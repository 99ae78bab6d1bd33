use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::entities::{Account, AccountPatch, NewAccount};
use crate::error::{AccountError, AccountResult};
use crate::store::{new_account_id, AccountStore};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    // ==========================================================================
    // Accounts Table
    // seq keeps insertion order, id is the public identity
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            account_number INTEGER UNIQUE NOT NULL,
            holder_name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0 CHECK (balance >= 0),
            transaction_count INTEGER NOT NULL DEFAULT 0 CHECK (transaction_count >= 0),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_number ON accounts(account_number)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn).context("Failed to set up database schema")?;
    Ok(conn)
}

pub fn count_accounts(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;

    Ok(count)
}

const SELECT_ACCOUNT: &str =
    "SELECT id, account_number, holder_name, balance, transaction_count FROM accounts";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let transaction_count: i64 = row.get(4)?;

    Ok(Account {
        id: row.get(0)?,
        account_number: row.get(1)?,
        holder_name: row.get(2)?,
        balance: row.get(3)?,
        transaction_count: u64::try_from(transaction_count).unwrap_or(0),
    })
}

fn find_account(conn: &Connection, id: &str) -> AccountResult<Option<Account>> {
    let account = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_ACCOUNT),
            params![id],
            account_from_row,
        )
        .optional()?;

    Ok(account)
}

fn count_as_sql(count: u64) -> AccountResult<i64> {
    i64::try_from(count).map_err(|_| {
        AccountError::InvalidRecord(format!("transactionCount {} is out of range", count))
    })
}

// ============================================================================
// SQLITE ACCOUNT STORE
// ============================================================================

/// `AccountStore` over a single SQLite connection.
///
/// Calls are serialised through the mutex; a deposit's load and save are two
/// separate calls, so concurrent writers to the same account can interleave.
#[derive(Clone)]
pub struct SqliteAccountStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAccountStore {
    /// Wrap a connection, creating the schema if needed
    pub fn new(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteAccountStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_database(path)?;
        Ok(SqliteAccountStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn conn(&self) -> AccountResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AccountError::StoreUnavailable("database lock poisoned".to_string()))
    }
}

impl AccountStore for SqliteAccountStore {
    fn create(&self, data: NewAccount) -> AccountResult<Account> {
        let account = data.into_account(new_account_id())?;
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO accounts (id, account_number, holder_name, balance, transaction_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id,
                account.account_number,
                account.holder_name,
                account.balance,
                count_as_sql(account.transaction_count)?,
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!(id = %account.id, account_number = account.account_number, "account inserted");
                Ok(account)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(AccountError::DuplicateKey(account.account_number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_all(&self) -> AccountResult<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY seq", SELECT_ACCOUNT))?;

        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    fn find_by_id(&self, id: &str) -> AccountResult<Account> {
        let conn = self.conn()?;
        find_account(&conn, id)?.ok_or_else(|| AccountError::not_found(id))
    }

    fn update(&self, id: &str, patch: &AccountPatch) -> AccountResult<Account> {
        let conn = self.conn()?;

        let current = find_account(&conn, id)?.ok_or_else(|| AccountError::not_found(id))?;
        let next = patch.apply(&current)?;

        let result = conn.execute(
            "UPDATE accounts
             SET account_number = ?1,
                 holder_name = ?2,
                 balance = ?3,
                 transaction_count = ?4
             WHERE id = ?5",
            params![
                next.account_number,
                next.holder_name,
                next.balance,
                count_as_sql(next.transaction_count)?,
                id,
            ],
        );

        match result {
            Ok(0) => Err(AccountError::not_found(id)),
            Ok(_) => Ok(next),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(AccountError::DuplicateKey(next.account_number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &str) -> AccountResult<Account> {
        let conn = self.conn()?;

        let account = find_account(&conn, id)?.ok_or_else(|| AccountError::not_found(id))?;
        conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper function to create a fresh in-memory store
    fn create_test_store() -> SqliteAccountStore {
        SqliteAccountStore::in_memory().unwrap()
    }

    #[test]
    fn test_setup_database_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(count_accounts(&conn).unwrap(), 0);
    }

    #[test]
    fn test_create_and_find() {
        let store = create_test_store();

        let created = store
            .create(NewAccount::new(1001, "Ana").with_balance(100000.0))
            .unwrap();
        let found = store.find_by_id(&created.id).unwrap();

        assert_eq!(found, created);
        assert_eq!(found.transaction_count, 0);
    }

    #[test]
    fn test_duplicate_account_number_rejected() {
        let store = create_test_store();
        store.create(NewAccount::new(1001, "Ana")).unwrap();

        let err = store.create(NewAccount::new(1001, "Luis")).unwrap_err();

        assert!(matches!(err, AccountError::DuplicateKey(_)));
        assert_eq!(store.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_record_rejected_before_insert() {
        let store = create_test_store();

        let err = store
            .create(NewAccount::new(1001, "Ana").with_balance(-10.0))
            .unwrap_err();

        assert!(matches!(err, AccountError::InvalidRecord(_)));
        assert!(store.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_find_all_in_insertion_order() {
        let store = create_test_store();
        for (number, name) in [(30, "C"), (10, "A"), (20, "B")] {
            store.create(NewAccount::new(number, name)).unwrap();
        }

        let names: Vec<String> = store
            .find_all()
            .unwrap()
            .into_iter()
            .map(|a| a.holder_name)
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_update_persists_patch() {
        let store = create_test_store();
        let account = store
            .create(NewAccount::new(1001, "Ana").with_balance(100000.0))
            .unwrap();

        let mut changed = account.clone();
        changed.balance = 105000.0;
        changed.transaction_count = 1;

        let updated = store
            .update(&account.id, &AccountPatch::snapshot(&changed))
            .unwrap();

        assert_eq!(updated, changed);
        assert_eq!(store.find_by_id(&account.id).unwrap(), changed);
    }

    #[test]
    fn test_update_duplicate_number() {
        let store = create_test_store();
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
    }

    #[test]
    fn test_delete() {
        let store = create_test_store();
        let account = store.create(NewAccount::new(1001, "Ana")).unwrap();

        let removed = store.delete(&account.id).unwrap();
        assert_eq!(removed.id, account.id);

        assert!(store.find_by_id(&account.id).unwrap_err().is_not_found());
        assert!(store.delete(&account.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_check_constraint_backs_up_record_checks() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let err: AccountError = conn
            .execute(
                "INSERT INTO accounts (id, account_number, holder_name, balance) VALUES ('x', 1, 'Ana', -1)",
                [],
            )
            .unwrap_err()
            .into();

        assert!(matches!(err, AccountError::InvalidRecord(_)));
    }
}
