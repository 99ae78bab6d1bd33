// Entity Models
// Account is the only persisted entity: stable identity (UUID) plus values
// that change through deposits, withdrawals and field updates.

pub mod account;

pub use account::{Account, AccountPatch, NewAccount};
