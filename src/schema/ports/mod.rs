//! Port contracts for schema reconciliation.
//!
//! Ports define infrastructure-agnostic interfaces used by reconciliation
//! services: the raw remote schema SDK, the account directory consulted by
//! seed scripts, and the optional run ledger.

pub mod accounts;
pub mod client;
pub mod ledger;

pub use accounts::{AccountDirectory, NewUserAccount, UserAccount};
pub use client::{
    CallArgs, CallParams, CallingConvention, ParseCallingConventionError, RemoteError,
    SchemaClient, SchemaClientError, SchemaClientResult, SchemaMethod,
};
pub use ledger::{LedgerError, LedgerResult, RunLedger};
