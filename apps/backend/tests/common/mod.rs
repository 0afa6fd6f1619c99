#![allow(dead_code)]

// tests/common/mod.rs
use scriptorium::db::txn_policy::{set_txn_policy, TxnPolicy};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

// Every test builds its own state, so commits are the default. Set
// `SCRIPTORIUM_TXN_POLICY=rollback` to keep a shared database pristine.
#[ctor::ctor]
fn init_txn_policy() {
    let policy = match std::env::var("SCRIPTORIUM_TXN_POLICY")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "rollback" => TxnPolicy::RollbackOnOk,
        _ => TxnPolicy::CommitOnOk,
    };

    set_txn_policy(policy);
}
