//!
//! Sable: transaction building and proof verification for a confidential UTXO ledger
//!

#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate sable_crypto;

#[macro_use]
extern crate serde_derive;

pub mod authentication;
pub mod data_model;
pub mod errors;
pub mod hashing;
pub mod serialization;
pub mod txn;
pub mod xfr;

pub use sable_crypto::errors as crypto_errors;
