//! Transaction construction: the transfer operation builder and the fee
//! policy it enforces.

pub mod builder;
pub mod fee;
