#[cfg(test)]
#[macro_use]
extern crate sable_crypto;
