//! Network fee policy: the rate calculation and the inputs earmarked to
//! pay it.

use crate::data_model::TxoRef;
use crate::errors::SableError;
use crate::serialization::SableFromToBytes;
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey};
use crate::xfr::structs::{BlindAssetRecord, OwnerMemo};
use num_integer::Integer;
use ruc::*;

/// Fees below this amount are rejected by the network.
pub const TX_FEE_MIN: u64 = 10_000;

/// Destination account for network fees. Records sent here are unspendable:
/// no secret key is known for the all-zero public key.
pub fn fee_dest_pubkey() -> Result<XfrPublicKey> {
    XfrPublicKey::sable_from_bytes(&[0u8; ed25519_dalek::PUBLIC_KEY_LENGTH]).c(d!())
}

/// An exact rational rate
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Fraction {
    pub num: u64,
    pub denom: u64,
}

impl Fraction {
    pub fn new(num: u64, denom: u64) -> Self {
        Fraction { num, denom }
    }
}

/// Computes `ceil(outstanding_balance * rate)` in exact integer arithmetic.
/// The intermediate product is taken in u128, so it cannot wrap; a result
/// that does not fit back into u64 is an overflow.
pub fn calculate_fee(outstanding_balance: u64, rate: Fraction) -> Result<u64> {
    if rate.denom == 0 {
        return Err(eg!(SableError::DivisionByZero));
    }
    let product = (outstanding_balance as u128) * (rate.num as u128);
    let fee = Integer::div_ceil(&product, &(rate.denom as u128));
    u64::try_from(fee).map_err(|_| eg!(SableError::ArithmeticOverflow))
}

/// One input earmarked to pay the fee
#[derive(Clone, Debug)]
pub struct FeeInput {
    /// Amount of this input to spend towards the fee
    pub am: u64,
    /// Reference to the input on the ledger
    pub tr: TxoRef,
    /// The record as stored by the ledger
    pub ar: BlindAssetRecord,
    /// Decryption memo, present when the record hides a field
    pub om: Option<OwnerMemo>,
    /// Owner keypair, needed to open the record and to sign
    pub kp: XfrKeyPair,
}

/// Ordered fee inputs, appended to incrementally and consumed once by
/// `TransferOperationBuilder::add_fee`.
#[derive(Clone, Debug, Default)]
pub struct FeeInputs {
    pub inner: Vec<FeeInput>,
}

impl FeeInputs {
    pub fn new() -> Self {
        FeeInputs::default()
    }

    pub fn append(
        &mut self,
        am: u64,
        tr: TxoRef,
        ar: BlindAssetRecord,
        om: Option<OwnerMemo>,
        kp: XfrKeyPair,
    ) -> &mut Self {
        self.inner.push(FeeInput { am, tr, ar, om, kp });
        self
    }
}
