//!
//! Sable: cryptographic primitives for the wallet core
//!

#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate serde_derive;

// let the serialization macro refer to this crate by its external name
extern crate self as sable_crypto;

/// Implement serde `Serialize`/`Deserialize` through `SableFromToBytes`:
/// base64 strings in human-readable formats, raw bytes otherwise.
#[macro_export]
macro_rules! serialize_deserialize {
    ($t:ident) => {
        impl serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&sable_crypto::b64enc(&self.sable_to_bytes()))
                } else {
                    serializer.serialize_bytes(&self.sable_to_bytes())
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bytes = if deserializer.is_human_readable() {
                    deserializer
                        .deserialize_str(sable_crypto::serialization::sable_obj_serde::BytesVisitor)?
                } else {
                    deserializer
                        .deserialize_bytes(sable_crypto::serialization::sable_obj_serde::BytesVisitor)?
                };
                $t::sable_from_bytes(bytes.as_slice()).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Assert that a `ruc` error chain carries the message of the expected
/// error; an optional third argument customises the panic message.
#[macro_export]
macro_rules! msg_eq {
    ($sable_err: expr, $ruc_err: expr $(,)?) => {
        assert!($ruc_err.msg_has_overloop(ruc::eg!($sable_err).as_ref()));
    };
    ($sable_err: expr, $ruc_err: expr, $msg: expr $(,)?) => {
        assert!($ruc_err.msg_has_overloop(ruc::eg!($sable_err).as_ref()), $msg);
    };
}

pub mod basic;
pub mod errors;
pub mod serialization;

use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use errors::CryptoError;
use ruc::*;

const BASE64_PADDING_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const BASE64_ENGINE: GeneralPurpose = GeneralPurpose::new(&URL_SAFE, BASE64_PADDING_CONFIG);

/// Convert the input into the base64 encoding
pub fn b64enc<T: ?Sized + AsRef<[u8]>>(input: &T) -> String {
    BASE64_ENGINE.encode(input)
}

/// Reconstruct from the base64 encoding
pub fn b64dec<T: ?Sized + AsRef<[u8]>>(input: &T) -> Result<Vec<u8>> {
    BASE64_ENGINE
        .decode(input)
        .map_err(|_| eg!(CryptoError::DeserializationError))
}

/// Convert a 4 byte array (big-endian) into a u32
pub fn u8_be_slice_to_u32(slice: &[u8]) -> u32 {
    let mut a = [0u8; 4];
    a.copy_from_slice(slice);
    u32::from_be_bytes(a)
}

/// Convert an 8 byte array (big-endian) into a u64
pub fn u8_be_slice_to_u64(slice: &[u8]) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(slice);
    u64::from_be_bytes(a)
}

/// Split a u64 into a pair of u32, (low, high)
pub fn u64_to_u32_pair(x: u64) -> (u32, u32) {
    ((x & 0xFFFF_FFFF) as u32, (x >> 32) as u32)
}

/// Reassemble a u64 from its (low, high) u32 halves
pub fn u32_pair_to_u64(pair: (u32, u32)) -> u64 {
    (pair.0 as u64) | ((pair.1 as u64) << 32)
}

#[cfg(test)]
mod test {
    #[test]
    fn u64_u32_pair() {
        let n = 0xDEAD_BEEF_0BAD_F00Du64;
        let (lo, hi) = super::u64_to_u32_pair(n);
        assert_eq!(lo, 0x0BAD_F00D);
        assert_eq!(hi, 0xDEAD_BEEF);
        assert_eq!(super::u32_pair_to_u64((lo, hi)), n);
    }

    #[test]
    fn b64_round_trip() {
        let bytes = [7u8, 0, 255, 1, 2, 3];
        let enc = super::b64enc(&bytes);
        assert_eq!(super::b64dec(&enc).unwrap(), bytes.to_vec());
        assert!(super::b64dec("not//valid~~").is_err());
    }

    #[test]
    fn be_slices() {
        assert_eq!(super::u8_be_slice_to_u32(&[0, 0, 1, 2]), 258);
        assert_eq!(super::u8_be_slice_to_u64(&[0, 0, 0, 0, 0, 0, 1, 2]), 258);
    }
}
