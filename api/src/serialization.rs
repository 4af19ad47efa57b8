use crate::errors::SableError;
use crate::xfr::sig::{XfrPublicKey, XfrSecretKey, XfrSignature};
use crate::xfr::structs::{AssetType, ASSET_TYPE_LENGTH};
use ed25519_dalek::{SigningKey, VerifyingKey};
use ruc::*;
pub use sable_crypto::serialization::SableFromToBytes;

impl SableFromToBytes for AssetType {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ASSET_TYPE_LENGTH {
            Err(eg!(SableError::DeserializationError))
        } else {
            let mut array = [0u8; ASSET_TYPE_LENGTH];
            array.copy_from_slice(bytes);
            Ok(AssetType(array))
        }
    }
}

serialize_deserialize!(AssetType);

impl SableFromToBytes for XfrPublicKey {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| eg!(SableError::DeserializationError))?;
        let pk = VerifyingKey::from_bytes(&array).c(d!(SableError::DeserializationError))?;
        Ok(XfrPublicKey(pk))
    }
}

serialize_deserialize!(XfrPublicKey);

impl SableFromToBytes for XfrSecretKey {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| eg!(SableError::DeserializationError))?;
        Ok(XfrSecretKey(SigningKey::from_bytes(&array)))
    }
}

serialize_deserialize!(XfrSecretKey);

impl SableFromToBytes for XfrSignature {
    fn sable_to_bytes(&self) -> Vec<u8> {
        let bytes = self.0.to_bytes();
        let mut vec = vec![];
        vec.extend_from_slice(&bytes[..]);
        vec
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        match ed25519_dalek::Signature::from_slice(bytes) {
            Ok(e) => Ok(XfrSignature(e)),
            Err(_) => Err(eg!(SableError::DeserializationError)),
        }
    }
}

serialize_deserialize!(XfrSignature);
