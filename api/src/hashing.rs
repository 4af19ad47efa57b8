//! Typed sha-256 digests and signatures over bincode-encoded values.
//!
//! `HashOf<T>` and `SignatureOf<T>` tie a digest or signature to the type it
//! was computed over, so a hash of a transaction cannot be confused with a
//! hash of a state commitment carrying the same bytes.

use crate::errors::SableError;
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey, XfrSignature};
use core::fmt;
use core::marker::PhantomData;
use digest::Digest as _;
use ruc::*;
use sable_crypto::serialization::SableFromToBytes;
use sha2::Sha256;

pub const DIGESTBYTES: usize = 32;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Digest(pub [u8; DIGESTBYTES]);

impl Digest {
    pub fn from_slice(bytes: &[u8]) -> Result<Digest> {
        if bytes.len() != DIGESTBYTES {
            return Err(eg!(SableError::DeserializationError));
        }
        let mut digest = [0u8; DIGESTBYTES];
        digest.copy_from_slice(bytes);
        Ok(Digest(digest))
    }
}

impl SableFromToBytes for Digest {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<Digest> {
        Digest::from_slice(bytes).c(d!())
    }
}

serialize_deserialize!(Digest);

pub fn sha256(bytes: &[u8]) -> Digest {
    Digest(Sha256::digest(bytes).into())
}

/// Digest of the bincode encoding of a `T`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", transparent)]
pub struct HashOf<T> {
    pub hash: Digest,
    #[serde(skip)]
    phantom: PhantomData<T>,
}

impl<T: serde::Serialize> HashOf<T> {
    pub fn new(value: &T) -> Result<HashOf<T>> {
        let bytes = bincode::serialize(value).c(d!(SableError::SerializationError))?;
        Ok(HashOf {
            hash: sha256(&bytes),
            phantom: PhantomData,
        })
    }
}

impl<T> HashOf<T> {
    pub fn from_digest(hash: Digest) -> HashOf<T> {
        HashOf {
            hash,
            phantom: PhantomData,
        }
    }
}

// manual impls so that `T` itself need not be Clone/Eq/Debug
impl<T> Clone for HashOf<T> {
    fn clone(&self) -> Self {
        HashOf {
            hash: self.hash,
            phantom: PhantomData,
        }
    }
}

impl<T> PartialEq for HashOf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<T> Eq for HashOf<T> {}

impl<T> fmt::Debug for HashOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("HashOf").field(&self.hash).finish()
    }
}

/// Signature over the bincode encoding of a `T`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", transparent)]
pub struct SignatureOf<T> {
    pub sig: XfrSignature,
    #[serde(skip)]
    phantom: PhantomData<T>,
}

impl<T: serde::Serialize> SignatureOf<T> {
    pub fn new(keypair: &XfrKeyPair, value: &T) -> Result<SignatureOf<T>> {
        let bytes = bincode::serialize(value).c(d!(SableError::SerializationError))?;
        Ok(SignatureOf {
            sig: keypair.sign(&bytes),
            phantom: PhantomData,
        })
    }

    pub fn verify(&self, public_key: &XfrPublicKey, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value).c(d!(SableError::SerializationError))?;
        public_key.verify(&bytes, &self.sig).c(d!())
    }
}

impl<T> Clone for SignatureOf<T> {
    fn clone(&self) -> Self {
        SignatureOf {
            sig: self.sig.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T> PartialEq for SignatureOf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sig == other.sig
    }
}

impl<T> Eq for SignatureOf<T> {}

impl<T> fmt::Debug for SignatureOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("SignatureOf").field(&self.sig).finish()
    }
}
