use crate::errors::SableError;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{CryptoRng, RngCore};
use ruc::*;
use sable_crypto::serialization::SableFromToBytes;
use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

pub const XFR_SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;

#[derive(Clone, Copy, Debug)]
pub struct XfrPublicKey(pub(crate) VerifyingKey);
#[derive(Clone, Debug)]
pub struct XfrSecretKey(pub(crate) SigningKey);
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XfrKeyPair {
    pub pub_key: XfrPublicKey,
    pub(crate) sec_key: XfrSecretKey,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XfrSignature(pub Signature);

impl Eq for XfrPublicKey {}

impl PartialEq for XfrPublicKey {
    fn eq(&self, other: &XfrPublicKey) -> bool {
        self.as_bytes().eq(other.as_bytes())
    }
}

impl Ord for XfrPublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for XfrPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for XfrPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl XfrPublicKey {
    /// returns XfrPublicKey as a compressed edwards point
    pub fn as_compressed_edwards_point(&self) -> CompressedEdwardsY {
        CompressedEdwardsY(self.0.to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &XfrSignature) -> Result<()> {
        self.0
            .verify(message, &signature.0)
            .c(d!(SableError::SignatureError))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Eq for XfrSecretKey {}

impl PartialEq for XfrSecretKey {
    fn eq(&self, other: &XfrSecretKey) -> bool {
        self.as_scalar().eq(&other.as_scalar())
    }
}

impl Ord for XfrSecretKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_scalar()
            .to_bytes()
            .cmp(&other.as_scalar().to_bytes())
    }
}

impl PartialOrd for XfrSecretKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for XfrSecretKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_scalar().to_bytes().hash(state)
    }
}

impl XfrSecretKey {
    #[inline(always)]
    pub fn into_keypair(self) -> XfrKeyPair {
        XfrKeyPair {
            pub_key: XfrPublicKey(self.0.verifying_key()),
            sec_key: self,
        }
    }

    pub fn sign(&self, message: &[u8]) -> XfrSignature {
        XfrSignature(self.0.sign(message))
    }

    /// Returns the signing scalar derived from the secret seed
    pub(crate) fn as_scalar(&self) -> Scalar {
        self.0.to_scalar()
    }
}

impl XfrKeyPair {
    pub fn generate<R: CryptoRng + RngCore>(prng: &mut R) -> Self {
        let sec_key = SigningKey::generate(prng);
        XfrKeyPair {
            pub_key: XfrPublicKey(sec_key.verifying_key()),
            sec_key: XfrSecretKey(sec_key),
        }
    }

    pub fn sign(&self, msg: &[u8]) -> XfrSignature {
        self.sec_key.sign(msg)
    }

    #[inline(always)]
    pub fn get_pk(&self) -> XfrPublicKey {
        self.pub_key
    }

    #[inline(always)]
    pub fn get_pk_ref(&self) -> &XfrPublicKey {
        &self.pub_key
    }

    #[inline(always)]
    pub fn get_sk(&self) -> XfrSecretKey {
        self.sec_key.clone()
    }

    #[inline(always)]
    pub fn get_sk_ref(&self) -> &XfrSecretKey {
        &self.sec_key
    }
}

impl SableFromToBytes for XfrKeyPair {
    fn sable_to_bytes(&self) -> Vec<u8> {
        let mut vec = vec![];
        vec.extend_from_slice(self.sec_key.sable_to_bytes().as_slice());
        vec.extend_from_slice(self.pub_key.sable_to_bytes().as_slice());
        vec
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= XFR_SECRET_KEY_LENGTH {
            return Err(eg!(SableError::DeserializationError));
        }
        Ok(XfrKeyPair {
            sec_key: XfrSecretKey::sable_from_bytes(&bytes[0..XFR_SECRET_KEY_LENGTH])
                .c(d!())?,
            pub_key: XfrPublicKey::sable_from_bytes(&bytes[XFR_SECRET_KEY_LENGTH..])
                .c(d!())?,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::errors::SableError::SignatureError;
    use crate::xfr::sig::XfrKeyPair;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;
    use ruc::*;

    #[test]
    fn signatures() {
        let mut prng = ChaChaRng::from_seed([0u8; 32]);

        let keypair = XfrKeyPair::generate(&mut prng);
        let message = "";

        let sig = keypair.sign(message.as_bytes());
        pnk!(keypair.pub_key.verify("".as_bytes(), &sig));
        //same test with secret key
        let sig = keypair.sec_key.sign(message.as_bytes());
        pnk!(keypair.pub_key.verify("".as_bytes(), &sig));

        //test again with fresh same key
        let mut prng = ChaChaRng::from_seed([0u8; 32]);
        let keypair = XfrKeyPair::generate(&mut prng);
        pnk!(keypair.pub_key.verify("".as_bytes(), &sig));

        let keypair = XfrKeyPair::generate(&mut prng);
        let message = [10u8; 500];
        let sig = keypair.sign(&message);
        msg_eq!(
            SignatureError,
            keypair.pub_key.verify("".as_bytes(), &sig).unwrap_err(),
            "Verifying sig on different message should have return Err(Signature Error)"
        );
        pnk!(keypair.pub_key.verify(&message, &sig));
        //test again with secret key
        let sig = keypair.sec_key.sign(&message);
        msg_eq!(
            SignatureError,
            keypair.pub_key.verify("".as_bytes(), &sig).unwrap_err(),
            "Verifying sig on different message should have return Err(Signature Error)"
        );
        pnk!(keypair.pub_key.verify(&message, &sig));

        // test with different keys
        let keypair = XfrKeyPair::generate(&mut prng);
        msg_eq!(
            SignatureError,
            keypair.pub_key.verify(&message, &sig).unwrap_err(),
            "Verifying sig on with a different key should have return Err(Signature Error)"
        );
    }

    #[test]
    fn secret_key_round_trips() {
        let mut prng = ChaChaRng::from_seed([7u8; 32]);
        let keypair = XfrKeyPair::generate(&mut prng);

        let rebuilt = keypair.get_sk().into_keypair();
        assert_eq!(rebuilt.get_pk(), keypair.get_pk());

        let msg = b"roundtrip";
        let sig = rebuilt.sign(msg);
        pnk!(keypair.pub_key.verify(msg, &sig));
    }
}
