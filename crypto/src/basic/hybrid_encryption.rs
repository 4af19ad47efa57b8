use crate::errors::CryptoError;
use crate::serialization::SableFromToBytes;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use curve25519_dalek::montgomery::MontgomeryPoint;
use digest::{generic_array::GenericArray, Digest};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::{CryptoRng, RngCore};
use ruc::*;
use sha2::Sha512;

#[derive(Debug, Clone)]
pub struct XPublicKey {
    pub(crate) key: x25519_dalek::PublicKey,
}

impl SableFromToBytes for XPublicKey {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.key.as_bytes().to_vec()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            Err(eg!(CryptoError::DeserializationError))
        } else {
            let mut array = [0u8; 32];
            array.copy_from_slice(bytes);
            Ok(XPublicKey {
                key: x25519_dalek::PublicKey::from(array),
            })
        }
    }
}

serialize_deserialize!(XPublicKey);

impl XPublicKey {
    pub fn from(sk: &XSecretKey) -> XPublicKey {
        XPublicKey {
            key: x25519_dalek::PublicKey::from(&sk.key),
        }
    }
}

impl PartialEq for XPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.as_bytes() == other.key.as_bytes()
    }
}

impl Eq for XPublicKey {}

#[derive(Clone)]
pub struct XSecretKey {
    pub(crate) key: x25519_dalek::StaticSecret,
}

impl SableFromToBytes for XSecretKey {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.key.to_bytes().to_vec()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            Err(eg!(CryptoError::DeserializationError))
        } else {
            let mut array = [0u8; 32];
            array.copy_from_slice(bytes);
            Ok(XSecretKey {
                key: x25519_dalek::StaticSecret::from(array),
            })
        }
    }
}

serialize_deserialize!(XSecretKey);

impl XSecretKey {
    pub fn new<R: CryptoRng + RngCore>(prng: &mut R) -> XSecretKey {
        XSecretKey {
            key: x25519_dalek::StaticSecret::random_from_rng(prng),
        }
    }
}

impl PartialEq for XSecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.to_bytes() == other.key.to_bytes()
    }
}

impl Eq for XSecretKey {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ctext(pub Vec<u8>);
impl SableFromToBytes for Ctext {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }

    fn sable_from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Ctext(bytes.to_vec()))
    }
}
serialize_deserialize!(Ctext);

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct HybridCiphertext {
    pub(crate) ciphertext: Ctext,
    pub(crate) ephemeral_public_key: XPublicKey,
}

/// Encrypt a message under a X25519 public key: a fresh symmetric key is
/// derived from an ephemeral DH exchange and the message sealed under it.
pub fn hybrid_encrypt_x25519<R: CryptoRng + RngCore>(
    prng: &mut R,
    pub_key: &XPublicKey,
    message: &[u8],
) -> Result<HybridCiphertext> {
    let (key, ephemeral_key) = symmetric_key_from_x25519_public_key(prng, &pub_key.key);
    let ciphertext = symmetric_encrypt_fresh_key(&key, message).c(d!())?;
    Ok(HybridCiphertext {
        ciphertext,
        ephemeral_public_key: XPublicKey { key: ephemeral_key },
    })
}

/// Encrypt a message under an Ed25519 signature public key, reusing the
/// owner's signing identity as the decryption identity.
pub fn hybrid_encrypt_ed25519<R: CryptoRng + RngCore>(
    prng: &mut R,
    pub_key: &VerifyingKey,
    message: &[u8],
) -> Result<HybridCiphertext> {
    // transform the ed25519 public key into a x25519 public key
    let pk_montgomery = pub_key.to_montgomery();
    let x_public_key = x25519_dalek::PublicKey::from(pk_montgomery.to_bytes());

    let (key, ephemeral_key) = symmetric_key_from_x25519_public_key(prng, &x_public_key);
    let ciphertext = symmetric_encrypt_fresh_key(&key, message).c(d!())?;
    Ok(HybridCiphertext {
        ciphertext,
        ephemeral_public_key: XPublicKey { key: ephemeral_key },
    })
}

/// Decrypt a hybrid ciphertext with a X25519 secret key. Fails with
/// `CryptoError::DecryptionError` when the ciphertext does not authenticate
/// under the derived key.
pub fn hybrid_decrypt_with_x25519_secret_key(
    ctext: &HybridCiphertext,
    sec_key: &XSecretKey,
) -> Result<Vec<u8>> {
    let shared = sec_key
        .key
        .diffie_hellman(&ctext.ephemeral_public_key.key);
    let key = shared_key_to_32_bytes(shared.as_bytes());
    symmetric_decrypt_fresh_key(&key, &ctext.ciphertext).c(d!())
}

/// Decrypt a hybrid ciphertext with an Ed25519 signing key.
pub fn hybrid_decrypt_with_ed25519_secret_key(
    ctext: &HybridCiphertext,
    sec_key: &SigningKey,
) -> Result<Vec<u8>> {
    // the clamped scalar bytes must stay unreduced, x25519 re-clamps them
    let scalar_bytes = sec_key.to_scalar_bytes();
    let shared =
        MontgomeryPoint(ctext.ephemeral_public_key.key.to_bytes()).mul_clamped(scalar_bytes);
    let key = shared_key_to_32_bytes(shared.as_bytes());
    symmetric_decrypt_fresh_key(&key, &ctext.ciphertext).c(d!())
}

fn shared_key_to_32_bytes(shared_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    hasher.update(shared_bytes);
    let hash = hasher.finalize();
    let mut symmetric_key = [0u8; 32];
    symmetric_key.copy_from_slice(&hash[0..32]);
    symmetric_key
}

// Derive a 32 byte symmetric key from a x25519 public key, returning it with
// the ephemeral public key encoding the randomness.
fn symmetric_key_from_x25519_public_key<R: CryptoRng + RngCore>(
    prng: &mut R,
    public_key: &x25519_dalek::PublicKey,
) -> ([u8; 32], x25519_dalek::PublicKey) {
    let ephemeral = x25519_dalek::EphemeralSecret::random_from_rng(&mut *prng);
    let dh_pk = x25519_dalek::PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(public_key);

    let symmetric_key = shared_key_to_32_bytes(shared.as_bytes());
    (symmetric_key, dh_pk)
}

fn symmetric_encrypt_fresh_key(key: &[u8; 32], plaintext: &[u8]) -> Result<Ctext> {
    let gcm = Aes256Gcm::new_from_slice(key).map_err(|_| eg!(CryptoError::EncryptionError))?;
    // nonce can be zero because each key encrypts a single message
    let nonce = GenericArray::from_slice(&[0u8; 12]);
    let ctext = gcm
        .encrypt(nonce, plaintext)
        .map_err(|_| eg!(CryptoError::EncryptionError))?;
    Ok(Ctext(ctext))
}

fn symmetric_decrypt_fresh_key(key: &[u8; 32], ciphertext: &Ctext) -> Result<Vec<u8>> {
    let gcm = Aes256Gcm::new_from_slice(key).map_err(|_| eg!(CryptoError::DecryptionError))?;
    let nonce = GenericArray::from_slice(&[0u8; 12]);
    gcm.decrypt(nonce, ciphertext.0.as_slice())
        .map_err(|_| eg!(CryptoError::DecryptionError))
}
