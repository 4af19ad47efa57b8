use crate::errors::SableError;
use crate::xfr::asset_record::AssetRecordType;
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey};
use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use digest::Digest;
use rand_core::{CryptoRng, RngCore};
use ruc::*;
use sable_crypto::basic::hybrid_encryption::{
    self, HybridCiphertext, XPublicKey, XSecretKey,
};
use sable_crypto::basic::pedersen_comm::RistrettoPedersenGens;
use sable_crypto::errors::CryptoError;
use sable_crypto::u64_to_u32_pair;
use sha2::{Sha256, Sha512};

/// Asset Type identifier
pub const ASSET_TYPE_LENGTH: usize = 32;

/// Asset type representation length. The last bytes of the hashed
/// representation are zero so the value fits in a Ristretto scalar.
pub(crate) const ASSET_TYPE_SCALAR_REPR_LENGTH: usize = 30;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct AssetType(pub [u8; ASSET_TYPE_LENGTH]);

impl AssetType {
    /// Helper function to generate an asset type with identical value in each byte
    pub fn from_identical_byte(byte: u8) -> Self {
        Self([byte; ASSET_TYPE_LENGTH])
    }

    /// converts AssetType into a Scalar through its hashed representation
    pub fn as_scalar(&self) -> Scalar {
        let hash = Sha256::digest(self.0);
        let mut repr = [0u8; 32];
        repr[0..ASSET_TYPE_SCALAR_REPR_LENGTH]
            .copy_from_slice(&hash[0..ASSET_TYPE_SCALAR_REPR_LENGTH]);
        Scalar::from_bytes_mod_order(repr)
    }
}

/// A transfer's body: inputs, outputs and messages to participants
/// (asset tracers and output owners)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct XfrBody {
    pub inputs: Vec<BlindAssetRecord>,
    pub outputs: Vec<BlindAssetRecord>,
    pub asset_tracing_memos: Vec<Vec<TracerMemo>>, // each input or output can have a set of tracing memos
    pub owners_memos: Vec<Option<OwnerMemo>>, // If confidential amount or asset type, lock the amount and/or asset type to the public key in asset_record
}

/// A transfer input or output record as seen in the ledger
/// Amount and asset type can be confidential or non confidential
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlindAssetRecord {
    pub amount: XfrAmount,        // Amount being transferred
    pub asset_type: XfrAssetType, // Asset type being transferred
    pub public_key: XfrPublicKey, // ownership address
}

impl BlindAssetRecord {
    /// Parses a record out of a ledger query response
    pub fn from_json_str(serialized: &str) -> Result<Self> {
        serde_json::from_str(serialized).c(d!(SableError::DeserializationError))
    }

    pub fn get_record_type(&self) -> AssetRecordType {
        AssetRecordType::from_flags(
            matches!(self.amount, XfrAmount::Confidential(_)),
            matches!(self.asset_type, XfrAssetType::Confidential(_)),
        )
    }

    /// returns true if both amount and asset type are non-confidential
    pub fn is_public(&self) -> bool {
        matches!(
            self.get_record_type(),
            AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType
        )
    }
}

/// Amount in blind asset record: if confidential, provide commitments for lower and high 32 bits
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum XfrAmount {
    // amount is a 64 bit positive integer expressed in base 2^32 in confidential transactions
    Confidential(
        #[serde(with = "sable_crypto::serialization::sable_obj_serde")]
        (CompressedRistretto, CompressedRistretto),
    ),
    #[serde(with = "serde_str")]
    NonConfidential(u64),
}

impl XfrAmount {
    /// Returns true only if amount is confidential
    /// # Example:
    /// ```
    /// use sable::xfr::structs::XfrAmount;
    /// use curve25519_dalek::ristretto::CompressedRistretto;
    /// let xfr_amount = XfrAmount::Confidential((CompressedRistretto([0u8; 32]), CompressedRistretto([0u8; 32])));
    /// assert!(xfr_amount.is_confidential());
    /// let xfr_amount = XfrAmount::NonConfidential(100u64);
    /// assert!(!xfr_amount.is_confidential());
    /// ```
    pub fn is_confidential(&self) -> bool {
        matches!(self, XfrAmount::Confidential(_))
    }

    /// Return Some(amount) if amount is non-confidential. Otherwise, return None
    /// # Example:
    /// ```
    /// use sable::xfr::structs::XfrAmount;
    /// let xfr_amount = XfrAmount::NonConfidential(100u64);
    /// assert_eq!(xfr_amount.get_amount().unwrap(), 100u64);
    /// ```
    pub fn get_amount(&self) -> Option<u64> {
        match self {
            XfrAmount::NonConfidential(x) => Some(*x),
            _ => None,
        }
    }

    /// Return Some((c1,c2)), where (c1,c2) is a commitment to the amount
    /// if amount is confidential. Otherwise, return None
    pub fn get_commitments(&self) -> Option<(CompressedRistretto, CompressedRistretto)> {
        match self {
            XfrAmount::Confidential(x) => Some(*x),
            _ => None,
        }
    }

    /// construct a confidential XfrAmount with amount and amount blinds
    pub fn from_blinds(
        pc_gens: &RistrettoPedersenGens,
        amount: u64,
        blind_lo: &Scalar,
        blind_hi: &Scalar,
    ) -> Self {
        let (amount_lo, amount_hi) = u64_to_u32_pair(amount);
        let comm_lo = pc_gens.commit(Scalar::from(amount_lo), *blind_lo).compress();
        let comm_hi = pc_gens.commit(Scalar::from(amount_hi), *blind_hi).compress();
        XfrAmount::Confidential((comm_lo, comm_hi))
    }
}

/// Asset type in BlindAssetRecord: if confidential, provide commitment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum XfrAssetType {
    Confidential(
        #[serde(with = "sable_crypto::serialization::sable_obj_serde")] CompressedRistretto,
    ),
    NonConfidential(AssetType),
}

impl XfrAssetType {
    /// Returns true only if asset type is confidential
    pub fn is_confidential(&self) -> bool {
        matches!(self, XfrAssetType::Confidential(_))
    }

    /// Return Some(asset_type) if asset type is non-confidential. Otherwise, return None
    pub fn get_asset_type(&self) -> Option<AssetType> {
        match self {
            XfrAssetType::NonConfidential(x) => Some(*x),
            _ => None,
        }
    }

    /// Return Some(c), where c is a commitment to the asset type
    /// if asset type is confidential. Otherwise, return None
    pub fn get_commitment(&self) -> Option<CompressedRistretto> {
        match self {
            XfrAssetType::Confidential(x) => Some(*x),
            _ => None,
        }
    }

    /// construct a confidential XfrAssetType with the asset type and its blind
    pub fn from_blind(
        pc_gens: &RistrettoPedersenGens,
        asset_type: &AssetType,
        blind: &Scalar,
    ) -> Self {
        XfrAssetType::Confidential(pc_gens.commit(asset_type.as_scalar(), *blind).compress())
    }
}

/// Public keys of an asset tracer. Transactions encrypt revealed fields
/// to these keys so the tracer can decrypt them later.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetTracerEncKeys {
    pub lock_info_enc_key: XPublicKey,
}

/// Secret keys of an asset tracer.
#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetTracerDecKeys {
    pub lock_info_dec_key: XSecretKey,
}

#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetTracerKeyPair {
    pub enc_key: AssetTracerEncKeys,
    pub dec_key: AssetTracerDecKeys,
}

impl AssetTracerKeyPair {
    /// Generate a new keypair for asset tracing
    pub fn generate<R: CryptoRng + RngCore>(prng: &mut R) -> Self {
        let dec_key = XSecretKey::new(prng);
        let enc_key = XPublicKey::from(&dec_key);
        AssetTracerKeyPair {
            enc_key: AssetTracerEncKeys {
                lock_info_enc_key: enc_key,
            },
            dec_key: AssetTracerDecKeys {
                lock_info_dec_key: dec_key,
            },
        }
    }
}

/// An asset and amount tracing policy for an asset record
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TracingPolicy {
    pub enc_keys: AssetTracerEncKeys,
    pub asset_tracing: bool,
}

/// Set of tracing policies
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TracingPolicies(pub Vec<TracingPolicy>);

impl TracingPolicies {
    pub fn new() -> Self {
        TracingPolicies(vec![])
    }
    pub fn from_policy(policy: TracingPolicy) -> Self {
        TracingPolicies(vec![policy])
    }
    pub fn add(&mut self, policy: TracingPolicy) {
        self.0.push(policy);
    }
    pub fn get_policy(&self, index: usize) -> Option<&TracingPolicy> {
        self.0.get(index)
    }
    pub fn get_policies(&self) -> &[TracingPolicy] {
        self.0.as_slice()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Information directed to an asset tracer: the fields the policy reveals,
/// sealed under the tracer's encryption key. Construction and decryption
/// live in `crate::xfr::asset_tracer`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TracerMemo {
    pub enc_key: AssetTracerEncKeys,
    /// hybrid encryption of "amount || asset type", either part optional
    pub lock_info: HybridCiphertext,
}

/// Information directed to the secret key holder of a BlindAssetRecord
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OwnerMemo {
    #[serde(with = "sable_crypto::serialization::sable_obj_serde")]
    pub blind_share: CompressedEdwardsY,
    pub lock: HybridCiphertext,
}

impl OwnerMemo {
    /// constructs an `OwnerMemo` for an asset record with only confidential amount
    /// returns (OwnerMemo, (amount_blind_low, amount_blind_high))
    /// PRNG should be seeded with good entropy instead of being deterministically seeded
    pub fn from_amount<R: CryptoRng + RngCore>(
        prng: &mut R,
        amount: u64,
        pub_key: &XfrPublicKey,
    ) -> Result<(Self, (Scalar, Scalar))> {
        let (r, blind_share) = OwnerMemo::random_scalar_with_compressed_edwards(prng);
        let shared_point = OwnerMemo::derive_shared_edwards_point(
            &r,
            &pub_key.as_compressed_edwards_point(),
        )
        .c(d!())?;
        let amount_blinds = OwnerMemo::calc_amount_blinds(&shared_point);

        let lock = hybrid_encryption::hybrid_encrypt_ed25519(
            prng,
            &pub_key.0,
            &amount.to_be_bytes(),
        )
        .c(d!())?;
        Ok((OwnerMemo { blind_share, lock }, amount_blinds))
    }

    /// constructs an `OwnerMemo` for an asset record with only confidential asset type
    /// returns (OwnerMemo, asset_type_blind)
    /// PRNG should be seeded with good entropy instead of being deterministically seeded
    pub fn from_asset_type<R: CryptoRng + RngCore>(
        prng: &mut R,
        asset_type: &AssetType,
        pub_key: &XfrPublicKey,
    ) -> Result<(Self, Scalar)> {
        let (r, blind_share) = OwnerMemo::random_scalar_with_compressed_edwards(prng);
        let shared_point = OwnerMemo::derive_shared_edwards_point(
            &r,
            &pub_key.as_compressed_edwards_point(),
        )
        .c(d!())?;
        let asset_type_blind = OwnerMemo::calc_asset_type_blind(&shared_point);

        let lock =
            hybrid_encryption::hybrid_encrypt_ed25519(prng, &pub_key.0, &asset_type.0)
                .c(d!())?;
        Ok((OwnerMemo { blind_share, lock }, asset_type_blind))
    }

    /// constructs an `OwnerMemo` for an asset record with both confidential amount
    /// and confidential asset type
    /// returns (OwnerMemo, (amount_blind_low, amount_blind_high), asset_type_blind)
    /// PRNG should be seeded with good entropy instead of being deterministically seeded
    pub fn from_amount_and_asset_type<R: CryptoRng + RngCore>(
        prng: &mut R,
        amount: u64,
        asset_type: &AssetType,
        pub_key: &XfrPublicKey,
    ) -> Result<(Self, (Scalar, Scalar), Scalar)> {
        let (r, blind_share) = OwnerMemo::random_scalar_with_compressed_edwards(prng);
        let shared_point = OwnerMemo::derive_shared_edwards_point(
            &r,
            &pub_key.as_compressed_edwards_point(),
        )
        .c(d!())?;
        let amount_blinds = OwnerMemo::calc_amount_blinds(&shared_point);
        let asset_type_blind = OwnerMemo::calc_asset_type_blind(&shared_point);

        let mut amount_asset_type_plaintext = vec![];
        amount_asset_type_plaintext.extend_from_slice(&amount.to_be_bytes()[..]);
        amount_asset_type_plaintext.extend_from_slice(&asset_type.0[..]);
        let lock = hybrid_encryption::hybrid_encrypt_ed25519(
            prng,
            &pub_key.0,
            &amount_asset_type_plaintext,
        )
        .c(d!())?;
        Ok((
            OwnerMemo { blind_share, lock },
            amount_blinds,
            asset_type_blind,
        ))
    }

    /// decrypt the `OwnerMemo.lock` which encrypts only the confidential amount
    /// returns error if the decrypted bytes length doesn't match
    pub fn decrypt_amount(&self, keypair: &XfrKeyPair) -> Result<u64> {
        let decrypted_bytes = self.decrypt(keypair).c(d!())?;
        // amount is u64, thus u64.to_be_bytes should be 8 bytes
        if decrypted_bytes.len() != 8 {
            return Err(eg!(SableError::InconsistentStructureError));
        }
        let mut amount_be_bytes: [u8; 8] = Default::default();
        amount_be_bytes.copy_from_slice(&decrypted_bytes[..]);
        Ok(u64::from_be_bytes(amount_be_bytes))
    }

    /// decrypt the `OwnerMemo.lock` which encrypts only the confidential asset type
    /// returns error if the decrypted bytes length doesn't match
    pub fn decrypt_asset_type(&self, keypair: &XfrKeyPair) -> Result<AssetType> {
        let decrypted_bytes = self.decrypt(keypair).c(d!())?;
        if decrypted_bytes.len() != ASSET_TYPE_LENGTH {
            return Err(eg!(SableError::InconsistentStructureError));
        }
        let mut asset_type_bytes: [u8; ASSET_TYPE_LENGTH] = Default::default();
        asset_type_bytes.copy_from_slice(&decrypted_bytes[..]);
        Ok(AssetType(asset_type_bytes))
    }

    /// decrypt the `OwnerMemo.lock` which encrypts "amount || asset type"
    /// returns error if the decrypted bytes length doesn't match
    pub fn decrypt_amount_and_asset_type(
        &self,
        keypair: &XfrKeyPair,
    ) -> Result<(u64, AssetType)> {
        let decrypted_bytes = self.decrypt(keypair).c(d!())?;
        if decrypted_bytes.len() != ASSET_TYPE_LENGTH + 8 {
            return Err(eg!(SableError::InconsistentStructureError));
        }
        let mut amount_be_bytes: [u8; 8] = Default::default();
        amount_be_bytes.copy_from_slice(&decrypted_bytes[..8]);
        let mut asset_type_bytes: [u8; ASSET_TYPE_LENGTH] = Default::default();
        asset_type_bytes.copy_from_slice(&decrypted_bytes[8..]);

        Ok((
            u64::from_be_bytes(amount_be_bytes),
            AssetType(asset_type_bytes),
        ))
    }

    /// Returns the amount blinds (blind_low, blind_high)
    pub fn derive_amount_blinds(&self, keypair: &XfrKeyPair) -> Result<(Scalar, Scalar)> {
        let shared_point = OwnerMemo::derive_shared_edwards_point(
            &keypair.sec_key.as_scalar(),
            &self.blind_share,
        )
        .c(d!())?;
        Ok(OwnerMemo::calc_amount_blinds(&shared_point))
    }

    /// Returns the asset type blind
    pub fn derive_asset_type_blind(&self, keypair: &XfrKeyPair) -> Result<Scalar> {
        let shared_point = OwnerMemo::derive_shared_edwards_point(
            &keypair.sec_key.as_scalar(),
            &self.blind_share,
        )
        .c(d!())?;
        Ok(OwnerMemo::calc_asset_type_blind(&shared_point))
    }
}

// internal functions
impl OwnerMemo {
    // Decrypts the lock, returns bytes
    fn decrypt(&self, keypair: &XfrKeyPair) -> Result<Vec<u8>> {
        hybrid_encryption::hybrid_decrypt_with_ed25519_secret_key(
            &self.lock,
            &keypair.sec_key.0,
        )
        .c(d!())
    }

    // Samples a fresh randomizer and its blind share g^r
    fn random_scalar_with_compressed_edwards<R: CryptoRng + RngCore>(
        prng: &mut R,
    ) -> (Scalar, CompressedEdwardsY) {
        let r = Scalar::random(prng);
        let blind_share = (r * ED25519_BASEPOINT_POINT).compress();
        (r, blind_share)
    }

    // Given a shared point, calculate the amount blinds
    // returns (amount_blind_low, amount_blind_high)
    // noted shared_point = PK ^ r = blind_share ^ sk = (g^sk) ^ r
    fn calc_amount_blinds(shared_point: &CompressedEdwardsY) -> (Scalar, Scalar) {
        (
            OwnerMemo::hash_to_scalar(shared_point, b"amount_low"),
            OwnerMemo::hash_to_scalar(shared_point, b"amount_high"),
        )
    }

    // Given a shared point, calculate the asset type blind
    // noted shared_point = PK ^ r = blind_share ^ sk = (g^sk) ^ r
    fn calc_asset_type_blind(shared_point: &CompressedEdwardsY) -> Scalar {
        OwnerMemo::hash_to_scalar(shared_point, b"asset_type")
    }

    // returns point ^ s, where point is a compressed edwards point, s is a scalar
    // during `OwnerMemo` creation, point = PublicKey = g^sk, s = r, where r is the randomization scalar
    // during `OwnerMemo` decryption, point = blind_share = g^r, s = sk, where sk is the secret key
    // in both cases, returns g^(sk*r) in `CompressedEdwardsY` form
    fn derive_shared_edwards_point(
        s: &Scalar,
        point: &CompressedEdwardsY,
    ) -> Result<CompressedEdwardsY> {
        let shared_edwards_point =
            s * point.decompress().c(d!(CryptoError::DecompressElementError))?;
        Ok(shared_edwards_point.compress())
    }

    // returns H(point || aux) as a Scalar
    fn hash_to_scalar(point: &CompressedEdwardsY, aux: &'static [u8]) -> Scalar {
        let mut hasher = Sha512::new();
        hasher.update(point.as_bytes());
        hasher.update(aux);
        Scalar::from_hash(hasher)
    }
}

// ASSET RECORD STRUCTURES

/// A BlindAssetRecord with revealed commitment openings.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct OpenAssetRecord {
    pub blind_asset_record: BlindAssetRecord,
    pub amount: u64,
    /// (blind_low, blind_high), zero scalars when the amount is public
    #[serde(with = "sable_crypto::serialization::sable_obj_serde")]
    pub amount_blinds: (Scalar, Scalar),
    pub asset_type: AssetType,
    /// zero scalar when the asset type is public
    #[serde(with = "sable_crypto::serialization::sable_obj_serde")]
    pub type_blind: Scalar,
}

impl OpenAssetRecord {
    pub fn get_record_type(&self) -> AssetRecordType {
        self.blind_asset_record.get_record_type()
    }
    pub fn get_asset_type(&self) -> &AssetType {
        &self.asset_type
    }
    pub fn get_amount(&self) -> &u64 {
        &self.amount
    }
    pub fn get_pub_key(&self) -> &XfrPublicKey {
        &self.blind_asset_record.public_key
    }
}

/// An input or output record and associated information (policies) to be used
/// to construct a transfer
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetRecordTemplate {
    pub amount: u64,
    pub asset_type: AssetType,
    pub public_key: XfrPublicKey,
    pub asset_record_type: AssetRecordType,
    pub asset_tracing_policies: TracingPolicies,
}
