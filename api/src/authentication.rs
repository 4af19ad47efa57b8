//! Client-side verification of ledger-supplied authenticated data.
//!
//! The ledger answers queries with proofs against a signed state
//! commitment. Everything here recomputes those proofs locally: a
//! transaction is checked against the transaction Merkle tree, a
//! key-value lookup against a 256-level sparse Merkle tree. Prover-supplied
//! intermediate hashes are never trusted, only folded and compared.
//!
//! A structurally malformed proof is an error (`MalformedProof`), kept
//! distinct from a well-formed proof that simply does not match
//! (`Ok(false)`).

use crate::data_model::{FinalizedTransaction, Transaction, TxnSID};
use crate::errors::SableError;
use crate::hashing::{sha256, Digest, HashOf};
use ruc::*;

/// Height of the sparse Merkle tree holding the ledger's key-value store.
/// One level per bit of the 256-bit key.
pub const SPARSE_MERKLE_HEIGHT: usize = 256;

/// Commitment to the whole ledger state at some block height. Opaque to
/// callers; obtained out of band from a trusted source.
pub type StateCommitment = HashOf<Option<StateCommitmentData>>;

/// The preimage of a state commitment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StateCommitmentData {
    /// Root of the transaction Merkle tree
    pub transaction_merkle_commitment: Digest,
    /// Root of the sparse Merkle tree over the key-value store
    pub kv_store: Digest,
    pub previous_state_commitment: StateCommitment,
    pub txn_count: u64,
}

impl StateCommitmentData {
    pub fn compute_commitment(&self) -> Result<StateCommitment> {
        HashOf::new(&Some(self.clone())).c(d!())
    }
}

/// One step of a transaction inclusion path, leaf side upwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProofNode {
    pub sibling: Digest,
    /// Whether the sibling sits to the left of the path at this level
    pub is_left_sibling: bool,
}

/// Sibling path from a transaction's leaf to the transaction Merkle root.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TxnInclusionProof {
    pub nodes: Vec<ProofNode>,
    pub tx_id: TxnSID,
}

/// A transaction returned by the ledger together with everything needed
/// to check it against a state commitment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AuthenticatedTransaction {
    pub finalized_txn: FinalizedTransaction,
    pub txn_inclusion_proof: TxnInclusionProof,
    pub state_commitment_data: StateCommitmentData,
    pub state_commitment: StateCommitment,
}

/// Sibling set for one key path of the sparse Merkle tree. Bit `i` of
/// `bitmap` (little-endian within each byte) marks a non-default sibling
/// at level `i`; `hashes` lists exactly those siblings, leaf side first.
/// Default-subtree siblings are omitted and recomputed by the verifier.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SparseMerkleProof {
    pub bitmap: [u8; 32],
    pub hashes: Vec<Digest>,
}

/// A key-value query result returned by the ledger, with its proof.
/// `result` of None asserts the key is absent.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AuthenticatedKVLookup {
    pub key: Digest,
    pub result: Option<Vec<u8>>,
    pub state_commitment_data: StateCommitmentData,
    pub merkle_root: Digest,
    pub merkle_proof: SparseMerkleProof,
    pub state_commitment: StateCommitment,
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(&left.0);
    bytes[32..].copy_from_slice(&right.0);
    sha256(&bytes)
}

/// Folds a leaf up the transaction Merkle tree. The sibling side at each
/// level must agree with the bit path of `tx_id`, and the path must be
/// long enough to consume every bit of it.
fn txn_merkle_root(leaf: Digest, proof: &TxnInclusionProof) -> Result<Digest> {
    let mut hash = leaf;
    let mut position = proof.tx_id.0;
    for node in proof.nodes.iter() {
        let path_is_right_child = position & 1 == 1;
        if node.is_left_sibling != path_is_right_child {
            return Err(eg!(SableError::MalformedProof));
        }
        hash = if node.is_left_sibling {
            hash_pair(&node.sibling, &hash)
        } else {
            hash_pair(&hash, &node.sibling)
        };
        position >>= 1;
    }
    if position != 0 {
        return Err(eg!(SableError::MalformedProof));
    }
    Ok(hash)
}

/// Per-level hashes of all-default subtrees: an absent leaf is the zero
/// digest, and each level doubles the one below.
fn sparse_default_hashes() -> [Digest; SPARSE_MERKLE_HEIGHT] {
    let mut defaults = [Digest([0u8; 32]); SPARSE_MERKLE_HEIGHT];
    for level in 1..SPARSE_MERKLE_HEIGHT {
        defaults[level] = hash_pair(&defaults[level - 1], &defaults[level - 1]);
    }
    defaults
}

fn key_bit(key: &Digest, bit_index: usize) -> bool {
    (key.0[bit_index / 8] >> (7 - (bit_index % 8))) & 1 == 1
}

fn bitmap_bit(bitmap: &[u8; 32], level: usize) -> bool {
    (bitmap[level / 8] >> (level % 8)) & 1 == 1
}

/// Folds a leaf up the sparse Merkle tree along the bit path of `key`
/// (most significant bit decides at the root). The bitmap's set-bit count
/// must match the supplied hash count.
fn sparse_merkle_root(key: &Digest, leaf: Digest, proof: &SparseMerkleProof) -> Result<Digest> {
    let set_bits: usize = proof
        .bitmap
        .iter()
        .map(|byte| byte.count_ones() as usize)
        .sum();
    if set_bits != proof.hashes.len() {
        return Err(eg!(SableError::MalformedProof));
    }

    let defaults = sparse_default_hashes();
    let mut supplied = proof.hashes.iter();
    let mut hash = leaf;
    for level in 0..SPARSE_MERKLE_HEIGHT {
        let sibling = if bitmap_bit(&proof.bitmap, level) {
            *supplied
                .next()
                .ok_or_else(|| eg!(SableError::MalformedProof))?
        } else {
            defaults[level]
        };
        if key_bit(key, SPARSE_MERKLE_HEIGHT - 1 - level) {
            hash = hash_pair(&sibling, &hash);
        } else {
            hash = hash_pair(&hash, &sibling);
        }
    }
    Ok(hash)
}

impl AuthenticatedTransaction {
    /// Checks this transaction against a trusted state commitment:
    /// the commitment echoes must match and the recomputed Merkle root
    /// must equal the committed transaction tree root.
    pub fn is_valid(&self, state_commitment: &StateCommitment) -> Result<bool> {
        if self.txn_inclusion_proof.tx_id != self.finalized_txn.tx_id {
            return Err(eg!(SableError::MalformedProof));
        }
        let leaf = self.finalized_txn.hash().c(d!())?;
        let root = txn_merkle_root(leaf.hash, &self.txn_inclusion_proof).c(d!())?;
        let expected_commitment = self.state_commitment_data.compute_commitment().c(d!())?;

        Ok(*state_commitment == self.state_commitment
            && self.state_commitment == expected_commitment
            && root == self.state_commitment_data.transaction_merkle_commitment)
    }
}

impl AuthenticatedKVLookup {
    /// Checks this lookup result against a trusted state commitment.
    /// An absent key verifies against the default leaf.
    pub fn is_valid(&self, state_commitment: &StateCommitment) -> Result<bool> {
        let leaf = match &self.result {
            Some(value) => sha256(value),
            None => Digest([0u8; 32]),
        };
        let root = sparse_merkle_root(&self.key, leaf, &self.merkle_proof).c(d!())?;
        let expected_commitment = self.state_commitment_data.compute_commitment().c(d!())?;

        Ok(*state_commitment == self.state_commitment
            && self.state_commitment == expected_commitment
            && self.merkle_root == self.state_commitment_data.kv_store
            && root == self.merkle_root)
    }
}

/// Checks a JSON-serialized authenticated transaction against a
/// JSON-serialized state commitment. Undecodable input is a
/// `MalformedProof` error, never `Ok(false)`.
pub fn verify_authenticated_txn(
    state_commitment_json: &str,
    authenticated_txn_json: &str,
) -> Result<bool> {
    let state_commitment: StateCommitment =
        serde_json::from_str(state_commitment_json).c(d!(SableError::MalformedProof))?;
    let authenticated_txn: AuthenticatedTransaction =
        serde_json::from_str(authenticated_txn_json).c(d!(SableError::MalformedProof))?;
    authenticated_txn.is_valid(&state_commitment).c(d!())
}

/// Checks a JSON-serialized authenticated key-value lookup against a
/// JSON-serialized state commitment.
pub fn verify_authenticated_kv_lookup(
    state_commitment_json: &str,
    authenticated_lookup_json: &str,
) -> Result<bool> {
    let state_commitment: StateCommitment =
        serde_json::from_str(state_commitment_json).c(d!(SableError::MalformedProof))?;
    let authenticated_lookup: AuthenticatedKVLookup =
        serde_json::from_str(authenticated_lookup_json).c(d!(SableError::MalformedProof))?;
    authenticated_lookup.is_valid(&state_commitment).c(d!())
}
