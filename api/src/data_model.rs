//! Ledger-facing data model: output references, asset metadata and the
//! transaction containers a wallet submits or receives.

use crate::errors::SableError;
use crate::hashing::{HashOf, SignatureOf};
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey};
use crate::xfr::structs::{AssetType, TracingPolicies, XfrBody};
use ruc::*;
use serde::Serialize;

/// Position of a transaction output in the ledger's global log
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TxoSID(pub u64);

/// Position of a committed transaction in the ledger's global log
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TxnSID(pub usize);

/// Reference to a transaction output being spent
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TxoRef {
    /// Output committed to the ledger, by global position
    Absolute(TxoSID),
    /// Output of the enclosing transaction, counted backwards:
    /// 0 is the most recent output, 1 the one before it, and so on
    Relative(u64),
}

impl TxoRef {
    pub fn absolute(sid: TxoSID) -> Self {
        TxoRef::Absolute(sid)
    }

    pub fn relative(offset: u64) -> Self {
        TxoRef::Relative(offset)
    }

    pub fn from_json_str(serialized: &str) -> Result<Self> {
        serde_json::from_str(serialized).c(d!(SableError::DeserializationError))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).c(d!(SableError::SerializationError))
    }
}

/// The address owning a transaction output
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct XfrAddress {
    pub key: XfrPublicKey,
}

/// Issuance-time rules attached to an asset
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetRules {
    pub transferable: bool,
    pub max_units: Option<u64>,
    pub tracing_policies: TracingPolicies,
}

impl Default for AssetRules {
    fn default() -> Self {
        AssetRules {
            transferable: true,
            max_units: None,
            tracing_policies: TracingPolicies::new(),
        }
    }
}

/// Asset metadata as stored by the ledger. Read path only: the wallet
/// obtains these by deserializing ledger query results.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetDefinition {
    pub code: AssetType,
    pub memo: String,
    pub asset_rules: AssetRules,
}

impl AssetDefinition {
    pub fn tracing_policies(&self) -> &TracingPolicies {
        &self.asset_rules.tracing_policies
    }
}

/// Tracing policies attached to a transfer, one set per input and output
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransferPolicies {
    pub inputs_tracing_policies: Vec<TracingPolicies>,
    pub outputs_tracing_policies: Vec<TracingPolicies>,
}

/// A signature over a transfer body, bound to the index it covers.
/// `input_idx` of None marks an owner signature covering the whole body;
/// Some(idx) marks a co-signature for one input.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct IndexedSignature<T> {
    pub address: XfrAddress,
    pub signature: SignatureOf<(T, Option<usize>)>,
    pub input_idx: Option<usize>,
}

impl<T> IndexedSignature<T>
where
    T: Clone + Serialize,
{
    pub fn verify(&self, message: &T) -> bool {
        self.signature
            .verify(&self.address.key, &(message.clone(), self.input_idx))
            .is_ok()
    }
}

/// Body of a transfer operation: which outputs are spent and the
/// confidential transfer that spends them
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransferAssetBody {
    pub inputs: Vec<TxoRef>,
    pub policies: TransferPolicies,
    pub transfer: Box<XfrBody>,
}

impl TransferAssetBody {
    /// Computes a body signature. A co-signature (`input_idx` = Some) signs
    /// the body together with the index so it cannot stand in for an owner
    /// signature.
    pub fn compute_body_signature(
        &self,
        keypair: &XfrKeyPair,
        input_idx: Option<usize>,
    ) -> Result<IndexedSignature<TransferAssetBody>> {
        let signature =
            SignatureOf::new(keypair, &(self.clone(), input_idx)).c(d!())?;
        Ok(IndexedSignature {
            address: XfrAddress {
                key: keypair.get_pk(),
            },
            signature,
            input_idx,
        })
    }

    pub fn verify_body_signature(
        &self,
        signature: &IndexedSignature<TransferAssetBody>,
    ) -> bool {
        signature.verify(self)
    }
}

/// A transfer operation as submitted to the ledger
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransferAsset {
    pub body: TransferAssetBody,
    pub body_signatures: Vec<IndexedSignature<TransferAssetBody>>,
}

impl TransferAsset {
    pub fn new(body: TransferAssetBody) -> Self {
        TransferAsset {
            body,
            body_signatures: vec![],
        }
    }

    pub fn sign(&mut self, keypair: &XfrKeyPair) -> Result<()> {
        let signature = self.create_input_signature(keypair, None).c(d!())?;
        self.attach_signature(signature).c(d!())
    }

    pub fn add_cosignature(&mut self, keypair: &XfrKeyPair, input_idx: usize) -> Result<()> {
        let signature = self
            .create_input_signature(keypair, Some(input_idx))
            .c(d!())?;
        self.attach_signature(signature).c(d!())
    }

    pub fn create_input_signature(
        &self,
        keypair: &XfrKeyPair,
        input_idx: Option<usize>,
    ) -> Result<IndexedSignature<TransferAssetBody>> {
        self.body.compute_body_signature(keypair, input_idx).c(d!())
    }

    pub fn attach_signature(
        &mut self,
        signature: IndexedSignature<TransferAssetBody>,
    ) -> Result<()> {
        if !signature.verify(&self.body) {
            return Err(eg!(SableError::SignatureError));
        }
        self.body_signatures.push(signature);
        Ok(())
    }
}

/// Operations a wallet can submit. The transfer path is the only one
/// this library emits.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Operation {
    TransferAsset(TransferAsset),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Transaction {
    pub seq_id: u64,
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn from_operation(op: Operation, seq_id: u64) -> Self {
        Transaction {
            seq_id,
            operations: vec![op],
        }
    }
}

/// A transaction as committed by the ledger, with its assigned position
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FinalizedTransaction {
    pub txn: Transaction,
    pub tx_id: TxnSID,
}

impl FinalizedTransaction {
    /// Leaf hash of this transaction in the ledger's transaction Merkle
    /// tree. The assigned position is hashed in with the payload.
    pub fn hash(&self) -> Result<HashOf<(TxnSID, Transaction)>> {
        HashOf::new(&(self.tx_id, self.txn.clone())).c(d!())
    }
}
