//! Incremental construction of confidential transfer operations.
//!
//! A `TransferOperationBuilder` walks one transaction through
//! assemble / balance / create / sign. Inputs are opened as they are
//! added, change is synthesized per asset type at balance time, and the
//! finalized body is immutable: signatures bind to its exact serialized
//! form.

use crate::data_model::{
    Operation, TransferAsset, TransferAssetBody, TransferPolicies, TxoRef,
};
use crate::errors::SableError;
use crate::hashing::{sha256, HashOf};
use crate::txn::fee::FeeInputs;
use crate::xfr::asset_record::{
    build_blind_asset_record, open_blind_asset_record, tracer_memos_for_record,
    AssetRecordType,
};
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey};
use crate::xfr::structs::{
    AssetRecordTemplate, AssetType, BlindAssetRecord, OpenAssetRecord, OwnerMemo,
    TracingPolicies, XfrBody,
};
use itertools::Itertools;
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng;
use ruc::*;
use sable_crypto::basic::pedersen_comm::RistrettoPedersenGens;

/// The input/output shape the balance fingerprint is computed over.
type BuilderShape = (
    Vec<TxoRef>,
    Vec<u64>,
    Vec<OpenAssetRecord>,
    Vec<AssetRecordTemplate>,
);

/// Builder for a single transfer operation.
///
/// Lifecycle: `add_input`/`add_output` assemble the transfer, `balance`
/// synthesizes change and captures a structural fingerprint, `create`
/// checks the fingerprint and freezes the operation body, `sign` and
/// `add_cosignature` attach signatures, `transaction` emits the signed
/// operation. Mutating a builder whose body has been created is an error;
/// mutating between `balance` and `create` is caught by the fingerprint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TransferOperationBuilder {
    input_sids: Vec<TxoRef>,
    spend_amounts: Vec<u64>,
    input_records: Vec<OpenAssetRecord>,
    inputs_tracing_policies: Vec<TracingPolicies>,
    output_templates: Vec<AssetRecordTemplate>,
    transfer: Option<TransferAsset>,
    balance_fingerprint: Option<HashOf<BuilderShape>>,
}

impl TransferOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash of the current input/output shape. Recomputed at `create` and
    /// compared against the value captured by `balance`.
    fn shape_fingerprint(&self) -> Result<HashOf<BuilderShape>> {
        let bytes = bincode::serialize(&(
            &self.input_sids,
            &self.spend_amounts,
            &self.input_records,
            &self.output_templates,
        ))
        .c(d!(SableError::SerializationError))?;
        Ok(HashOf::from_digest(sha256(&bytes)))
    }

    /// Asset types appearing among inputs or outputs, in first-seen order.
    fn distinct_asset_types(&self) -> Vec<AssetType> {
        self.input_records
            .iter()
            .map(|record| *record.get_asset_type())
            .chain(
                self.output_templates
                    .iter()
                    .map(|template| template.asset_type),
            )
            .unique()
            .collect()
    }

    fn input_sum(&self, code: AssetType) -> Result<u64> {
        let mut total: u64 = 0;
        for record in self.input_records.iter() {
            if *record.get_asset_type() == code {
                total = total
                    .checked_add(*record.get_amount())
                    .ok_or_else(|| eg!(SableError::ArithmeticOverflow))?;
            }
        }
        Ok(total)
    }

    fn output_sum(&self, code: AssetType) -> Result<u64> {
        let mut total: u64 = 0;
        for template in self.output_templates.iter() {
            if template.asset_type == code {
                total = total
                    .checked_add(template.amount)
                    .ok_or_else(|| eg!(SableError::ArithmeticOverflow))?;
            }
        }
        Ok(total)
    }

    fn push_input(
        &mut self,
        txo_sid: TxoRef,
        open_record: OpenAssetRecord,
        policies: TracingPolicies,
        amount: u64,
    ) {
        self.input_sids.push(txo_sid);
        self.spend_amounts.push(amount);
        self.input_records.push(open_record);
        self.inputs_tracing_policies.push(policies);
    }

    /// Adds an input spending `record`. The record is opened with `keypair`
    /// (and `owner_memo` when a field is confidential); `amount` is the
    /// portion the caller intends to spend and must not exceed the record's
    /// value. The unspent remainder becomes change at `balance` time.
    pub fn add_input(
        &mut self,
        txo_sid: TxoRef,
        record: BlindAssetRecord,
        owner_memo: Option<OwnerMemo>,
        tracing_policies: Option<TracingPolicies>,
        keypair: &XfrKeyPair,
        amount: u64,
    ) -> Result<&mut Self> {
        if self.transfer.is_some() {
            return Err(eg!("cannot mutate a transfer that has been created"));
        }
        let open_record = open_blind_asset_record(&record, &owner_memo, keypair).c(d!())?;
        if amount > *open_record.get_amount() {
            return Err(eg!(SableError::ParameterError));
        }
        self.push_input(
            txo_sid,
            open_record,
            tracing_policies.unwrap_or_default(),
            amount,
        );
        Ok(self)
    }

    pub fn add_input_no_tracing(
        &mut self,
        txo_sid: TxoRef,
        record: BlindAssetRecord,
        owner_memo: Option<OwnerMemo>,
        keypair: &XfrKeyPair,
        amount: u64,
    ) -> Result<&mut Self> {
        self.add_input(txo_sid, record, owner_memo, None, keypair, amount)
            .c(d!())
    }

    pub fn add_input_with_tracing(
        &mut self,
        txo_sid: TxoRef,
        record: BlindAssetRecord,
        owner_memo: Option<OwnerMemo>,
        tracing_policies: TracingPolicies,
        keypair: &XfrKeyPair,
        amount: u64,
    ) -> Result<&mut Self> {
        self.add_input(
            txo_sid,
            record,
            owner_memo,
            Some(tracing_policies),
            keypair,
            amount,
        )
        .c(d!())
    }

    /// Adds an output of `amount` units of `code` to `recipient`, with the
    /// requested confidentiality flags. Zero amounts are legal.
    pub fn add_output(
        &mut self,
        amount: u64,
        recipient: &XfrPublicKey,
        tracing_policies: Option<TracingPolicies>,
        code: AssetType,
        conf_amount: bool,
        conf_type: bool,
    ) -> Result<&mut Self> {
        if self.transfer.is_some() {
            return Err(eg!("cannot mutate a transfer that has been created"));
        }
        let record_type = AssetRecordType::from_flags(conf_amount, conf_type);
        let template = match tracing_policies {
            Some(policies) => AssetRecordTemplate::with_asset_tracing(
                amount,
                code,
                record_type,
                *recipient,
                policies,
            ),
            None => AssetRecordTemplate::with_no_asset_tracing(
                amount,
                code,
                record_type,
                *recipient,
            ),
        };
        self.output_templates.push(template);
        Ok(self)
    }

    pub fn add_output_no_tracing(
        &mut self,
        amount: u64,
        recipient: &XfrPublicKey,
        code: AssetType,
        conf_amount: bool,
        conf_type: bool,
    ) -> Result<&mut Self> {
        self.add_output(amount, recipient, None, code, conf_amount, conf_type)
            .c(d!())
    }

    pub fn add_output_with_tracing(
        &mut self,
        amount: u64,
        recipient: &XfrPublicKey,
        tracing_policies: TracingPolicies,
        code: AssetType,
        conf_amount: bool,
        conf_type: bool,
    ) -> Result<&mut Self> {
        self.add_output(
            amount,
            recipient,
            Some(tracing_policies),
            code,
            conf_amount,
            conf_type,
        )
        .c(d!())
    }

    /// Consumes `inputs` to pay a fee of `fee_amount` to `fee_recipient`.
    /// All fee inputs must carry the same asset type; the fee output is
    /// always non-confidential so the network can check it. Overpayment is
    /// returned as change by `balance`.
    pub fn add_fee(
        &mut self,
        inputs: FeeInputs,
        fee_amount: u64,
        fee_recipient: &XfrPublicKey,
    ) -> Result<&mut Self> {
        if self.transfer.is_some() {
            return Err(eg!("cannot mutate a transfer that has been created"));
        }
        if inputs.inner.is_empty() {
            return Err(eg!(SableError::ParameterError));
        }
        let mut fee_asset_type: Option<AssetType> = None;
        for input in inputs.inner.into_iter() {
            let open_record =
                open_blind_asset_record(&input.ar, &input.om, &input.kp).c(d!())?;
            let code = *open_record.get_asset_type();
            if *fee_asset_type.get_or_insert(code) != code {
                return Err(eg!(SableError::ParameterError));
            }
            if input.am > *open_record.get_amount() {
                return Err(eg!(SableError::ParameterError));
            }
            self.push_input(input.tr, open_record, TracingPolicies::default(), input.am);
        }
        let code = fee_asset_type.ok_or_else(|| eg!(SableError::ParameterError))?;
        self.add_output(fee_amount, fee_recipient, None, code, false, false)
            .c(d!())
    }

    /// Balances the transfer. For every asset type in use, the input total
    /// must cover the output total, and any surplus is returned to the sole
    /// input owner of that asset type as one change output. The change
    /// record's confidentiality flags follow the per-flag majority of the
    /// asset type's existing outputs; its tracing policies follow the first
    /// input of that asset type. Re-balancing a balanced builder adds
    /// nothing.
    pub fn balance(&mut self) -> Result<&mut Self> {
        if self.transfer.is_some() {
            return Err(eg!("cannot mutate a transfer that has been created"));
        }

        let mut change_templates = vec![];
        for code in self.distinct_asset_types() {
            let input_total = self.input_sum(code).c(d!())?;
            let output_total = self.output_sum(code).c(d!())?;
            if input_total < output_total {
                return Err(eg!(SableError::Unbalanced));
            }
            let surplus = input_total - output_total;
            if surplus == 0 {
                continue;
            }

            let mut owners = self
                .input_records
                .iter()
                .filter(|record| *record.get_asset_type() == code)
                .map(|record| *record.get_pub_key())
                .unique();
            let change_owner = owners
                .next()
                .ok_or_else(|| eg!(SableError::InconsistentStructureError))?;
            if owners.next().is_some() {
                return Err(eg!(SableError::AmbiguousChangeOwner));
            }

            let outputs_of_type: Vec<&AssetRecordTemplate> = self
                .output_templates
                .iter()
                .filter(|template| template.asset_type == code)
                .collect();
            let conf_amount_votes = outputs_of_type
                .iter()
                .filter(|template| template.asset_record_type.is_confidential_amount())
                .count();
            let conf_type_votes = outputs_of_type
                .iter()
                .filter(|template| template.asset_record_type.is_confidential_asset_type())
                .count();
            let record_type = AssetRecordType::from_flags(
                conf_amount_votes * 2 > outputs_of_type.len(),
                conf_type_votes * 2 > outputs_of_type.len(),
            );

            let change_policies = self
                .input_records
                .iter()
                .zip(self.inputs_tracing_policies.iter())
                .find(|(record, _)| *record.get_asset_type() == code)
                .map(|(_, policies)| policies.clone())
                .unwrap_or_default();

            change_templates.push(AssetRecordTemplate::with_asset_tracing(
                surplus,
                code,
                record_type,
                change_owner,
                change_policies,
            ));
        }
        self.output_templates.append(&mut change_templates);

        self.balance_fingerprint = Some(self.shape_fingerprint().c(d!())?);
        Ok(self)
    }

    /// Freezes the transfer into its operation body. Every output record is
    /// sampled with fresh entropy, so two created bodies never share
    /// blinding factors. Fails with `NotBalanced` unless the current shape
    /// matches the fingerprint captured by `balance`.
    pub fn create(&mut self) -> Result<&mut Self> {
        if self.transfer.is_some() {
            return Err(eg!("cannot mutate a transfer that has been created"));
        }
        let balanced_shape = self
            .balance_fingerprint
            .as_ref()
            .ok_or_else(|| eg!(SableError::NotBalanced))?;
        if *balanced_shape != self.shape_fingerprint().c(d!())? {
            return Err(eg!(SableError::NotBalanced));
        }
        // a deserialized builder can carry an arbitrary fingerprint, so
        // conservation is re-checked on the amounts themselves
        for code in self.distinct_asset_types() {
            if self.input_sum(code).c(d!())? != self.output_sum(code).c(d!())? {
                return Err(eg!(SableError::Unbalanced));
            }
        }

        let mut prng = ChaChaRng::from_entropy();
        let pc_gens = RistrettoPedersenGens::default();

        let mut outputs = Vec::with_capacity(self.output_templates.len());
        let mut output_tracing_memos = Vec::with_capacity(self.output_templates.len());
        let mut owners_memos = Vec::with_capacity(self.output_templates.len());
        for template in self.output_templates.iter() {
            let (record, tracer_memos, owner_memo) =
                build_blind_asset_record(&mut prng, &pc_gens, template).c(d!())?;
            outputs.push(record);
            output_tracing_memos.push(tracer_memos);
            owners_memos.push(owner_memo);
        }

        let mut inputs = Vec::with_capacity(self.input_records.len());
        let mut asset_tracing_memos = Vec::with_capacity(
            self.input_records.len() + self.output_templates.len(),
        );
        for (record, policies) in self
            .input_records
            .iter()
            .zip(self.inputs_tracing_policies.iter())
        {
            inputs.push(record.blind_asset_record.clone());
            let memos = tracer_memos_for_record(
                &mut prng,
                record.get_record_type(),
                *record.get_amount(),
                *record.get_asset_type(),
                policies,
            )
            .c(d!())?;
            asset_tracing_memos.push(memos);
        }
        asset_tracing_memos.append(&mut output_tracing_memos);

        let body = TransferAssetBody {
            inputs: self.input_sids.clone(),
            policies: TransferPolicies {
                inputs_tracing_policies: self.inputs_tracing_policies.clone(),
                outputs_tracing_policies: self
                    .output_templates
                    .iter()
                    .map(|template| template.asset_tracing_policies.clone())
                    .collect(),
            },
            transfer: Box::new(XfrBody {
                inputs,
                outputs,
                asset_tracing_memos,
                owners_memos,
            }),
        };
        self.transfer = Some(TransferAsset::new(body));
        Ok(self)
    }

    /// Signs the created body. The one signature covers every input owned
    /// by the keypair's public key.
    pub fn sign(&mut self, keypair: &XfrKeyPair) -> Result<&mut Self> {
        let transfer = self
            .transfer
            .as_mut()
            .ok_or_else(|| eg!("transfer operation has not been created"))?;
        if !transfer
            .body
            .transfer
            .inputs
            .iter()
            .any(|record| record.public_key == keypair.get_pk())
        {
            return Err(eg!(SableError::UnknownSigner));
        }
        transfer.sign(keypair).c(d!())?;
        Ok(self)
    }

    /// Attaches a co-signature for one input of the created body.
    pub fn add_cosignature(
        &mut self,
        keypair: &XfrKeyPair,
        input_idx: usize,
    ) -> Result<&mut Self> {
        let transfer = self
            .transfer
            .as_mut()
            .ok_or_else(|| eg!("transfer operation has not been created"))?;
        if input_idx >= transfer.body.transfer.inputs.len() {
            return Err(eg!(SableError::InvalidInputIndex));
        }
        transfer.add_cosignature(keypair, input_idx).c(d!())?;
        Ok(self)
    }

    /// Serialized operation, ready for submission. Fails with
    /// `IncompleteSignatures` until the body has been created and every
    /// input owner has signed it.
    pub fn transaction(&self) -> Result<String> {
        let transfer = self
            .transfer
            .as_ref()
            .ok_or_else(|| eg!(SableError::IncompleteSignatures))?;
        for record in transfer.body.transfer.inputs.iter() {
            let signed = transfer.body_signatures.iter().any(|signature| {
                signature.input_idx.is_none() && signature.address.key == record.public_key
            });
            if !signed {
                return Err(eg!(SableError::IncompleteSignatures));
            }
        }
        serde_json::to_string(&Operation::TransferAsset(transfer.clone()))
            .c(d!(SableError::SerializationError))
    }

    /// Debug projection of the whole builder state, available in any state.
    pub fn builder(&self) -> Result<String> {
        serde_json::to_string(self).c(d!(SableError::SerializationError))
    }

    /// Output record at `idx` of the created body, change included.
    pub fn get_output_record(&self, idx: usize) -> Option<BlindAssetRecord> {
        self.transfer.as_ref()?.body.transfer.outputs.get(idx).cloned()
    }

    /// Owner memo for the output at `idx` of the created body, if that
    /// output has a confidential field.
    pub fn get_owner_memo(&self, idx: usize) -> Option<OwnerMemo> {
        self.transfer
            .as_ref()?
            .body
            .transfer
            .owners_memos
            .get(idx)
            .cloned()
            .flatten()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_model::TxoSID;
    use crate::txn::fee::{fee_dest_pubkey, FeeInputs, TX_FEE_MIN};
    use crate::xfr::structs::{AssetTracerKeyPair, TracingPolicy, XfrAmount, XfrAssetType};
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;
    use ruc::*;

    const ASSET1: AssetType = AssetType([0u8; 32]);
    const ASSET2: AssetType = AssetType([1u8; 32]);

    fn ledger_record(
        prng: &mut ChaChaRng,
        amount: u64,
        asset_type: AssetType,
        record_type: AssetRecordType,
        owner: &XfrKeyPair,
    ) -> (BlindAssetRecord, Option<OwnerMemo>) {
        let pc_gens = RistrettoPedersenGens::default();
        let template = AssetRecordTemplate::with_no_asset_tracing(
            amount,
            asset_type,
            record_type,
            owner.get_pk(),
        );
        let (record, _, owner_memo) =
            pnk!(build_blind_asset_record(prng, &pc_gens, &template));
        (record, owner_memo)
    }

    fn public_record(
        prng: &mut ChaChaRng,
        amount: u64,
        asset_type: AssetType,
        owner: &XfrKeyPair,
    ) -> BlindAssetRecord {
        let (record, _) = ledger_record(
            prng,
            amount,
            asset_type,
            AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType,
            owner,
        );
        record
    }

    #[test]
    fn transfer_with_change_round_trip() {
        let mut prng = ChaChaRng::from_seed([0u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(
            TxoRef::absolute(TxoSID(42)),
            record,
            None,
            None,
            &alice,
            60
        ));
        pnk!(builder.add_output(60, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        pnk!(builder.create());
        pnk!(builder.sign(&alice));

        let op: Operation = serde_json::from_str(&pnk!(builder.transaction())).unwrap();
        let Operation::TransferAsset(transfer) = op;
        assert_eq!(transfer.body.inputs, vec![TxoRef::Absolute(TxoSID(42))]);

        let body = &transfer.body.transfer;
        assert_eq!(body.outputs.len(), 2);
        assert_eq!(body.outputs[0].amount, XfrAmount::NonConfidential(60));
        assert_eq!(body.outputs[0].public_key, bob.get_pk());
        assert_eq!(body.outputs[1].amount, XfrAmount::NonConfidential(40));
        assert_eq!(body.outputs[1].public_key, alice.get_pk());
        assert_eq!(
            body.outputs[1].asset_type,
            XfrAssetType::NonConfidential(ASSET1)
        );
        assert_eq!(body.owners_memos, vec![None, None]);

        assert_eq!(transfer.body_signatures.len(), 1);
        assert!(transfer.body.verify_body_signature(&transfer.body_signatures[0]));

        assert!(builder.get_output_record(1).is_some());
        assert!(builder.get_output_record(2).is_none());
        assert!(builder.get_owner_memo(1).is_none());
    }

    #[test]
    fn balance_is_idempotent() {
        let mut prng = ChaChaRng::from_seed([1u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 60));
        pnk!(builder.add_output(60, &bob.get_pk(), None, ASSET1, false, false));

        pnk!(builder.balance());
        let outputs_after_first = builder.output_templates.len();
        let fingerprint_after_first = builder.balance_fingerprint.clone();
        pnk!(builder.balance());
        assert_eq!(builder.output_templates.len(), outputs_after_first);
        assert_eq!(builder.balance_fingerprint, fingerprint_after_first);
        pnk!(builder.create());
    }

    #[test]
    fn balance_rejects_deficit() {
        let mut prng = ChaChaRng::from_seed([2u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 50, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 50));
        pnk!(builder.add_output(60, &bob.get_pk(), None, ASSET1, false, false));
        msg_eq!(SableError::Unbalanced, builder.balance().unwrap_err());
    }

    #[test]
    fn output_without_matching_input_is_unbalanced() {
        let mut prng = ChaChaRng::from_seed([3u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 100));
        pnk!(builder.add_output(100, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.add_output(10, &bob.get_pk(), None, ASSET2, false, false));
        msg_eq!(SableError::Unbalanced, builder.balance().unwrap_err());
    }

    #[test]
    fn change_with_multiple_owners_is_rejected() {
        let mut prng = ChaChaRng::from_seed([4u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let carol = XfrKeyPair::generate(&mut prng);
        let alice_record = public_record(&mut prng, 60, ASSET1, &alice);
        let bob_record = public_record(&mut prng, 50, ASSET1, &bob);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(1), alice_record, None, None, &alice, 60));
        pnk!(builder.add_input(TxoRef::relative(0), bob_record, None, None, &bob, 50));
        pnk!(builder.add_output(100, &carol.get_pk(), None, ASSET1, false, false));
        msg_eq!(SableError::AmbiguousChangeOwner, builder.balance().unwrap_err());
    }

    #[test]
    fn exact_balance_with_multiple_owners_needs_no_change() {
        let mut prng = ChaChaRng::from_seed([5u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let carol = XfrKeyPair::generate(&mut prng);
        let alice_record = public_record(&mut prng, 60, ASSET1, &alice);
        let bob_record = public_record(&mut prng, 50, ASSET1, &bob);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(1), alice_record, None, None, &alice, 60));
        pnk!(builder.add_input(TxoRef::relative(0), bob_record, None, None, &bob, 50));
        pnk!(builder.add_output(110, &carol.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        assert_eq!(builder.output_templates.len(), 1);
    }

    #[test]
    fn create_requires_a_fresh_balance() {
        let mut prng = ChaChaRng::from_seed([6u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 60));
        pnk!(builder.add_output(60, &bob.get_pk(), None, ASSET1, false, false));
        msg_eq!(SableError::NotBalanced, builder.create().unwrap_err());

        pnk!(builder.balance());
        // zero-amount outputs are legal, but still change the balanced shape
        pnk!(builder.add_output(0, &bob.get_pk(), None, ASSET1, false, false));
        msg_eq!(SableError::NotBalanced, builder.create().unwrap_err());

        pnk!(builder.balance());
        pnk!(builder.create());
    }

    #[test]
    fn sign_rejects_unknown_signer() {
        let mut prng = ChaChaRng::from_seed([7u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let mallory = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 100));
        pnk!(builder.add_output(100, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        pnk!(builder.create());
        msg_eq!(SableError::UnknownSigner, builder.sign(&mallory).unwrap_err());
        pnk!(builder.sign(&alice));
        pnk!(builder.transaction());
    }

    #[test]
    fn cosignature_index_is_checked() {
        let mut prng = ChaChaRng::from_seed([8u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 100));
        pnk!(builder.add_output(100, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        msg_eq!(
            "transfer operation has not been created",
            builder.add_cosignature(&alice, 0).unwrap_err()
        );
        pnk!(builder.create());
        msg_eq!(
            SableError::InvalidInputIndex,
            builder.add_cosignature(&alice, 1).unwrap_err()
        );
        pnk!(builder.add_cosignature(&alice, 0));

        let transfer = builder.transfer.as_ref().unwrap();
        assert_eq!(transfer.body_signatures.len(), 1);
        assert_eq!(transfer.body_signatures[0].input_idx, Some(0));
    }

    #[test]
    fn transaction_requires_every_owner_signature() {
        let mut prng = ChaChaRng::from_seed([9u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let carol = XfrKeyPair::generate(&mut prng);
        let alice_record = public_record(&mut prng, 60, ASSET1, &alice);
        let bob_record = public_record(&mut prng, 50, ASSET1, &bob);

        let mut builder = TransferOperationBuilder::new();
        msg_eq!(
            SableError::IncompleteSignatures,
            builder.transaction().unwrap_err()
        );

        pnk!(builder.add_input(TxoRef::relative(1), alice_record, None, None, &alice, 60));
        pnk!(builder.add_input(TxoRef::relative(0), bob_record, None, None, &bob, 50));
        pnk!(builder.add_output(110, &carol.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        pnk!(builder.create());

        pnk!(builder.sign(&alice));
        msg_eq!(
            SableError::IncompleteSignatures,
            builder.transaction().unwrap_err()
        );

        // a co-signature does not stand in for bob's owner signature
        pnk!(builder.add_cosignature(&bob, 1));
        msg_eq!(
            SableError::IncompleteSignatures,
            builder.transaction().unwrap_err()
        );

        pnk!(builder.sign(&bob));
        pnk!(builder.transaction());
    }

    #[test]
    fn change_follows_majority_output_confidentiality() {
        let mut prng = ChaChaRng::from_seed([10u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let (record, memo) = ledger_record(
            &mut prng,
            100,
            ASSET1,
            AssetRecordType::ConfidentialAmount_ConfidentialAssetType,
            &alice,
        );

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, memo, None, &alice, 60));
        pnk!(builder.add_output(30, &bob.get_pk(), None, ASSET1, true, true));
        pnk!(builder.add_output(30, &bob.get_pk(), None, ASSET1, true, true));
        pnk!(builder.balance());
        pnk!(builder.create());

        let change = builder.get_output_record(2).unwrap();
        assert!(change.amount.is_confidential());
        assert!(change.asset_type.is_confidential());

        let change_memo = builder.get_owner_memo(2);
        assert!(change_memo.is_some());
        let opened = pnk!(open_blind_asset_record(&change, &change_memo, &alice));
        assert_eq!(*opened.get_amount(), 40);
        assert_eq!(*opened.get_asset_type(), ASSET1);
    }

    #[test]
    fn change_confidentiality_tie_stays_public() {
        let mut prng = ChaChaRng::from_seed([11u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, None, None, &alice, 60));
        pnk!(builder.add_output(30, &bob.get_pk(), None, ASSET1, true, true));
        pnk!(builder.add_output(30, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        pnk!(builder.create());

        let change = builder.get_output_record(2).unwrap();
        assert_eq!(
            change.get_record_type(),
            AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType
        );
        assert!(builder.get_owner_memo(2).is_none());
    }

    #[test]
    fn traced_inputs_carry_memos_for_the_tracer() {
        let mut prng = ChaChaRng::from_seed([12u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let tracer = AssetTracerKeyPair::generate(&mut prng);
        let policies = TracingPolicies::from_policy(TracingPolicy {
            enc_keys: tracer.enc_key.clone(),
            asset_tracing: true,
        });
        let (record, memo) = ledger_record(
            &mut prng,
            100,
            ASSET1,
            AssetRecordType::ConfidentialAmount_NonConfidentialAssetType,
            &alice,
        );

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input_with_tracing(
            TxoRef::relative(0),
            record,
            memo,
            policies.clone(),
            &alice,
            100
        ));
        pnk!(builder.add_output_with_tracing(
            100,
            &bob.get_pk(),
            policies,
            ASSET1,
            true,
            false
        ));
        pnk!(builder.balance());
        pnk!(builder.create());

        let transfer = builder.transfer.as_ref().unwrap();
        let body = &transfer.body.transfer;
        // one memo set per input, then one per output
        assert_eq!(body.asset_tracing_memos.len(), 2);
        assert_eq!(body.asset_tracing_memos[0].len(), 1);
        assert_eq!(body.asset_tracing_memos[1].len(), 1);
        let (amount, asset_type) =
            pnk!(body.asset_tracing_memos[0][0].decrypt(&tracer.dec_key));
        assert_eq!(amount, Some(100));
        assert_eq!(asset_type, None);
        assert_eq!(transfer.body.policies.inputs_tracing_policies.len(), 1);
        assert_eq!(transfer.body.policies.outputs_tracing_policies.len(), 1);
    }

    #[test]
    fn fee_inputs_cover_the_fee() {
        let mut prng = ChaChaRng::from_seed([13u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let first = public_record(&mut prng, TX_FEE_MIN, ASSET1, &alice);
        let second = public_record(&mut prng, TX_FEE_MIN, ASSET1, &alice);
        let fee_to = pnk!(fee_dest_pubkey());

        let mut fee_inputs = FeeInputs::new();
        fee_inputs
            .append(
                TX_FEE_MIN,
                TxoRef::absolute(TxoSID(1)),
                first,
                None,
                alice.clone(),
            )
            .append(
                TX_FEE_MIN,
                TxoRef::absolute(TxoSID(2)),
                second,
                None,
                alice.clone(),
            );

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_fee(fee_inputs, TX_FEE_MIN, &fee_to));
        pnk!(builder.balance());
        pnk!(builder.create());
        pnk!(builder.sign(&alice));
        pnk!(builder.transaction());

        let fee_output = builder.get_output_record(0).unwrap();
        assert_eq!(fee_output.amount, XfrAmount::NonConfidential(TX_FEE_MIN));
        assert_eq!(fee_output.public_key, fee_to);
        // the second fee input was not needed, so it comes back as change
        let change = builder.get_output_record(1).unwrap();
        assert_eq!(change.amount, XfrAmount::NonConfidential(TX_FEE_MIN));
        assert_eq!(change.public_key, alice.get_pk());
    }

    #[test]
    fn fee_inputs_must_share_one_asset_type() {
        let mut prng = ChaChaRng::from_seed([14u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let first = public_record(&mut prng, TX_FEE_MIN, ASSET1, &alice);
        let second = public_record(&mut prng, TX_FEE_MIN, ASSET2, &alice);
        let fee_to = pnk!(fee_dest_pubkey());

        let mut builder = TransferOperationBuilder::new();
        msg_eq!(
            SableError::ParameterError,
            builder
                .add_fee(FeeInputs::new(), TX_FEE_MIN, &fee_to)
                .unwrap_err()
        );

        let mut fee_inputs = FeeInputs::new();
        fee_inputs
            .append(
                TX_FEE_MIN,
                TxoRef::absolute(TxoSID(1)),
                first,
                None,
                alice.clone(),
            )
            .append(
                TX_FEE_MIN,
                TxoRef::absolute(TxoSID(2)),
                second,
                None,
                alice.clone(),
            );
        msg_eq!(
            SableError::ParameterError,
            builder.add_fee(fee_inputs, TX_FEE_MIN, &fee_to).unwrap_err()
        );
    }

    #[test]
    fn created_transfer_is_immutable() {
        let mut prng = ChaChaRng::from_seed([15u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record.clone(), None, None, &alice, 100));
        pnk!(builder.add_output(100, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());
        pnk!(builder.create());

        msg_eq!(
            "cannot mutate a transfer that has been created",
            builder
                .add_input(TxoRef::relative(0), record, None, None, &alice, 100)
                .unwrap_err()
        );
        assert!(builder
            .add_output(1, &bob.get_pk(), None, ASSET1, false, false)
            .is_err());
        assert!(builder.balance().is_err());
        assert!(builder.create().is_err());
        // the debug projection stays available
        pnk!(builder.builder());
    }

    #[test]
    fn add_input_validates_ownership_and_amount() {
        let mut prng = ChaChaRng::from_seed([16u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let record = public_record(&mut prng, 100, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        msg_eq!(
            SableError::ParameterError,
            builder
                .add_input(TxoRef::relative(0), record.clone(), None, None, &alice, 101)
                .unwrap_err()
        );
        msg_eq!(
            SableError::RecordMismatch,
            builder
                .add_input(TxoRef::relative(0), record, None, None, &bob, 50)
                .unwrap_err()
        );
        assert!(builder.input_records.is_empty());
    }

    #[test]
    fn input_sums_are_overflow_checked() {
        let mut prng = ChaChaRng::from_seed([17u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let first = public_record(&mut prng, u64::MAX, ASSET1, &alice);
        let second = public_record(&mut prng, 1, ASSET1, &alice);

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(1), first, None, None, &alice, 1));
        pnk!(builder.add_input(TxoRef::relative(0), second, None, None, &alice, 1));
        msg_eq!(SableError::ArithmeticOverflow, builder.balance().unwrap_err());
    }

    #[test]
    fn builder_state_survives_serialization() {
        let mut prng = ChaChaRng::from_seed([18u8; 32]);
        let alice = XfrKeyPair::generate(&mut prng);
        let bob = XfrKeyPair::generate(&mut prng);
        let (record, memo) = ledger_record(
            &mut prng,
            100,
            ASSET1,
            AssetRecordType::ConfidentialAmount_NonConfidentialAssetType,
            &alice,
        );

        let mut builder = TransferOperationBuilder::new();
        pnk!(builder.add_input(TxoRef::relative(0), record, memo, None, &alice, 60));
        pnk!(builder.add_output(60, &bob.get_pk(), None, ASSET1, false, false));
        pnk!(builder.balance());

        let json = pnk!(builder.builder());
        let mut restored: TransferOperationBuilder = serde_json::from_str(&json).unwrap();
        pnk!(restored.create());
        pnk!(restored.sign(&alice));
        pnk!(restored.transaction());
    }
}
