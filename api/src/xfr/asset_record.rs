use crate::errors::SableError;
use crate::xfr::sig::{XfrKeyPair, XfrPublicKey};
use crate::xfr::structs::{
    AssetRecordTemplate, AssetType, BlindAssetRecord, OpenAssetRecord, OwnerMemo,
    TracerMemo, TracingPolicies, XfrAmount, XfrAssetType,
};
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use ruc::*;
use sable_crypto::basic::pedersen_comm::RistrettoPedersenGens;

/// AssetRecord confidentiality flags. Indicate if amount and/or asset type
/// should be confidential.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[allow(non_camel_case_types)]
pub enum AssetRecordType {
    NonConfidentialAmount_ConfidentialAssetType,
    ConfidentialAmount_NonConfidentialAssetType,
    ConfidentialAmount_ConfidentialAssetType,
    NonConfidentialAmount_NonConfidentialAssetType,
}

impl AssetRecordType {
    /// Returns a boolean pair (confidential amount, confidential asset type)
    pub fn get_flags(self) -> (bool, bool) {
        match self {
            AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType => (false, false),
            AssetRecordType::ConfidentialAmount_NonConfidentialAssetType => (true, false),
            AssetRecordType::NonConfidentialAmount_ConfidentialAssetType => (false, true),
            AssetRecordType::ConfidentialAmount_ConfidentialAssetType => (true, true),
        }
    }

    pub fn is_confidential_amount(self) -> bool {
        matches!(
            self,
            AssetRecordType::ConfidentialAmount_ConfidentialAssetType
                | AssetRecordType::ConfidentialAmount_NonConfidentialAssetType
        )
    }

    pub fn is_confidential_asset_type(self) -> bool {
        matches!(
            self,
            AssetRecordType::ConfidentialAmount_ConfidentialAssetType
                | AssetRecordType::NonConfidentialAmount_ConfidentialAssetType
        )
    }

    /// Computes the record type from confidentiality flags
    pub fn from_flags(conf_amt: bool, conf_type: bool) -> Self {
        match (conf_amt, conf_type) {
            (false, false) => AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType,
            (true, false) => AssetRecordType::ConfidentialAmount_NonConfidentialAssetType,
            (false, true) => AssetRecordType::NonConfidentialAmount_ConfidentialAssetType,
            (true, true) => AssetRecordType::ConfidentialAmount_ConfidentialAssetType,
        }
    }
}

impl AssetRecordTemplate {
    /// Creates a `AssetRecordTemplate` with no associated asset tracing policy
    pub fn with_no_asset_tracing(
        amount: u64,
        asset_type: AssetType,
        asset_record_type: AssetRecordType,
        address: XfrPublicKey,
    ) -> AssetRecordTemplate {
        AssetRecordTemplate {
            amount,
            asset_type,
            public_key: address,
            asset_record_type,
            asset_tracing_policies: TracingPolicies::new(),
        }
    }

    pub fn with_asset_tracing(
        amount: u64,
        asset_type: AssetType,
        asset_record_type: AssetRecordType,
        address: XfrPublicKey,
        policies: TracingPolicies,
    ) -> AssetRecordTemplate {
        let mut template = AssetRecordTemplate::with_no_asset_tracing(
            amount,
            asset_type,
            asset_record_type,
            address,
        );
        template.asset_tracing_policies = policies;
        template
    }
}

fn sample_blind_asset_record<R: CryptoRng + RngCore>(
    prng: &mut R,
    pc_gens: &RistrettoPedersenGens,
    asset_record: &AssetRecordTemplate,
) -> Result<(
    BlindAssetRecord,
    (Scalar, Scalar),
    Scalar,
    Vec<TracerMemo>,
    Option<OwnerMemo>,
)> {
    let (xfr_amount, xfr_asset_type, amount_blinds, type_blind, owner_memo) =
        match asset_record.asset_record_type {
            AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType => (
                XfrAmount::NonConfidential(asset_record.amount),
                XfrAssetType::NonConfidential(asset_record.asset_type),
                (Scalar::ZERO, Scalar::ZERO),
                Scalar::ZERO,
                None,
            ),

            AssetRecordType::ConfidentialAmount_NonConfidentialAssetType => {
                let (owner_memo, amount_blinds) = OwnerMemo::from_amount(
                    prng,
                    asset_record.amount,
                    &asset_record.public_key,
                )
                .c(d!())?;
                (
                    XfrAmount::from_blinds(
                        pc_gens,
                        asset_record.amount,
                        &amount_blinds.0,
                        &amount_blinds.1,
                    ),
                    XfrAssetType::NonConfidential(asset_record.asset_type),
                    amount_blinds,
                    Scalar::ZERO,
                    Some(owner_memo),
                )
            }

            AssetRecordType::NonConfidentialAmount_ConfidentialAssetType => {
                let (owner_memo, type_blind) = OwnerMemo::from_asset_type(
                    prng,
                    &asset_record.asset_type,
                    &asset_record.public_key,
                )
                .c(d!())?;
                (
                    XfrAmount::NonConfidential(asset_record.amount),
                    XfrAssetType::from_blind(pc_gens, &asset_record.asset_type, &type_blind),
                    (Scalar::ZERO, Scalar::ZERO),
                    type_blind,
                    Some(owner_memo),
                )
            }

            AssetRecordType::ConfidentialAmount_ConfidentialAssetType => {
                let (owner_memo, amount_blinds, type_blind) =
                    OwnerMemo::from_amount_and_asset_type(
                        prng,
                        asset_record.amount,
                        &asset_record.asset_type,
                        &asset_record.public_key,
                    )
                    .c(d!())?;
                (
                    XfrAmount::from_blinds(
                        pc_gens,
                        asset_record.amount,
                        &amount_blinds.0,
                        &amount_blinds.1,
                    ),
                    XfrAssetType::from_blind(pc_gens, &asset_record.asset_type, &type_blind),
                    amount_blinds,
                    type_blind,
                    Some(owner_memo),
                )
            }
        };

    let blind_asset_record = BlindAssetRecord {
        amount: xfr_amount,
        asset_type: xfr_asset_type,
        public_key: asset_record.public_key,
    };

    let tracer_memos = tracer_memos_for_record(
        prng,
        asset_record.asset_record_type,
        asset_record.amount,
        asset_record.asset_type,
        &asset_record.asset_tracing_policies,
    )
    .c(d!())?;

    Ok((
        blind_asset_record,
        amount_blinds,
        type_blind,
        tracer_memos,
        owner_memo,
    ))
}

/// Builds one memo per tracing policy, sealing the fields the record keeps
/// confidential. Public fields are readable from the ledger and are not sealed.
pub fn tracer_memos_for_record<R: CryptoRng + RngCore>(
    prng: &mut R,
    record_type: AssetRecordType,
    amount: u64,
    asset_type: AssetType,
    policies: &TracingPolicies,
) -> Result<Vec<TracerMemo>> {
    let mut memos = vec![];
    for policy in policies.get_policies().iter() {
        let (amount_info, asset_type_info) = if policy.asset_tracing {
            let amount_info = if record_type.is_confidential_amount() {
                Some(amount)
            } else {
                None
            };
            let asset_type_info = if record_type.is_confidential_asset_type() {
                Some(asset_type)
            } else {
                None
            };
            (amount_info, asset_type_info)
        } else {
            (None, None)
        };
        let memo =
            TracerMemo::new(prng, &policy.enc_keys, amount_info, asset_type_info).c(d!())?;
        memos.push(memo);
    }
    Ok(memos)
}

/// Builds an OpenAssetRecord and associated memos from an AssetRecordTemplate
pub fn build_open_asset_record<R: CryptoRng + RngCore>(
    prng: &mut R,
    pc_gens: &RistrettoPedersenGens,
    asset_record: &AssetRecordTemplate,
) -> Result<(OpenAssetRecord, Vec<TracerMemo>, Option<OwnerMemo>)> {
    let (blind_asset_record, amount_blinds, type_blind, tracer_memos, owner_memo) =
        sample_blind_asset_record(prng, pc_gens, asset_record).c(d!())?;

    let open_asset_record = OpenAssetRecord {
        blind_asset_record,
        amount: asset_record.amount,
        amount_blinds,
        asset_type: asset_record.asset_type,
        type_blind,
    };

    Ok((open_asset_record, tracer_memos, owner_memo))
}

/// Builds a BlindAssetRecord and associated memos from an AssetRecordTemplate
pub fn build_blind_asset_record<R: CryptoRng + RngCore>(
    prng: &mut R,
    pc_gens: &RistrettoPedersenGens,
    asset_record: &AssetRecordTemplate,
) -> Result<(BlindAssetRecord, Vec<TracerMemo>, Option<OwnerMemo>)> {
    let (open_asset_record, tracer_memos, owner_memo) =
        build_open_asset_record(prng, pc_gens, asset_record).c(d!())?;
    Ok((
        open_asset_record.blind_asset_record,
        tracer_memos,
        owner_memo,
    ))
}

/// Opens a blind asset record, recovering the hidden amount and asset type
/// together with their blinds.
///
/// The caller must own the record. Every recovered field is checked against
/// the commitments stored in the record, so a memo that decrypts cleanly but
/// disagrees with the ledger copy is still rejected.
/// * `input` - record to open
/// * `owner_memo` - memo that lock amount and/or asset type
/// * `keypair` - owner's keypair
pub fn open_blind_asset_record(
    input: &BlindAssetRecord,
    owner_memo: &Option<OwnerMemo>,
    keypair: &XfrKeyPair,
) -> Result<OpenAssetRecord> {
    if input.public_key != keypair.get_pk() {
        return Err(eg!(SableError::RecordMismatch));
    }

    let record_type = input.get_record_type();
    let (amount, asset_type, amount_blinds, type_blind) = match record_type {
        AssetRecordType::NonConfidentialAmount_NonConfidentialAssetType => (
            input
                .amount
                .get_amount()
                .c(d!(SableError::InconsistentStructureError))?,
            input
                .asset_type
                .get_asset_type()
                .c(d!(SableError::InconsistentStructureError))?,
            (Scalar::ZERO, Scalar::ZERO),
            Scalar::ZERO,
        ),

        AssetRecordType::ConfidentialAmount_NonConfidentialAssetType => {
            let owner_memo = owner_memo.as_ref().c(d!(SableError::RecordMismatch))?;
            let amount = owner_memo
                .decrypt_amount(keypair)
                .c(d!(SableError::RecordMismatch))?;
            let amount_blinds = owner_memo
                .derive_amount_blinds(keypair)
                .c(d!(SableError::RecordMismatch))?;
            (
                amount,
                input
                    .asset_type
                    .get_asset_type()
                    .c(d!(SableError::InconsistentStructureError))?,
                amount_blinds,
                Scalar::ZERO,
            )
        }

        AssetRecordType::NonConfidentialAmount_ConfidentialAssetType => {
            let owner_memo = owner_memo.as_ref().c(d!(SableError::RecordMismatch))?;
            let asset_type = owner_memo
                .decrypt_asset_type(keypair)
                .c(d!(SableError::RecordMismatch))?;
            let type_blind = owner_memo
                .derive_asset_type_blind(keypair)
                .c(d!(SableError::RecordMismatch))?;
            (
                input
                    .amount
                    .get_amount()
                    .c(d!(SableError::InconsistentStructureError))?,
                asset_type,
                (Scalar::ZERO, Scalar::ZERO),
                type_blind,
            )
        }

        AssetRecordType::ConfidentialAmount_ConfidentialAssetType => {
            let owner_memo = owner_memo.as_ref().c(d!(SableError::RecordMismatch))?;
            let (amount, asset_type) = owner_memo
                .decrypt_amount_and_asset_type(keypair)
                .c(d!(SableError::RecordMismatch))?;
            let amount_blinds = owner_memo
                .derive_amount_blinds(keypair)
                .c(d!(SableError::RecordMismatch))?;
            let type_blind = owner_memo
                .derive_asset_type_blind(keypair)
                .c(d!(SableError::RecordMismatch))?;
            (amount, asset_type, amount_blinds, type_blind)
        }
    };

    // the recovered openings must reproduce the stored commitments
    let pc_gens = RistrettoPedersenGens::default();
    if record_type.is_confidential_amount()
        && XfrAmount::from_blinds(&pc_gens, amount, &amount_blinds.0, &amount_blinds.1)
            != input.amount
    {
        return Err(eg!(SableError::RecordMismatch));
    }
    if record_type.is_confidential_asset_type()
        && XfrAssetType::from_blind(&pc_gens, &asset_type, &type_blind) != input.asset_type
    {
        return Err(eg!(SableError::RecordMismatch));
    }

    Ok(OpenAssetRecord {
        blind_asset_record: input.clone(),
        amount,
        amount_blinds,
        asset_type,
        type_blind,
    })
}
