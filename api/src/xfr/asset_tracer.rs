use crate::errors::SableError;
use crate::xfr::structs::{
    AssetTracerDecKeys, AssetTracerEncKeys, AssetType, TracerMemo, ASSET_TYPE_LENGTH,
};
use rand_core::{CryptoRng, RngCore};
use ruc::*;
use sable_crypto::basic::hybrid_encryption;
use sable_crypto::{u32_pair_to_u64, u64_to_u32_pair, u8_be_slice_to_u32};

impl TracerMemo {
    /// Sample a memo from the fields a tracing policy reveals for one record.
    /// The amount is stored as a big-endian (low u32, high u32) pair followed
    /// by the 32 byte asset type, either part optional.
    pub fn new<R: CryptoRng + RngCore>(
        prng: &mut R,
        tracer_enc_key: &AssetTracerEncKeys,
        amount: Option<u64>,
        asset_type: Option<AssetType>,
    ) -> Result<Self> {
        let mut plaintext = vec![];
        if let Some(amount) = amount {
            let (amount_lo, amount_hi) = u64_to_u32_pair(amount);
            plaintext.extend_from_slice(&amount_lo.to_be_bytes());
            plaintext.extend_from_slice(&amount_hi.to_be_bytes());
        }
        if let Some(asset_type) = asset_type {
            plaintext.extend_from_slice(&asset_type.0);
        }
        let lock_info = hybrid_encryption::hybrid_encrypt_x25519(
            prng,
            &tracer_enc_key.lock_info_enc_key,
            &plaintext,
        )
        .c(d!())?;
        Ok(TracerMemo {
            enc_key: tracer_enc_key.clone(),
            lock_info,
        })
    }

    /// Decrypt the memo, returning the revealed amount and/or asset type.
    /// The plaintext length determines which fields were sealed; any other
    /// length means the memo does not belong to this scheme.
    pub fn decrypt(
        &self,
        dec_key: &AssetTracerDecKeys,
    ) -> Result<(Option<u64>, Option<AssetType>)> {
        let plaintext = hybrid_encryption::hybrid_decrypt_with_x25519_secret_key(
            &self.lock_info,
            &dec_key.lock_info_dec_key,
        )
        .c(d!())?;

        let parse_amount = |bytes: &[u8]| {
            let amount_lo = u8_be_slice_to_u32(&bytes[0..4]);
            let amount_hi = u8_be_slice_to_u32(&bytes[4..8]);
            u32_pair_to_u64((amount_lo, amount_hi))
        };
        let parse_asset_type = |bytes: &[u8]| {
            let mut asset_type = [0u8; ASSET_TYPE_LENGTH];
            asset_type.copy_from_slice(bytes);
            AssetType(asset_type)
        };

        match plaintext.len() {
            0 => Ok((None, None)),
            8 => Ok((Some(parse_amount(&plaintext)), None)),
            ASSET_TYPE_LENGTH => Ok((None, Some(parse_asset_type(&plaintext)))),
            40 => Ok((
                Some(parse_amount(&plaintext[0..8])),
                Some(parse_asset_type(&plaintext[8..])),
            )),
            _ => Err(eg!(SableError::InconsistentStructureError)),
        }
    }
}
