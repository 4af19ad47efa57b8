use curve25519_dalek::constants::{RISTRETTO_BASEPOINT_COMPRESSED, RISTRETTO_BASEPOINT_POINT};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::MultiscalarMul;
use sha2::Sha512;

/// Generators for Pedersen commitments over the Ristretto group.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RistrettoPedersenGens {
    /// base for the committed value
    pub B: RistrettoPoint,
    /// base for the blinding factor
    pub B_blinding: RistrettoPoint,
}

impl Default for RistrettoPedersenGens {
    fn default() -> RistrettoPedersenGens {
        RistrettoPedersenGens {
            B: RISTRETTO_BASEPOINT_POINT,
            B_blinding: RistrettoPoint::hash_from_bytes::<Sha512>(
                RISTRETTO_BASEPOINT_COMPRESSED.as_bytes(),
            ),
        }
    }
}

impl RistrettoPedersenGens {
    pub fn commit(&self, value: Scalar, blinding: Scalar) -> RistrettoPoint {
        RistrettoPoint::multiscalar_mul(&[value, blinding], &[self.B, self.B_blinding])
    }
}
