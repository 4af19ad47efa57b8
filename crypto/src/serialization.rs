use crate::errors::CryptoError;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use ruc::*;

/// Helper trait for objects that serialize through a plain byte string
pub trait SableFromToBytes: Sized {
    fn sable_to_bytes(&self) -> Vec<u8>;
    fn sable_from_bytes(bytes: &[u8]) -> Result<Self>;
}

fn array_32_from_slice(bytes: &[u8]) -> Result<[u8; 32]> {
    if bytes.len() != 32 {
        return Err(eg!(CryptoError::DeserializationError));
    }
    let mut array = [0u8; 32];
    array.copy_from_slice(bytes);
    Ok(array)
}

impl SableFromToBytes for Scalar {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<Scalar> {
        let array = array_32_from_slice(bytes).c(d!())?;
        let scalar: Option<Scalar> = Scalar::from_canonical_bytes(array).into();
        scalar.ok_or(eg!(CryptoError::DeserializationError))
    }
}

impl SableFromToBytes for CompressedRistretto {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<CompressedRistretto> {
        array_32_from_slice(bytes).map(CompressedRistretto).c(d!())
    }
}

impl SableFromToBytes for CompressedEdwardsY {
    fn sable_to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<CompressedEdwardsY> {
        array_32_from_slice(bytes).map(CompressedEdwardsY).c(d!())
    }
}

// pairs serialize as the concatenation of both encodings

impl SableFromToBytes for (Scalar, Scalar) {
    fn sable_to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.0.to_bytes().to_vec();
        bytes.extend_from_slice(&self.1.to_bytes());
        bytes
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<(Scalar, Scalar)> {
        if bytes.len() != 64 {
            return Err(eg!(CryptoError::DeserializationError));
        }
        let first = Scalar::sable_from_bytes(&bytes[..32]).c(d!())?;
        let second = Scalar::sable_from_bytes(&bytes[32..]).c(d!())?;
        Ok((first, second))
    }
}

impl SableFromToBytes for (CompressedRistretto, CompressedRistretto) {
    fn sable_to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.0.as_bytes().to_vec();
        bytes.extend_from_slice(self.1.as_bytes());
        bytes
    }
    fn sable_from_bytes(bytes: &[u8]) -> Result<(CompressedRistretto, CompressedRistretto)> {
        if bytes.len() != 64 {
            return Err(eg!(CryptoError::DeserializationError));
        }
        let first = CompressedRistretto::sable_from_bytes(&bytes[..32]).c(d!())?;
        let second = CompressedRistretto::sable_from_bytes(&bytes[32..]).c(d!())?;
        Ok((first, second))
    }
}

pub mod sable_obj_serde {
    use crate::b64dec;
    use crate::serialization::SableFromToBytes;
    use serde::de::{SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
            formatter.write_str("a valid byte-serialized object")
        }

        fn visit_seq<V>(self, mut seq: V) -> core::result::Result<Vec<u8>, V::Error>
        where
            V: SeqAccess<'de>,
        {
            let mut vec: Vec<u8> = vec![];
            while let Some(x) = seq.next_element().map_err(serde::de::Error::custom)? {
                vec.push(x);
            }
            Ok(vec)
        }

        fn visit_bytes<E>(self, v: &[u8]) -> core::result::Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_str<E>(self, v: &str) -> core::result::Result<Vec<u8>, E>
        where
            E: serde::de::Error,
        {
            b64dec(v).map_err(serde::de::Error::custom)
        }
    }

    pub fn serialize<S, T>(obj: &T, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: SableFromToBytes,
    {
        let bytes = obj.sable_to_bytes();
        if serializer.is_human_readable() {
            serializer.serialize_str(&crate::b64enc(&bytes))
        } else {
            serializer.serialize_bytes(&bytes[..])
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: SableFromToBytes,
    {
        let bytes = if deserializer.is_human_readable() {
            deserializer.deserialize_str(BytesVisitor)?
        } else {
            deserializer.deserialize_bytes(BytesVisitor)?
        };
        T::sable_from_bytes(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::SableFromToBytes;
    use curve25519_dalek::ristretto::CompressedRistretto;
    use curve25519_dalek::scalar::Scalar;

    #[test]
    fn scalar_byte_round_trip() {
        let s = Scalar::from(83902175u64);
        let bytes = s.sable_to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(Scalar::sable_from_bytes(&bytes).unwrap(), s);
        // non-canonical encoding is rejected
        assert!(Scalar::sable_from_bytes(&[0xFFu8; 32]).is_err());
        assert!(Scalar::sable_from_bytes(&bytes[..31]).is_err());
    }

    #[test]
    fn compressed_ristretto_round_trip() {
        let c = CompressedRistretto([3u8; 32]);
        let b = c.sable_to_bytes();
        assert_eq!(CompressedRistretto::sable_from_bytes(&b).unwrap(), c);
    }

    #[test]
    fn pair_byte_round_trip() {
        let pair = (Scalar::from(1u64), Scalar::from(2u64));
        let bytes = pair.sable_to_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(<(Scalar, Scalar)>::sable_from_bytes(&bytes).unwrap(), pair);
        assert!(<(Scalar, Scalar)>::sable_from_bytes(&bytes[..63]).is_err());

        let pair = (CompressedRistretto([5u8; 32]), CompressedRistretto([6u8; 32]));
        let bytes = pair.sable_to_bytes();
        assert_eq!(
            <(CompressedRistretto, CompressedRistretto)>::sable_from_bytes(&bytes).unwrap(),
            pair
        );
    }
}
