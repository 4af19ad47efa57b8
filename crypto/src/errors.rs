use std::{error, fmt};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CryptoError {
    EncryptionError,
    DecryptionError,
    DecompressElementError,
    DeserializationError,
    SerializationError,
    ParameterError,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            CryptoError::EncryptionError => "Ciphertext could not be computed",
            CryptoError::DecryptionError => "Ciphertext failed authentication verification",
            CryptoError::DecompressElementError => "Could not decompress group Element",
            CryptoError::DeserializationError => "Could not deserialize object",
            CryptoError::SerializationError => "Could not serialize object",
            CryptoError::ParameterError => "Unexpected parameter for method or function",
        })
    }
}

impl error::Error for CryptoError {}
