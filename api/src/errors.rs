use core::fmt;
use std::error;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SableError {
    DeserializationError,
    SerializationError,
    ParameterError,
    SignatureError,
    InconsistentStructureError,
    RecordMismatch,
    ArithmeticOverflow,
    DivisionByZero,
    Unbalanced,
    AmbiguousChangeOwner,
    NotBalanced,
    UnknownSigner,
    InvalidInputIndex,
    IncompleteSignatures,
    MalformedProof,
}

impl fmt::Display for SableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SableError::DeserializationError => "Could not deserialize object",
            SableError::SerializationError => "Could not serialize object",
            SableError::ParameterError => "Unexpected parameter for method or function",
            SableError::SignatureError => "Signature verification failed",
            SableError::InconsistentStructureError => "Sable structure is inconsistent",
            SableError::RecordMismatch => {
                "Record does not match the provided keypair or owner memo"
            }
            SableError::ArithmeticOverflow => "Amount arithmetic overflowed",
            SableError::DivisionByZero => "Fee ratio denominator is zero",
            SableError::Unbalanced => "Requested outputs exceed the available inputs",
            SableError::AmbiguousChangeOwner => {
                "Change owner cannot be inferred from inputs with different owners"
            }
            SableError::NotBalanced => {
                "Transfer body was modified after balancing or was never balanced"
            }
            SableError::UnknownSigner => "Signing key does not own any input of this transfer",
            SableError::InvalidInputIndex => "Input index out of bounds for cosignature",
            SableError::IncompleteSignatures => {
                "Missing owner signatures for one or more transfer inputs"
            }
            SableError::MalformedProof => "Authenticated proof is structurally malformed",
        })
    }
}

impl error::Error for SableError {}
