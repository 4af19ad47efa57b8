pub mod hybrid_encryption;
pub mod pedersen_comm;
