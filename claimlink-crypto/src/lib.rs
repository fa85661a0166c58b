pub mod address;
pub mod signatures;

pub use address::derive_address;
pub use signatures::{
    address_of, generate_keypair, keypair_from_seed, sign, verify_signature, SigningKey, VerifyingKey,
};
