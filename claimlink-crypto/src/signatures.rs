pub use ed25519_dalek::{SigningKey, VerifyingKey};
use anyhow::{anyhow, bail, Result};
use ed25519_dalek::{Signature, Signer, Verifier};
use rand::rngs::OsRng;

pub fn generate_keypair() -> SigningKey {
    let mut csprng = OsRng;
    SigningKey::generate(&mut csprng)
}

/// Deterministic key for fixtures and devnet accounts.
pub fn keypair_from_seed(seed: &[u8]) -> SigningKey {
    SigningKey::from_bytes(blake3::hash(seed).as_bytes())
}

pub fn address_of(key: &SigningKey) -> [u8; 32] {
    key.verifying_key().to_bytes()
}

pub fn sign(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    let sig: Signature = key.sign(message);
    sig.to_bytes().to_vec()
}

pub fn verify_signature(pubkey_bytes: &[u8; 32], message: &[u8], signature_bytes: &[u8]) -> Result<()> {
    let pubkey = VerifyingKey::from_bytes(pubkey_bytes).map_err(|_| anyhow!("Invalid public key"))?;

    let sig_bytes: &[u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| anyhow!("Invalid signature length"))?;
    let signature = Signature::from_bytes(sig_bytes);

    if pubkey.verify(message, &signature).is_err() {
        bail!("Signature verification failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let kp = generate_keypair();
        let sig = sign(&kp, b"claim");
        assert!(verify_signature(&address_of(&kp), b"claim", &sig).is_ok());
        assert!(verify_signature(&address_of(&kp), b"other", &sig).is_err());
    }

    #[test]
    fn rejects_truncated_signature() {
        let kp = keypair_from_seed(b"alice");
        let sig = sign(&kp, b"claim");
        assert!(verify_signature(&address_of(&kp), b"claim", &sig[..63]).is_err());
    }

    #[test]
    fn seeded_keys_are_stable() {
        assert_eq!(
            address_of(&keypair_from_seed(b"bob")),
            address_of(&keypair_from_seed(b"bob"))
        );
    }
}
