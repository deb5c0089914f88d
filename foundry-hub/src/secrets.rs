//! Sealed-box secret provisioning.
//!
//! Encrypts the secret value under the container's advertised public key
//! (anonymous-sender, recipient-only-decryptable) and upserts it. Failures
//! always surface to the caller; whether they are fatal is the pipeline's
//! policy, not this module's.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;

use crate::api::ContainerApi;
use crate::error::HubError;

/// Provisions one secret into one container.
pub struct SecretProvisioner<'a> {
    api: &'a dyn ContainerApi,
}

impl<'a> SecretProvisioner<'a> {
    pub fn new(api: &'a dyn ContainerApi) -> Self {
        Self { api }
    }

    /// Fetch the container's public key, seal `secret_value` under it, and
    /// upsert the secret naming the key id.
    pub fn provision(
        &self,
        container: &str,
        secret_name: &str,
        secret_value: &str,
    ) -> Result<(), HubError> {
        let public_key = self.api.get_public_key(container)?;
        let sealed = seal_for_key(&public_key.key, secret_value.as_bytes())?;

        tracing::info!("provisioning secret {secret_name} into {container}");
        self.api
            .put_secret(container, secret_name, &sealed, &public_key.key_id)
    }
}

/// Seal `plaintext` for the base64-encoded 32-byte public key; returns the
/// base64 ciphertext.
pub fn seal_for_key(public_key_b64: &str, plaintext: &[u8]) -> Result<String, HubError> {
    let key_bytes = BASE64
        .decode(public_key_b64)
        .map_err(|e| HubError::Encrypt(format!("public key is not valid base64: {e}")))?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|v: Vec<u8>| HubError::Encrypt(format!("public key must be 32 bytes, got {}", v.len())))?;

    let public_key = crypto_box::PublicKey::from(key_bytes);
    let sealed = public_key
        .seal(&mut OsRng, plaintext)
        .map_err(|e| HubError::Encrypt(format!("sealed-box encryption failed: {e}")))?;
    Ok(BASE64.encode(sealed))
}

#[cfg(test)]
mod tests {
    use crypto_box::SecretKey;

    use super::*;

    #[test]
    fn sealed_value_opens_with_recipient_secret_key() {
        let secret_key = SecretKey::generate(&mut OsRng);
        let public_b64 = BASE64.encode(secret_key.public_key().as_bytes());

        let sealed_b64 = seal_for_key(&public_b64, b"super secret").expect("seal");
        let sealed = BASE64.decode(sealed_b64).expect("base64");
        let opened = secret_key.unseal(&sealed).expect("open");
        assert_eq!(opened, b"super secret");
    }

    #[test]
    fn sealing_twice_produces_distinct_ciphertexts() {
        let secret_key = SecretKey::generate(&mut OsRng);
        let public_b64 = BASE64.encode(secret_key.public_key().as_bytes());
        let a = seal_for_key(&public_b64, b"v").expect("seal");
        let b = seal_for_key(&public_b64, b"v").expect("seal");
        assert_ne!(a, b, "sealed boxes embed an ephemeral key");
    }

    #[test]
    fn malformed_public_key_is_rejected() {
        let err = seal_for_key("@@not-base64@@", b"v").unwrap_err();
        assert!(matches!(err, HubError::Encrypt(_)), "got: {err}");

        let short = BASE64.encode([0u8; 16]);
        let err = seal_for_key(&short, b"v").unwrap_err();
        assert!(matches!(err, HubError::Encrypt(_)), "got: {err}");
    }
}
