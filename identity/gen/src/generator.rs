/*++

Licensed under the Apache-2.0 license.

File Name:

   generator.rs

Abstract:

    Device identity signer

--*/
use std::path::Path;

use anyhow::anyhow;
use uflake_identity_types::*;

use crate::IdentityGeneratorCrypto;

/// Identity generator
pub struct IdentityGenerator<Crypto: IdentityGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: IdentityGeneratorCrypto> IdentityGenerator<Crypto> {
    /// Create an instance `IdentityGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    /// Load the manufacturer private key
    pub fn load_priv_key(&self, path: &Path) -> ProvisionResult<IdentityEccPrivKey> {
        Crypto::ecc_priv_key_from_pem(path).map_err(|cause| ProvisionError::KeyLoad {
            path: path.to_path_buf(),
            cause,
        })
    }

    /// Public key matching the manufacturer private key
    pub fn pub_key(&self, priv_key: &IdentityEccPrivKey) -> anyhow::Result<IdentityEccPubKey> {
        self.crypto.ecc_pub_key_from_priv(priv_key)
    }

    /// SHA-256 digest of the canonical identity encoding
    pub fn digest(&self, identity: &DeviceIdentity) -> ProvisionResult<IdentityDigest> {
        self.crypto
            .sha256_digest(&identity.encode())
            .map_err(ProvisionError::Signing)
    }

    /// Sign the identity
    ///
    /// # Arguments
    ///
    /// * `identity` - Identity to sign
    /// * `priv_key` - Manufacturer private key
    ///
    /// # Returns
    ///
    /// * `ProvisioningRecord` - Identity, digest and signature
    pub fn sign(
        &self,
        identity: &DeviceIdentity,
        priv_key: &IdentityEccPrivKey,
    ) -> ProvisionResult<ProvisioningRecord> {
        let digest = self.digest(identity)?;

        let signature = self
            .crypto
            .ecdsa256_sign(&digest, priv_key)
            .map_err(ProvisionError::Signing)?;

        // A signature the firmware would reject must never reach the artifact.
        let pub_key = self.pub_key(priv_key).map_err(ProvisionError::Signing)?;
        let verified = self
            .crypto
            .ecdsa256_verify(&digest, &pub_key, &signature)
            .map_err(ProvisionError::Signing)?;
        if !verified {
            return Err(ProvisionError::Signing(anyhow!(
                "Signature failed verification against the signing key"
            )));
        }

        Ok(ProvisioningRecord {
            identity: *identity,
            digest,
            signature,
        })
    }

    /// Check a record against a public key the way the firmware does:
    /// recompute the digest from the identity fields, then verify the signature.
    pub fn verify(
        &self,
        record: &ProvisioningRecord,
        pub_key: &IdentityEccPubKey,
    ) -> anyhow::Result<bool> {
        let digest = self.crypto.sha256_digest(&record.identity.encode())?;
        if digest != record.digest {
            return Ok(false);
        }
        self.crypto
            .ecdsa256_verify(&digest, pub_key, &record.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_identity;
    use anyhow::bail;

    /// Deterministic stand-in: the "digest" is the first 32 canonical bytes,
    /// the "signature" echoes the digest and the key.
    #[derive(Default)]
    struct TestCrypto {
        reject_signatures: bool,
    }

    impl IdentityGeneratorCrypto for TestCrypto {
        fn sha256_digest(&self, data: &[u8]) -> anyhow::Result<IdentityDigest> {
            Ok(data[..SHA256_DIGEST_BYTE_SIZE].try_into()?)
        }

        fn ecdsa256_sign(
            &self,
            digest: &IdentityDigest,
            priv_key: &IdentityEccPrivKey,
        ) -> anyhow::Result<IdentityEccSignature> {
            Ok(IdentityEccSignature {
                r: *digest,
                s: *priv_key.as_bytes(),
            })
        }

        fn ecdsa256_verify(
            &self,
            digest: &IdentityDigest,
            pub_key: &IdentityEccPubKey,
            sig: &IdentityEccSignature,
        ) -> anyhow::Result<bool> {
            Ok(!self.reject_signatures && sig.r == *digest && sig.s == pub_key.x)
        }

        fn ecc_pub_key_from_priv(
            &self,
            priv_key: &IdentityEccPrivKey,
        ) -> anyhow::Result<IdentityEccPubKey> {
            Ok(IdentityEccPubKey {
                x: *priv_key.as_bytes(),
                y: [0; ECC256_SCALAR_BYTE_SIZE],
            })
        }

        fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPrivKey> {
            bail!("no key at {}", path.display())
        }

        fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPubKey> {
            bail!("no key at {}", path.display())
        }
    }

    fn identity() -> DeviceIdentity {
        build_identity(
            "0123456789abcdef0123456789abcdef",
            "UFH-001234",
            1,
            1,
            Some(1_700_000_000),
        )
        .unwrap()
    }

    #[test]
    fn test_sign() {
        let gen = IdentityGenerator::new(TestCrypto::default());
        let priv_key = IdentityEccPrivKey::from_bytes([0x5a; 32]);
        let record = gen.sign(&identity(), &priv_key).unwrap();

        assert_eq!(record.identity, identity());
        assert_eq!(record.digest, identity().encode()[..32]);
        assert_eq!(record.signature.r, record.digest);

        let pub_key = gen.pub_key(&priv_key).unwrap();
        assert!(gen.verify(&record, &pub_key).unwrap());
    }

    #[test]
    fn test_verify_detects_modified_identity() {
        let gen = IdentityGenerator::new(TestCrypto::default());
        let priv_key = IdentityEccPrivKey::from_bytes([0x5a; 32]);
        let pub_key = gen.pub_key(&priv_key).unwrap();
        let mut record = gen.sign(&identity(), &priv_key).unwrap();

        record.identity.device_id[0] ^= 1;
        assert!(!gen.verify(&record, &pub_key).unwrap());
    }

    #[test]
    fn test_sign_self_check() {
        let gen = IdentityGenerator::new(TestCrypto {
            reject_signatures: true,
        });
        let priv_key = IdentityEccPrivKey::from_bytes([0x5a; 32]);
        match gen.sign(&identity(), &priv_key) {
            Err(ProvisionError::Signing(e)) => assert_eq!(
                e.to_string(),
                "Signature failed verification against the signing key"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_priv_key_error() {
        let gen = IdentityGenerator::new(TestCrypto::default());
        match gen.load_priv_key(Path::new("missing.pem")) {
            Err(ProvisionError::KeyLoad { path, cause }) => {
                assert_eq!(path, Path::new("missing.pem"));
                assert_eq!(cause.to_string(), "no key at missing.pem");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
