/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains the crypto abstraction and entry points of the device
    identity generator.

--*/

mod builder;
mod generator;

pub use builder::{build_identity, pad_serial_number, parse_byte_field, parse_device_id};
pub use generator::IdentityGenerator;

use std::path::Path;

use uflake_identity_types::*;

/// Identity Generator Crypto Trait
pub trait IdentityGeneratorCrypto {
    /// Calculate SHA-256 digest
    fn sha256_digest(&self, data: &[u8]) -> anyhow::Result<IdentityDigest>;

    /// Calculate ECDSA P-256 signature over a precomputed digest
    fn ecdsa256_sign(
        &self,
        digest: &IdentityDigest,
        priv_key: &IdentityEccPrivKey,
    ) -> anyhow::Result<IdentityEccSignature>;

    /// Verify an ECDSA P-256 signature over a precomputed digest
    fn ecdsa256_verify(
        &self,
        digest: &IdentityDigest,
        pub_key: &IdentityEccPubKey,
        sig: &IdentityEccSignature,
    ) -> anyhow::Result<bool>;

    /// Derive the public key matching `priv_key`
    fn ecc_pub_key_from_priv(&self, priv_key: &IdentityEccPrivKey)
        -> anyhow::Result<IdentityEccPubKey>;

    /// Read P-256 Private Key from PEM file
    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPrivKey>;

    /// Read P-256 Public Key from PEM file
    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPubKey>;
}
