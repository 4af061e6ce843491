/*++

Licensed under the Apache-2.0 license.

File Name:

   openssl.rs

Abstract:

    OpenSSL backend for device identity signing.

--*/

use std::path::Path;

use anyhow::bail;

use uflake_identity_gen::IdentityGeneratorCrypto;
use uflake_identity_types::*;

use openssl::{
    bn::{BigNum, BigNumContext},
    ec::{EcGroup, EcKey, EcKeyRef, EcPoint, EcPointRef},
    ecdsa::EcdsaSig,
    nid::Nid,
    pkey::{HasParams, HasPublic, PKey},
    sha::sha256,
};

use crate::read_pem;

#[derive(Default)]
pub struct OsslCrypto {}

fn p256_group() -> anyhow::Result<EcGroup> {
    Ok(EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?)
}

fn check_curve<T: HasParams>(key: &EcKeyRef<T>) -> anyhow::Result<()> {
    if key.group().curve_name() != Some(Nid::X9_62_PRIME256V1) {
        bail!("Key is not on the P-256 curve");
    }
    Ok(())
}

fn to_identity_pub_key(group: &EcGroup, point: &EcPointRef) -> anyhow::Result<IdentityEccPubKey> {
    let mut ctx = BigNumContext::new()?;
    let mut x = BigNum::new()?;
    let mut y = BigNum::new()?;
    point.affine_coordinates(group, &mut x, &mut y, &mut ctx)?;

    let mut result = IdentityEccPubKey::default();
    result
        .x
        .copy_from_slice(&x.to_vec_padded(ECC256_SCALAR_BYTE_SIZE as i32)?);
    result
        .y
        .copy_from_slice(&y.to_vec_padded(ECC256_SCALAR_BYTE_SIZE as i32)?);
    Ok(result)
}

fn pub_key_from_ec_key<T: HasPublic>(key: &EcKeyRef<T>) -> anyhow::Result<IdentityEccPubKey> {
    check_curve(key)?;
    to_identity_pub_key(&p256_group()?, key.public_key())
}

impl IdentityGeneratorCrypto for OsslCrypto {
    fn sha256_digest(&self, data: &[u8]) -> anyhow::Result<IdentityDigest> {
        Ok(sha256(data))
    }

    fn ecdsa256_sign(
        &self,
        digest: &IdentityDigest,
        priv_key: &IdentityEccPrivKey,
    ) -> anyhow::Result<IdentityEccSignature> {
        let group = p256_group()?;
        let mut ctx = BigNumContext::new()?;

        let priv_key = BigNum::from_slice(priv_key.as_bytes())?;
        let mut pub_key = EcPoint::new(&group)?;
        pub_key.mul_generator2(&group, &priv_key, &mut ctx)?;

        let ec_key = EcKey::from_private_components(&group, &priv_key, &pub_key)?;
        let sig = EcdsaSig::sign(digest, &ec_key)?;

        let mut result = IdentityEccSignature::default();
        result
            .r
            .copy_from_slice(&sig.r().to_vec_padded(ECC256_SCALAR_BYTE_SIZE as i32)?);
        result
            .s
            .copy_from_slice(&sig.s().to_vec_padded(ECC256_SCALAR_BYTE_SIZE as i32)?);
        Ok(result)
    }

    fn ecdsa256_verify(
        &self,
        digest: &IdentityDigest,
        pub_key: &IdentityEccPubKey,
        sig: &IdentityEccSignature,
    ) -> anyhow::Result<bool> {
        let group = p256_group()?;
        let x = BigNum::from_slice(&pub_key.x)?;
        let y = BigNum::from_slice(&pub_key.y)?;
        let ec_key = EcKey::from_public_key_affine_coordinates(&group, &x, &y)?;

        let r = BigNum::from_slice(&sig.r)?;
        let s = BigNum::from_slice(&sig.s)?;
        let sig = EcdsaSig::from_private_components(r, s)?;

        // OpenSSL reports malformed signatures as errors; treat them as a mismatch
        Ok(sig.verify(digest, &ec_key).unwrap_or(false))
    }

    fn ecc_pub_key_from_priv(
        &self,
        priv_key: &IdentityEccPrivKey,
    ) -> anyhow::Result<IdentityEccPubKey> {
        let group = p256_group()?;
        let mut ctx = BigNumContext::new()?;

        let priv_key = BigNum::from_slice(priv_key.as_bytes())?;
        let mut pub_key = EcPoint::new(&group)?;
        pub_key.mul_generator2(&group, &priv_key, &mut ctx)?;

        to_identity_pub_key(&group, &pub_key)
    }

    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPrivKey> {
        let key_bytes = read_pem(path, "private")?;

        // Accepts both SEC1 and PKCS#8 encodings
        let key = PKey::private_key_from_pem(&key_bytes)?.ec_key()?;
        check_curve(&key)?;

        let scalar = key
            .private_key()
            .to_vec_padded(ECC256_SCALAR_BYTE_SIZE as i32)?;
        Ok(IdentityEccPrivKey::from_bytes(scalar.as_slice().try_into()?))
    }

    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<IdentityEccPubKey> {
        let key_bytes = read_pem(path, "public")?;
        let key = EcKey::public_key_from_pem(&key_bytes)?;
        pub_key_from_ec_key(&key)
    }
}
