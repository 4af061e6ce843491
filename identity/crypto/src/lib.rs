/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains crypto utilities needed to sign device identities.

--*/

#[cfg(feature = "openssl")]
mod openssl;
#[cfg(feature = "rustcrypto")]
mod rustcrypto;

#[cfg(feature = "openssl")]
pub use crate::openssl::OsslCrypto;
#[cfg(feature = "rustcrypto")]
pub use crate::rustcrypto::RustCrypto;

use std::path::Path;

use anyhow::Context;

pub(crate) fn read_pem(path: &Path, kind: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path)
        .with_context(|| format!("Failed to read {kind} key PEM file {}", path.display()))
}
