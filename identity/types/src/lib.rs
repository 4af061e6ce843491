/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the device identity record.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
mod error;

#[cfg(feature = "std")]
pub use error::{ProvisionError, ProvisionResult};

use core::fmt;

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const DEVICE_ID_BYTE_SIZE: usize = 16;
pub const DEVICE_ID_HEX_LEN: usize = DEVICE_ID_BYTE_SIZE * 2;
pub const SERIAL_NUMBER_BYTE_SIZE: usize = 32;
pub const IDENTITY_BYTE_SIZE: usize = 54;
pub const SHA256_DIGEST_BYTE_SIZE: usize = 32;
pub const ECC256_SCALAR_BYTE_SIZE: usize = 32;
pub const ECC256_SIGNATURE_BYTE_SIZE: usize = ECC256_SCALAR_BYTE_SIZE * 2;
pub const ECC256_UNCOMPRESSED_PUB_KEY_BYTE_SIZE: usize = 1 + ECC256_SCALAR_BYTE_SIZE * 2;

/// SEC1 tag for an uncompressed curve point
pub const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

pub type DeviceId = [u8; DEVICE_ID_BYTE_SIZE];
pub type SerialNumber = [u8; SERIAL_NUMBER_BYTE_SIZE];
pub type IdentityDigest = [u8; SHA256_DIGEST_BYTE_SIZE];
pub type IdentityScalar = [u8; ECC256_SCALAR_BYTE_SIZE];

/// Device Identity
///
/// The in-memory layout of this structure is the canonical encoding that gets
/// hashed and signed. The verifying firmware rebuilds the same 54 bytes field
/// by field, so the order, the widths and the little-endian date are fixed.
#[repr(C)]
#[derive(
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
    Unaligned,
    Default,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
)]
pub struct DeviceIdentity {
    /// Unique hardware identifier
    pub device_id: DeviceId,

    /// Serial number, right-padded with zero bytes
    pub serial_number: SerialNumber,

    /// Hardware version
    pub hw_version: u8,

    /// PCB revision
    pub board_revision: u8,

    /// Unix timestamp
    pub manufacture_date: U32,
}

const _: () = assert!(core::mem::size_of::<DeviceIdentity>() == IDENTITY_BYTE_SIZE);

impl DeviceIdentity {
    /// Create an instance of `DeviceIdentity` from already sized fields
    pub fn new(
        device_id: DeviceId,
        serial_number: SerialNumber,
        hw_version: u8,
        board_revision: u8,
        manufacture_date: u32,
    ) -> Self {
        Self {
            device_id,
            serial_number,
            hw_version,
            board_revision,
            manufacture_date: U32::new(manufacture_date),
        }
    }

    /// Manufacture date as a Unix timestamp
    pub fn manufacture_date(&self) -> u32 {
        self.manufacture_date.get()
    }

    /// Canonical encoding of the identity
    pub fn encode(&self) -> [u8; IDENTITY_BYTE_SIZE] {
        let mut result = [0u8; IDENTITY_BYTE_SIZE];
        result.copy_from_slice(self.as_bytes());
        result
    }

    /// Parse a canonical encoding. Returns `None` unless `bytes` is exactly
    /// `IDENTITY_BYTE_SIZE` long.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        Self::read_from_bytes(bytes).ok()
    }

    /// Serial number bytes without the trailing zero padding
    pub fn serial_trimmed(&self) -> &[u8] {
        let len = self
            .serial_number
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        &self.serial_number[..len]
    }
}

/// ECDSA P-256 signature in the raw `r || s` form read by the firmware
#[repr(C)]
#[derive(
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
    Unaligned,
    Default,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
)]
pub struct IdentityEccSignature {
    /// Random point
    pub r: IdentityScalar,

    /// Proof
    pub s: IdentityScalar,
}

/// ECC P-256 public key
#[repr(C)]
#[derive(
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
    Unaligned,
    Default,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
)]
pub struct IdentityEccPubKey {
    /// X Coordinate
    pub x: IdentityScalar,

    /// Y Coordinate
    pub y: IdentityScalar,
}

impl IdentityEccPubKey {
    /// Uncompressed SEC1 encoding (`0x04 || X || Y`)
    pub fn to_sec1_uncompressed(&self) -> [u8; ECC256_UNCOMPRESSED_PUB_KEY_BYTE_SIZE] {
        let mut result = [0u8; ECC256_UNCOMPRESSED_PUB_KEY_BYTE_SIZE];
        result[0] = SEC1_UNCOMPRESSED_TAG;
        result[1..][..ECC256_SCALAR_BYTE_SIZE].copy_from_slice(&self.x);
        result[1 + ECC256_SCALAR_BYTE_SIZE..].copy_from_slice(&self.y);
        result
    }
}

/// ECC P-256 private scalar, wiped when dropped
#[derive(Zeroize, ZeroizeOnDrop, Default)]
pub struct IdentityEccPrivKey(IdentityScalar);

impl IdentityEccPrivKey {
    pub fn from_bytes(bytes: IdentityScalar) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &IdentityScalar {
        &self.0
    }
}

impl fmt::Debug for IdentityEccPrivKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityEccPrivKey(..)")
    }
}

/// Signed identity handed to the artifact emitter
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ProvisioningRecord {
    /// Identity that was signed
    pub identity: DeviceIdentity,

    /// SHA-256 digest of the canonical encoding
    pub digest: IdentityDigest,

    /// Signature over `digest`
    pub signature: IdentityEccSignature,
}
