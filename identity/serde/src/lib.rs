/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    Renders signed device identities as C headers for the firmware build
    and writes them to disk.

--*/
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use chrono::{DateTime, Utc};
use uflake_identity_types::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const PUB_KEY_BYTES_PER_ROW: usize = 8;

/// rw-r--r--
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// Format bytes as comma separated C hex literals
fn c_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:02x}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serial number as it appears in the audit comment
fn comment_safe(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

/// Render the provisioning artifact
///
/// # Arguments
///
/// * `record` - Signed identity
/// * `generated_at` - Time recorded in the audit header
///
/// # Returns
///
/// * `String` - C header defining `DEVICE_IDENTITY` as an `hw_identity_t`
pub fn render_identity_header(record: &ProvisioningRecord, generated_at: DateTime<Utc>) -> String {
    let identity = &record.identity;
    format!(
        "// AUTO-GENERATED - DO NOT EDIT
// Device: {serial}
// Generated: {generated}
// Identity SHA-256: {digest}

#ifndef DEVICE_IDENTITY_H
#define DEVICE_IDENTITY_H

#include \"hw_auth.h\"

const hw_identity_t DEVICE_IDENTITY = {{
    .device_id = {{{device_id}}},
    .serial_number = {{{serial_number}}},
    .hw_version = {hw_version},
    .board_revision = {board_revision},
    .manufacture_date = {manufacture_date},
    .signature = {{{signature}}}
}};

#endif // DEVICE_IDENTITY_H
",
        serial = comment_safe(identity.serial_trimmed()),
        generated = generated_at.format(TIMESTAMP_FORMAT),
        digest = hex::encode(record.digest),
        device_id = c_bytes(&identity.device_id),
        serial_number = c_bytes(&identity.serial_number),
        hw_version = identity.hw_version,
        board_revision = identity.board_revision,
        manufacture_date = identity.manufacture_date(),
        signature = c_bytes(&[record.signature.r, record.signature.s].concat()),
    )
}

/// Render the manufacturer public key in the form the firmware embeds it
pub fn render_pub_key_header(pub_key: &IdentityEccPubKey, generated_at: DateTime<Utc>) -> String {
    let rows = pub_key
        .to_sec1_uncompressed()
        .chunks(PUB_KEY_BYTES_PER_ROW)
        .map(|row| format!("    {}", c_bytes(row)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "// AUTO-GENERATED - DO NOT EDIT
// Manufacturer public key (P-256, uncompressed SEC1)
// Generated: {generated}

static const uint8_t DEVICE_PUBLIC_KEY[] = {{
{rows}}};
",
        generated = generated_at.format(TIMESTAMP_FORMAT),
    )
}

/// Write an artifact to `path`.
///
/// The contents go to a temporary file next to `path` which is then renamed
/// over it, so a failed write never leaves a truncated artifact behind. An
/// existing read-only artifact is left alone and reported as an error.
pub fn write_artifact(path: &Path, contents: &str) -> ProvisionResult<()> {
    let io_err = |source: io::Error| ProvisionError::Io {
        path: path.to_path_buf(),
        source,
    };

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.permissions().readonly() => {
            return Err(io_err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "destination is read-only",
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    #[cfg(unix)]
    file.as_file()
        .set_permissions(std::fs::Permissions::from_mode(ARTIFACT_MODE))
        .map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
