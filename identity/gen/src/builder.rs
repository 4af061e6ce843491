/*++

Licensed under the Apache-2.0 license.

File Name:

   builder.rs

Abstract:

    Construction and validation of the device identity record.

--*/

use uflake_identity_types::*;

/// Build a device identity from operator supplied values
///
/// # Arguments
///
/// * `device_id_hex` - Unique device ID, exactly 32 hex characters
/// * `serial` - Serial number; zero padded or truncated to 32 bytes
/// * `hw_version` - Hardware version
/// * `board_revision` - Board revision
/// * `timestamp` - Manufacture date; the current time when `None`
pub fn build_identity(
    device_id_hex: &str,
    serial: &str,
    hw_version: u8,
    board_revision: u8,
    timestamp: Option<u32>,
) -> ProvisionResult<DeviceIdentity> {
    let device_id = parse_device_id(device_id_hex)?;
    let serial_number = pad_serial_number(serial);
    let manufacture_date = match timestamp {
        Some(timestamp) => timestamp,
        None => current_timestamp()?,
    };

    Ok(DeviceIdentity::new(
        device_id,
        serial_number,
        hw_version,
        board_revision,
        manufacture_date,
    ))
}

/// Decode the 16 byte device ID from its hex form
pub fn parse_device_id(device_id_hex: &str) -> ProvisionResult<DeviceId> {
    let len = device_id_hex.chars().count();
    if len != DEVICE_ID_HEX_LEN {
        return Err(ProvisionError::validation(format!(
            "Device ID must be {DEVICE_ID_HEX_LEN} hex characters (got {len})"
        )));
    }

    let mut device_id = DeviceId::default();
    hex::decode_to_slice(device_id_hex, &mut device_id)
        .map_err(|e| ProvisionError::validation(format!("Device ID is not valid hex: {e}")))?;
    Ok(device_id)
}

/// Fit the serial number into its fixed width field.
///
/// Shorter serials are right-padded with zero bytes. Longer serials keep their
/// first 32 bytes; the rest is dropped without an error.
pub fn pad_serial_number(serial: &str) -> SerialNumber {
    let bytes = serial.as_bytes();
    if bytes.len() > SERIAL_NUMBER_BYTE_SIZE {
        log::warn!(
            "Serial number {serial:?} is {} bytes, truncating to {SERIAL_NUMBER_BYTE_SIZE}",
            bytes.len()
        );
    }

    let len = bytes.len().min(SERIAL_NUMBER_BYTE_SIZE);
    let mut result = SerialNumber::default();
    result[..len].copy_from_slice(&bytes[..len]);
    result
}

/// Narrow a numeric option to a single byte field
pub fn parse_byte_field(name: &str, value: u32) -> ProvisionResult<u8> {
    u8::try_from(value).map_err(|_| {
        ProvisionError::validation(format!("{name} must be in the range 0-255 (got {value})"))
    })
}

fn current_timestamp() -> ProvisionResult<u32> {
    let now = chrono::Utc::now().timestamp();
    u32::try_from(now).map_err(|_| {
        ProvisionError::validation(format!(
            "Current time {now} does not fit in a 32-bit manufacture date"
        ))
    })
}
