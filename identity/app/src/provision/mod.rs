/*++

Licensed under the Apache-2.0 license.

File Name:

   mod.rs

Abstract:

    File contains implementation of the device provisioning command.

--*/

mod config;

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use uflake_identity_gen::{build_identity, parse_byte_field, IdentityGenerator};
use uflake_identity_serde::{render_identity_header, write_artifact};
use uflake_identity_types::*;

use crate::confirm::OperatorConfirmation;
use crate::Crypto;
use config::{load_station_config, StationConfig};

pub(crate) const DEFAULT_KEY_PATH: &str = "device_identity_private_key.pem";
pub(crate) const DEFAULT_OUTPUT_PATH: &str = "device_identity.h";
const DEFAULT_HW_VERSION: u32 = 1;
const DEFAULT_BOARD_REVISION: u32 = 1;

#[derive(Args, Debug, Default)]
pub(crate) struct ProvisionArgs {
    /// Device serial number (e.g. UFH-001234)
    #[arg(long)]
    pub serial: String,

    /// Hardware version [default: 1]
    #[arg(long = "hw-version", alias = "hwver", value_name = "U8")]
    pub hw_version: Option<u32>,

    /// Board revision [default: 1]
    #[arg(long = "board-revision", alias = "rev", value_name = "U8")]
    pub board_revision: Option<u32>,

    /// Device unique ID (32 hex characters read from eFuse)
    #[arg(long = "device-id", value_name = "HEX")]
    pub device_id: String,

    /// Manufacturer private key PEM file [default: device_identity_private_key.pem]
    #[arg(long, alias = "key-path", value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Output header file [default: device_identity.h]
    #[arg(long, alias = "output-path", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Manufacture date as a Unix timestamp [default: now]
    #[arg(long = "manufacture-date", value_name = "U32")]
    pub manufacture_date: Option<u32>,

    /// Station configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(long, alias = "skip-confirmation")]
    pub yes: bool,
}

/// How a provisioning run ended
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Artifact written to the path
    Written(PathBuf),

    /// Operator declined at the confirmation prompt
    Aborted,
}

/// Effective settings after merging command line, station config and defaults
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    key_path: PathBuf,
    output_path: PathBuf,
    hw_version: u8,
    board_revision: u8,
}

impl Settings {
    fn resolve(args: &ProvisionArgs) -> ProvisionResult<Self> {
        let config = match &args.config {
            Some(path) => load_station_config(path)?,
            None => StationConfig::default(),
        };

        Ok(Self {
            key_path: args
                .key
                .clone()
                .or(config.key_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_PATH)),
            output_path: args
                .output
                .clone()
                .or(config.output_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            hw_version: parse_byte_field(
                "hw-version",
                args.hw_version
                    .or(config.hw_version)
                    .unwrap_or(DEFAULT_HW_VERSION),
            )?,
            board_revision: parse_byte_field(
                "board-revision",
                args.board_revision
                    .or(config.board_revision)
                    .unwrap_or(DEFAULT_BOARD_REVISION),
            )?,
        })
    }
}

/// Run the command
pub(crate) fn run_cmd(
    args: &ProvisionArgs,
    confirmation: &mut dyn OperatorConfirmation,
) -> ProvisionResult<Outcome> {
    let settings = Settings::resolve(args)?;

    let identity = build_identity(
        &args.device_id,
        &args.serial,
        settings.hw_version,
        settings.board_revision,
        args.manufacture_date,
    )?;

    log::info!("Generating identity for device:");
    log::info!("  Serial Number:   {}", args.serial);
    log::info!("  Hardware Ver:    {}", identity.hw_version);
    log::info!("  Board Revision:  {}", identity.board_revision);
    log::info!("  Device ID:       {}", hex::encode(identity.device_id));
    log::info!("  Manufactured:    {}", identity.manufacture_date());

    let gen = IdentityGenerator::new(Crypto::default());

    // The key only lives for the duration of this block
    let record = {
        let priv_key = gen.load_priv_key(&settings.key_path)?;
        log::info!("Loaded private key from {}", settings.key_path.display());
        gen.sign(&identity, &priv_key)?
    };

    log::info!("  Identity Hash:   {}", hex::encode(record.digest));
    log::info!("Signature generated ({ECC256_SIGNATURE_BYTE_SIZE} bytes)");

    let header = render_identity_header(&record, Utc::now());
    log::debug!("Generated header:\n{header}");

    let confirmed = confirmation
        .confirm(&header)
        .map_err(|source| ProvisionError::Io {
            path: PathBuf::from("<console>"),
            source,
        })?;
    if !confirmed {
        log::info!("Aborted.");
        return Ok(Outcome::Aborted);
    }

    write_artifact(&settings.output_path, &header)?;

    log::info!(
        "Device identity written to: {}",
        settings.output_path.display()
    );
    log::info!("Next steps:");
    log::info!("  1. Flash this identity to device {}", args.serial);
    log::info!("  2. Run provisioning firmware to burn to eFuse");
    log::info!("  3. BACKUP the identity file for your records");
    log::info!("  4. Verify device authentication works");
    log::warn!("eFuse burns are PERMANENT!");

    Ok(Outcome::Written(settings.output_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use uflake_identity_fake_keys::{write_pem, MFG_KEY_SEC1_PEM};

    const DEVICE_ID_HEX: &str = "0123456789abcdef0123456789abcdef";

    struct ScriptedConfirmation {
        answer: bool,
        asked: Option<String>,
    }

    impl ScriptedConfirmation {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: None,
            }
        }
    }

    impl OperatorConfirmation for ScriptedConfirmation {
        fn confirm(&mut self, preview: &str) -> std::io::Result<bool> {
            self.asked = Some(preview.to_string());
            Ok(self.answer)
        }
    }

    fn args(dir: &Path) -> ProvisionArgs {
        ProvisionArgs {
            serial: "UFH-001234".into(),
            device_id: DEVICE_ID_HEX.into(),
            key: Some(write_pem(dir, "mfg.pem", MFG_KEY_SEC1_PEM).unwrap()),
            output: Some(dir.join("device_identity.h")),
            manufacture_date: Some(1_700_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_confirmed_run_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());
        let mut confirmation = ScriptedConfirmation::answering(true);

        let outcome = run_cmd(&args, &mut confirmation).unwrap();
        assert_eq!(outcome, Outcome::Written(dir.path().join("device_identity.h")));

        let header = std::fs::read_to_string(dir.path().join("device_identity.h")).unwrap();
        assert_eq!(confirmation.asked.as_deref(), Some(header.as_str()));
        assert!(header.contains(
            "// Identity SHA-256: 89295deae482830694af93f6689ec64e47a65379f968a08707f180d2a90af518"
        ));
        assert!(header.contains("    .manufacture_date = 1700000000,\n"));
    }

    #[test]
    fn test_declined_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());
        let mut confirmation = ScriptedConfirmation::answering(false);

        assert_eq!(
            run_cmd(&args, &mut confirmation).unwrap(),
            Outcome::Aborted
        );
        assert!(confirmation.asked.is_some());
        assert!(!dir.path().join("device_identity.h").exists());
    }

    #[test]
    fn test_validation_precedes_key_load() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProvisionArgs {
            device_id: "0123".into(),
            key: Some(dir.path().join("missing.pem")),
            ..args(dir.path())
        };
        let mut confirmation = ScriptedConfirmation::answering(true);

        assert!(matches!(
            run_cmd(&args, &mut confirmation),
            Err(ProvisionError::Validation(_))
        ));
        assert!(confirmation.asked.is_none());
    }

    #[test]
    fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProvisionArgs {
            key: Some(dir.path().join("missing.pem")),
            ..args(dir.path())
        };
        let mut confirmation = ScriptedConfirmation::answering(true);

        assert!(matches!(
            run_cmd(&args, &mut confirmation),
            Err(ProvisionError::KeyLoad { .. })
        ));
        assert!(confirmation.asked.is_none());
        assert!(!dir.path().join("device_identity.h").exists());
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProvisionArgs {
            output: Some(dir.path().join("missing").join("device_identity.h")),
            ..args(dir.path())
        };

        assert!(matches!(
            run_cmd(&args, &mut ScriptedConfirmation::answering(true)),
            Err(ProvisionError::Io { .. })
        ));
    }

    #[test]
    fn test_hw_version_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProvisionArgs {
            hw_version: Some(256),
            ..args(dir.path())
        };

        assert!(matches!(
            run_cmd(&args, &mut ScriptedConfirmation::answering(true)),
            Err(ProvisionError::Validation(_))
        ));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::resolve(&ProvisionArgs::default()).unwrap();
        assert_eq!(
            settings,
            Settings {
                key_path: PathBuf::from(DEFAULT_KEY_PATH),
                output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
                hw_version: 1,
                board_revision: 1,
            }
        );
    }

    #[test]
    fn test_settings_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("station.toml");
        std::fs::write(
            &config,
            "key_path = \"station.pem\"\noutput_path = \"station.h\"\nhw_version = 4\nboard_revision = 5\n",
        )
        .unwrap();

        let settings = Settings::resolve(&ProvisionArgs {
            config: Some(config.clone()),
            output: Some(PathBuf::from("cli.h")),
            board_revision: Some(7),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                key_path: dir.path().join("station.pem"),
                output_path: PathBuf::from("cli.h"),
                hw_version: 4,
                board_revision: 7,
            }
        );
    }
}
