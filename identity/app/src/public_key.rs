// Licensed under the Apache-2.0 license

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use uflake_identity_gen::IdentityGenerator;
use uflake_identity_serde::{render_pub_key_header, write_artifact};

use crate::provision::DEFAULT_KEY_PATH;
use crate::Crypto;

#[derive(Args, Debug)]
pub(crate) struct PublicKeyArgs {
    /// Manufacturer private key PEM file
    #[arg(long, alias = "key-path", value_name = "FILE", default_value = DEFAULT_KEY_PATH)]
    pub key: PathBuf,

    /// Write the header here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Print or write the `DEVICE_PUBLIC_KEY` array matching the private key
pub(crate) fn run_cmd(args: &PublicKeyArgs) -> anyhow::Result<()> {
    let gen = IdentityGenerator::new(Crypto::default());

    let pub_key = {
        let priv_key = gen.load_priv_key(&args.key)?;
        gen.pub_key(&priv_key)
            .context("Failed to derive public key")?
    };

    let header = render_pub_key_header(&pub_key, Utc::now());
    match &args.output {
        Some(path) => {
            write_artifact(path, &header)?;
            log::info!("Public key written to: {}", path.display());
        }
        None => print!("{header}"),
    }

    Ok(())
}
