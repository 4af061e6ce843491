/*++

Licensed under the Apache-2.0 license.

File Name:

   main.rs

Abstract:

    Main entry point of the device identity provisioning tool

--*/
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod confirm;
mod provision;
mod public_key;

use confirm::{ConsolePrompt, OperatorConfirmation, SkipConfirmation};

#[cfg(feature = "openssl")]
use uflake_identity_crypto::OsslCrypto as Crypto;
#[cfg(not(feature = "openssl"))]
use uflake_identity_crypto::RustCrypto as Crypto;

#[derive(Parser)]
#[command(
    name = "uflake-provision",
    version,
    about = "uFlake device identity provisioning",
    long_about = "Builds a device identity record, signs it with the offline manufacturer key \
                  and emits the C header that the provisioning firmware burns to eFuse."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a signed device identity header
    Provision(provision::ProvisionArgs),

    /// Export the manufacturer public key for the firmware
    PublicKey(public_key::PublicKeyArgs),
}

/// Entry point
fn main() {
    let _ = SimpleLogger::new().with_level(LevelFilter::Info).env().init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version requests are not failures
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let result = match &cli.cmd {
        Commands::Provision(args) => {
            let mut confirmation: Box<dyn OperatorConfirmation> = if args.yes {
                Box::new(SkipConfirmation)
            } else {
                Box::new(ConsolePrompt::stdio())
            };
            provision::run_cmd(args, confirmation.as_mut())
                .map(|_| ())
                .map_err(anyhow::Error::from)
        }
        Commands::PublicKey(args) => public_key::run_cmd(args),
    };

    result.unwrap_or_else(|e| {
        log::error!("{e:#}");
        std::process::exit(1);
    });
}
