//! saltedecb CLI - passphrase-based file encryption
//!
//! Encrypts and decrypts files in the OpenSSL "Salted__" format using
//! PBKDF2-HMAC-SHA256 key derivation and AES-128-ECB.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use saltedecb::file_ops;
use saltedecb::kdf::DEFAULT_ITERATIONS;
use saltedecb::passphrase::{
    ConstantPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};
use saltedecb::{CipherBackend, ErrorCategory, FileCodec, Mode};

#[derive(Parser)]
#[command(name = "saltedecb")]
#[command(version)]
#[command(about = "Passphrase-based file encryption (OpenSSL salted AES-128-ECB).", long_about = None)]
struct Cli {
    /// Path to the file to read
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Path to the file to write
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Passphrase; prompted for on the terminal when neither this nor
    /// --passphrase-stdin is given
    #[arg(
        short,
        long,
        env = "SALTEDECB_PASSPHRASE",
        hide_env_values = true,
        conflicts_with = "passphrase_stdin"
    )]
    passphrase: Option<String>,

    /// Read passphrase from stdin instead of from terminal
    #[arg(long)]
    passphrase_stdin: bool,

    /// Decrypt the input instead of encrypting it
    #[arg(short, long)]
    decrypt: bool,

    /// Block cipher implementation
    #[arg(short, long, value_enum, default_value_t = CipherBackend::Native)]
    cipher: CipherBackend,

    /// PBKDF2 iteration count
    #[arg(long = "iter", value_name = "N", default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Log per-block progress details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = if cli.decrypt {
        Mode::Decrypt
    } else {
        Mode::Encrypt
    };
    let codec = FileCodec::new(cli.cipher.cipher()).with_iterations(cli.iterations);
    let mut reader = get_passphrase_reader(cli.passphrase, cli.passphrase_stdin);

    let started = Instant::now();
    let result = file_ops::process_file(&codec, mode, &cli.input, &cli.output, &mut *reader);

    match result {
        Ok(bytes) => {
            info!(
                ?mode,
                cipher = %cli.cipher,
                bytes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "done"
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = match e.category {
                ErrorCategory::User => 1,
                _ => 2,
            };
            process::exit(code);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn get_passphrase_reader(passphrase: Option<String>, use_stdin: bool) -> Box<dyn PassphraseReader> {
    match passphrase {
        Some(p) => Box::new(ConstantPassphraseReader::new(p.into_bytes())),
        None if use_stdin => Box::new(ReaderPassphraseReader::new(std::io::stdin())),
        None => Box::new(TerminalPassphraseReader::new()),
    }
}
