//! `docseal` command-line tool: generate PIN-protected keys, sign PDFs with
//! the active key from a key directory, and verify signed PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docseal::{
    signed_output_path, Config, FileKeyRegistry, KeyCodec, KeyPairGenerator, PdfDocument,
    PublicKey, SignError,
};

#[derive(Parser, Debug)]
#[command(name = "docseal", version, about = "Sign and verify documents with embedded RSA signatures")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "DOCSEAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a keypair, store the encrypted private key and write the public key
    Keygen {
        /// Directory holding encrypted keys (e.g. a mounted USB drive)
        #[arg(long)]
        key_dir: Option<PathBuf>,

        /// Where to write the PEM public key
        #[arg(long)]
        public_key: PathBuf,

        /// PIN protecting the private key
        #[arg(long, env = "DOCSEAL_PIN", hide_env_values = true)]
        pin: String,

        /// RSA modulus size (defaults to the configured size)
        #[arg(long)]
        bits: Option<usize>,
    },

    /// Sign a PDF with the most recently generated key
    Sign {
        /// PDF to sign
        input: PathBuf,

        /// Directory holding encrypted keys
        #[arg(long)]
        key_dir: Option<PathBuf>,

        /// PIN protecting the private key
        #[arg(long, env = "DOCSEAL_PIN", hide_env_values = true)]
        pin: String,

        /// Output path (defaults to `<name><suffix>.pdf` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify the signature embedded in a PDF
    Verify {
        /// Signed PDF
        input: PathBuf,

        /// PEM public key of the signer
        #[arg(long)]
        public_key: PathBuf,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn key_dir(flag: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| config.key_dir.clone()) {
        Some(dir) => Ok(dir),
        None => bail!("no key directory given (use --key-dir or set key_dir in the config)"),
    }
}

fn run(command: Command, config: &Config) -> anyhow::Result<bool> {
    match command {
        Command::Keygen {
            key_dir: dir,
            public_key,
            pin,
            bits,
        } => {
            let dir = key_dir(dir, config)?;
            keygen(&dir, &public_key, &pin, bits.unwrap_or(config.key_bits))?;
            Ok(true)
        }
        Command::Sign {
            input,
            key_dir: dir,
            pin,
            output,
        } => {
            let dir = key_dir(dir, config)?;
            let output = output.unwrap_or_else(|| signed_output_path(&input, &config.signed_suffix));
            sign(&input, &dir, &pin, &output)?;
            println!("PDF signed and saved to {}", output.display());
            Ok(true)
        }
        Command::Verify {
            input,
            public_key,
            json,
        } => verify(&input, &public_key, json),
    }
}

fn keygen(dir: &Path, public_key_path: &Path, pin: &str, bits: usize) -> anyhow::Result<()> {
    if pin.is_empty() {
        bail!("the PIN must not be empty");
    }
    if !dir.is_dir() {
        bail!("key directory {} does not exist", dir.display());
    }

    let keypair = KeyPairGenerator::with_bits(bits)?
        .generate()
        .context("generating keypair")?;
    let blob = KeyCodec::new().seal_keypair(&keypair, pin)?;

    // The key only becomes active once its public half is on disk
    keypair
        .public_key()
        .save_to_file(public_key_path)
        .with_context(|| format!("writing {}", public_key_path.display()))?;
    let mut registry = FileKeyRegistry::new(dir);
    let id = registry.store_blob(&blob).context("storing encrypted key")?;

    println!("Stored key {} in {}", id, dir.display());
    println!("Public key written to {}", public_key_path.display());
    Ok(())
}

fn sign(input: &Path, dir: &Path, pin: &str, output: &Path) -> anyhow::Result<()> {
    let registry = FileKeyRegistry::new(dir);
    let (id, blob) = registry.load_latest_blob()?;

    let keypair = match KeyCodec::new().unlock_keypair(&blob, pin) {
        Ok(keypair) => keypair,
        Err(SignError::Authentication) => bail!("wrong PIN or corrupted key file {}", id),
        Err(e) => return Err(e).context(format!("unlocking key {}", id)),
    };

    let mut pdf = PdfDocument::open(input).with_context(|| format!("reading {}", input.display()))?;
    pdf.sign(&keypair)?;
    pdf.save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn verify(input: &Path, public_key_path: &Path, json: bool) -> anyhow::Result<bool> {
    let public_key = PublicKey::load_from_file(public_key_path)
        .with_context(|| format!("reading {}", public_key_path.display()))?;
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let outcome = docseal::check_pdf(&bytes, &public_key);
    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if outcome.is_valid() {
        println!("Signature is VALID");
    } else {
        println!("Signature is INVALID ({})", outcome);
    }
    Ok(outcome.is_valid())
}
