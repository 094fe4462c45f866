use std::fs;
use std::path::{Path, PathBuf};

use certchain::chain::{codec, ChainValidator, ChainVerifier, CertificateBuilder};
use certchain::config::{load_settings, IssuanceSettings, Settings, VerifierSettings};
use certchain::document::BaseDocument;
use certchain::modules::crypto::{key_id, parse_pem_public_key, public_key_to_pem};
use certchain::{Certificate, KeyPair, PublicKey};
use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;

/// certchain - issue and verify delegated-trust certificate chains
#[derive(Parser, Debug)]
#[command(name = "certchain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a P-256 key pair and write it as SEC1 PEM
    Keygen {
        /// Output file for the private key
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Print the public key of a private key file
    Pubkey {
        /// Private key file (EC PRIVATE KEY PEM)
        #[arg(long, short)]
        key: PathBuf,
    },

    /// Issue a certificate, optionally chained onto a parent
    #[command(after_help = "EXAMPLES:
    # Root certificate for a delegate
    certchain issue --issuer root.pem --subject-key delegate.pub --rank 1 --kind base --kind certificate --out root.json

    # Delegate narrows the chain to 'base'
    certchain issue --issuer delegate.pem --subject-key leaf.pub --rank 2 --kind base --parent root.json --out leaf.json
")]
    Issue(Box<IssueArgs>),

    /// Print every certificate in a chain, terminal first
    Inspect {
        /// Certificate file (JSON)
        #[arg(long, short)]
        cert: PathBuf,
    },

    /// Verify that a chain authorizes a document kind
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct IssueArgs {
    /// Issuer private key file
    #[arg(long)]
    issuer: PathBuf,

    /// Subject private key file
    #[arg(long, conflicts_with = "subject_key", required_unless_present = "subject_key")]
    subject: Option<PathBuf>,

    /// Subject public key file
    #[arg(long)]
    subject_key: Option<PathBuf>,

    /// Rank granted to the subject
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rank: i64,

    /// Permitted document kind (repeatable, or comma-separated)
    #[arg(long = "kind", value_delimiter = ',', required = true)]
    kinds: Vec<String>,

    /// Validity in seconds (defaults to CERTCHAIN_DEFAULT_TTL)
    #[arg(long, allow_negative_numbers = true)]
    ttl: Option<i64>,

    /// Parent certificate file to embed
    #[arg(long)]
    parent: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Terminal certificate file
    #[arg(long, conflicts_with = "document", required_unless_present = "document")]
    cert: Option<PathBuf>,

    /// Document file (JSON) carrying its own chain
    #[arg(long)]
    document: Option<PathBuf>,

    /// Document kind to authorize (with --cert)
    #[arg(long, default_value = certchain::document::BASE_KIND)]
    kind: String,

    /// Rank ceiling (defaults to CERTCHAIN_RANK_CEILING)
    #[arg(long, allow_negative_numbers = true)]
    rank_ceiling: Option<i64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    // Load configuration
    let settings = load_settings()?;

    run(cli, settings)
}

fn run(cli: Cli, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Keygen { out } => keygen(&out),
        Commands::Pubkey { key } => {
            let key = read_key_pair(&key)?;
            print!("{}", public_key_to_pem(&key.public_key()));
            Ok(())
        }
        Commands::Issue(args) => issue(&args, &settings.issuance),
        Commands::Inspect { cert } => inspect(&cert),
        Commands::Verify(args) => verify(&args, settings.verifier),
    }
}

fn keygen(out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let key = KeyPair::generate();
    write_private(out, &key.to_sec1_pem()?)?;
    info!("Wrote private key to {}", out.display());
    println!("{}", key_id(&key.public_key()));
    Ok(())
}

fn issue(args: &IssueArgs, settings: &IssuanceSettings) -> Result<(), Box<dyn std::error::Error>> {
    let issuer = read_key_pair(&args.issuer)?;
    let subject: PublicKey = match (&args.subject, &args.subject_key) {
        (Some(path), _) => read_key_pair(path)?.public_key(),
        (None, Some(path)) => parse_pem_public_key(&fs::read_to_string(path)?)?,
        (None, None) => return Err("either --subject or --subject-key is required".into()),
    };

    let mut builder = CertificateBuilder::new(&issuer, subject)
        .rank(args.rank)
        .permit_all(args.kinds.iter().map(|k| k.trim()).filter(|k| !k.is_empty()))
        .validity_seconds(args.ttl.unwrap_or(settings.default_ttl_seconds));
    if let Some(parent) = &args.parent {
        builder = builder.parent(read_certificate(parent)?);
    }
    let certificate = builder.build()?;
    let encoded = codec::encode(&certificate)?;

    match &args.out {
        Some(path) => {
            fs::write(path, &encoded)?;
            info!(
                "Wrote certificate for {} ({} link(s)) to {}",
                key_id(certificate.subject()),
                certificate.chain_len(),
                path.display()
            );
        }
        None => println!("{}", encoded),
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let certificate = read_certificate(path)?;
    for (depth, link) in certificate.links().enumerate() {
        let kinds: Vec<&str> = link.permitted_kinds().iter().map(String::as_str).collect();
        println!(
            "[{}] issuer={} subject={} rank={} kinds={} not_after={}{}",
            depth,
            key_id(link.issuer()),
            key_id(link.subject()),
            link.rank(),
            kinds.join(","),
            format_timestamp(link.not_after()),
            if link.is_root() { " (root)" } else { "" }
        );
    }
    Ok(())
}

fn verify(args: &VerifyArgs, mut settings: VerifierSettings) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ceiling) = args.rank_ceiling {
        settings.rank_ceiling = ceiling;
    }
    let validator = ChainValidator::new(settings);

    let document = match (&args.document, &args.cert) {
        (Some(path), _) => serde_json::from_str::<BaseDocument>(&fs::read_to_string(path)?)?,
        (None, Some(path)) => BaseDocument::with_kind(args.kind.clone())
            .with_certificate(&read_certificate(path)?)?,
        (None, None) => return Err("either --cert or --document is required".into()),
    };

    let verdict = validator.verify(&document)?;
    println!(
        "authorized kind={} signer={} rank={} depth={}",
        document.kind,
        key_id(&verdict.signer),
        verdict.rank,
        verdict.depth
    );
    Ok(())
}

fn read_key_pair(path: &Path) -> Result<KeyPair, Box<dyn std::error::Error>> {
    Ok(KeyPair::from_sec1_pem(&fs::read_to_string(path)?)?)
}

fn read_certificate(path: &Path) -> Result<Certificate, Box<dyn std::error::Error>> {
    Ok(codec::decode(&fs::read(path)?)?)
}

fn format_timestamp(seconds: i64) -> String {
    match Utc.timestamp_opt(seconds, 0).single() {
        Some(time) => time.to_rfc3339(),
        None => seconds.to_string(),
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}
