//! pix-tools
//!
//! Command line front end for the Pix BR Code library. It collects raw input,
//! hands it to the core and renders the result:
//! 1. `generate` builds a code from a key and an amount
//! 2. `validate` checks a pasted code and prints its fields
//! 3. `txid` prints a fresh transaction id

mod config;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pix_brcode::{
    decode_brcode, encode_pix_payload, format_brl, generate_txid, validate_pasted_code,
    BrCodeRenderer, DecodedBrCode, KeyType, PixRequestInput, QrOptions, QrRenderer,
    ValidationReport,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ToolsConfig;

const BRCODE_FILENAME: &str = "brcode.txt";
const PNG_SCALE: u32 = 6;

#[derive(Parser)]
#[command(name = "pix-tools", about = "Generate and check Pix BR Codes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a BR Code from a key and an amount.
    Generate(GenerateArgs),
    /// Check a pasted BR Code and print its fields.
    Validate(ValidateArgs),
    /// Print a fresh transaction id.
    Txid(TxidArgs),
}

/// Key type as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyTypeArg {
    Phone,
    Cpf,
    Cnpj,
    Email,
    Random,
}

impl From<KeyTypeArg> for KeyType {
    fn from(arg: KeyTypeArg) -> Self {
        match arg {
            KeyTypeArg::Phone => KeyType::Phone,
            KeyTypeArg::Cpf => KeyType::Cpf,
            KeyTypeArg::Cnpj => KeyType::Cnpj,
            KeyTypeArg::Email => KeyType::Email,
            KeyTypeArg::Random => KeyType::Random,
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// Receiver Pix key.
    #[arg(long)]
    key: String,
    /// Amount in BRL, decimal point or comma.
    #[arg(long)]
    amount: String,
    /// Key type; detected when omitted.
    #[arg(long = "type", value_enum)]
    key_type: Option<KeyTypeArg>,
    /// Fixed transaction id instead of a generated one.
    #[arg(long, conflicts_with = "txid_prefix")]
    txid: Option<String>,
    /// Prefix for the generated transaction id.
    #[arg(long)]
    txid_prefix: Option<String>,
    /// Receiver name.
    #[arg(long)]
    name: Option<String>,
    /// Receiver city.
    #[arg(long)]
    city: Option<String>,
    /// Description; an empty value removes it.
    #[arg(long)]
    description: Option<String>,
    /// Emit a dynamic (single use) code.
    #[arg(long)]
    dynamic: bool,
    /// Write a PNG QR code here, with the code text next to it.
    #[arg(long)]
    png: Option<PathBuf>,
    /// Print the QR code to the terminal.
    #[arg(long)]
    terminal: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ValidateArgs {
    /// Pasted code, or `-` to read it from stdin.
    code: String,
    #[arg(long)]
    json: bool,
    /// Write a PNG QR code of the sanitized code when it is valid.
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Args)]
struct TxidArgs {
    /// Prefix, defaults to `PIX_TXID_PREFIX`.
    #[arg(long)]
    prefix: Option<String>,
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pix_tools=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ToolsConfig::from_env();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => generate(args, config).map(|_| ExitCode::SUCCESS),
        Commands::Validate(args) => validate(args).map(|valid| {
            if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }),
        Commands::Txid(args) => {
            let prefix = args.prefix.unwrap_or(config.txid_prefix);
            println!("{}", generate_txid(&prefix));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn generate(args: GenerateArgs, config: ToolsConfig) -> Result<()> {
    let mut merchant = config.merchant;
    if let Some(name) = args.name {
        merchant.merchant_name = name;
    }
    if let Some(city) = args.city {
        merchant.merchant_city = city;
    }
    if let Some(desc) = args.description {
        merchant.description = Some(desc).filter(|d| !d.is_empty());
    }

    let input = PixRequestInput {
        key_type_hint: args.key_type.map(KeyType::from),
        raw_amount: args.amount,
        raw_key: args.key,
    };
    debug!(hint = ?input.key_type_hint, "payment request received");

    let txid = match args.txid {
        Some(txid) => txid,
        None => {
            let prefix = args.txid_prefix.unwrap_or(config.txid_prefix);
            let txid = generate_txid(&prefix);
            debug!(%txid, "generated txid");
            txid
        }
    };

    let request = if args.dynamic {
        input.into_dynamic_request(&merchant, txid)
    } else {
        input.into_request(&merchant, txid)
    };
    let request = match request {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "payment request rejected");
            return Err(e.into());
        }
    };

    info!(
        key_type = %request.key.key_type(),
        amount = request.amount,
        "encoding BR Code"
    );
    let brcode = encode_pix_payload(&request).context("failed to encode BR Code")?;

    let summary = GenerateSummary {
        amount: format_brl(request.amount),
        key_type: request.key.key_type().label().to_string(),
        key: request.key.to_string(),
        txid: request.txid.clone(),
        brcode: brcode.clone(),
    };
    output_summary(&summary, args.json)?;

    if let Some(path) = args.png {
        write_png(&path, &brcode)?;
    }
    if args.terminal {
        print_terminal(&brcode);
    }
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<bool> {
    let raw = if args.code == "-" {
        io::read_to_string(io::stdin()).context("failed to read code from stdin")?
    } else {
        args.code
    };

    let report = validate_pasted_code(&raw);
    let decoded = if report.is_valid() {
        match decode_brcode(&report.sanitized) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(error = %e, "valid BR Code but not a Pix code");
                None
            }
        }
    } else {
        if let Some((fault, position)) = report.structural_error {
            warn!(%fault, position, "malformed BR Code");
        }
        if !report.checksum_valid {
            warn!(
                expected = ?report.expected_checksum,
                got = ?report.got_checksum,
                "checksum mismatch"
            );
        }
        None
    };

    let valid = report.is_valid();
    if valid {
        if let Some(path) = &args.png {
            write_png(path, &report.sanitized)?;
        }
    }

    output_summary(&ValidateSummary { report, decoded }, args.json)?;
    Ok(valid)
}

/// Render a PNG and store the code text next to it.
///
/// A failed render is logged and does not invalidate the code already printed.
fn write_png(path: &Path, brcode: &str) -> Result<()> {
    let png = match QrRenderer::new(QrOptions::png(PNG_SCALE)).render(brcode) {
        Ok(png) => png,
        Err(e) => {
            warn!(error = %e, "QR rendering failed");
            return Ok(());
        }
    };

    fs::write(path, &png).with_context(|| format!("failed to write {}", path.display()))?;
    let text_path = path.with_file_name(BRCODE_FILENAME);
    fs::write(&text_path, brcode)
        .with_context(|| format!("failed to write {}", text_path.display()))?;

    info!(png = %path.display(), text = %text_path.display(), "wrote QR code");
    Ok(())
}

fn print_terminal(brcode: &str) {
    match QrRenderer::new(QrOptions::terminal()).render(brcode) {
        Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
        Err(e) => warn!(error = %e, "QR rendering failed"),
    }
}

fn output_summary<T>(summary: &T, json: bool) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}

#[derive(Serialize)]
struct GenerateSummary {
    amount: String,
    key_type: String,
    key: String,
    txid: String,
    brcode: String,
}

impl fmt::Display for GenerateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "amount: {}", self.amount)?;
        writeln!(f, "key type: {}", self.key_type)?;
        writeln!(f, "key: {}", self.key)?;
        writeln!(f, "txid: {}", self.txid)?;
        writeln!(f, "brcode: {}", self.brcode)
    }
}

#[derive(Serialize)]
struct ValidateSummary {
    #[serde(flatten)]
    report: ValidationReport,
    decoded: Option<DecodedBrCode>,
}

impl fmt::Display for ValidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;
        match report.structural_error {
            Some((fault, position)) => {
                writeln!(f, "structure: invalid ({} at byte {})", fault, position)?
            }
            None => writeln!(f, "structure: ok")?,
        }
        match (&report.expected_checksum, &report.got_checksum) {
            (Some(expected), Some(_)) if report.checksum_valid => {
                writeln!(f, "checksum: ok ({})", expected)?
            }
            (Some(expected), Some(got)) => {
                writeln!(f, "checksum: mismatch (expected {}, got {})", expected, got)?
            }
            _ => writeln!(f, "checksum: missing")?,
        }

        if let Some(decoded) = &self.decoded {
            let kind = if decoded.is_static { "static" } else { "dynamic" };
            writeln!(f, "kind: {}", kind)?;
            match decoded.key_type() {
                Some(key_type) => writeln!(f, "key: {} ({})", decoded.key, key_type)?,
                None => writeln!(f, "key: {}", decoded.key)?,
            }
            match decoded.amount {
                Some(amount) => writeln!(f, "amount: {}", format_brl(amount))?,
                None => writeln!(f, "amount: open")?,
            }
            writeln!(f, "name: {}", decoded.merchant_name)?;
            writeln!(f, "city: {}", decoded.merchant_city)?;
            if let Some(desc) = &decoded.description {
                writeln!(f, "description: {}", desc)?;
            }
            writeln!(f, "txid: {}", decoded.txid.as_deref().unwrap_or("***"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "00020101021126380014br.gov.bcb.pix0116test@example.com\
                        520400005303986540510.005802BR5904TEST6008BRASILIA\
                        62100506ABC12363040E66";

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "pix-tools", "generate", "--key", "a@b.co", "--amount", "10,50", "--type", "email",
            "--dynamic",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.key_type.map(KeyType::from), Some(KeyType::Email));
                assert_eq!(args.amount, "10,50");
                assert!(args.dynamic);
                assert!(!args.json);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_txid_and_prefix_conflict() {
        let parsed = Cli::try_parse_from([
            "pix-tools", "generate", "--key", "a@b.co", "--amount", "1", "--txid", "A",
            "--txid-prefix", "B",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_summary_text() {
        let report = validate_pasted_code(CODE);
        let decoded = decode_brcode(CODE).ok();
        let text = ValidateSummary { report, decoded }.to_string();
        assert!(text.contains("structure: ok"));
        assert!(text.contains("checksum: ok (0E66)"));
        assert!(text.contains("key: test@example.com (E-mail)"));
        assert!(text.contains("amount: R$ 10,00"));
        assert!(text.contains("txid: ABC123"));
    }

    #[test]
    fn test_validate_summary_json() {
        let report = validate_pasted_code("00020");
        let json = serde_json::to_value(ValidateSummary {
            report,
            decoded: None,
        })
        .unwrap();
        assert_eq!(json["structurally_valid"], false);
        assert_eq!(json["structural_error"][0], "value_overrun");
        assert_eq!(json["structural_error"][1], 4);
        assert!(json["decoded"].is_null());
    }
}
