use std::collections::HashSet;

use anyhow::Context;
use colored::Colorize;
use envelope::{
    AgreementPrivateKey, AgreementPublicKey, Digest, Envelope, EnvelopeConfig, KnownValue,
    ObscureAction, SymmetricKey,
};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

/// What a command produced, rendered according to `--format`.
#[derive(Debug)]
pub enum Report {
    Envelope(Envelope),
    Digests(Vec<Digest>),
    Notation(String),
    /// `None` if the proof confirmed, otherwise the reason it did not.
    Confirmation(Option<String>),
    Key(SymmetricKey),
    KeyPair(AgreementPrivateKey),
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let report = execute(cli.command, &config)?;
    println!("{}", render(&report, &cli.format)?);
    if let Report::Confirmation(Some(reason)) = report {
        anyhow::bail!("proof rejected: {reason}");
    }
    Ok(())
}

pub fn execute(command: Command, config: &EnvelopeConfig) -> anyhow::Result<Report> {
    match command {
        Command::Subject(args) => Ok(Report::Envelope(parse_value(&args.value, args.kind)?)),
        Command::Assert(args) => cmd_assert(args),
        Command::Format(args) => cmd_format(args),
        Command::Digest(args) => cmd_digest(args),
        Command::Elide(args) => cmd_elide(args),
        Command::Unelide(args) => cmd_unelide(args),
        Command::Proof(args) => cmd_proof(args),
        Command::Confirm(args) => cmd_confirm(args),
        Command::Encrypt(args) => cmd_encrypt(args),
        Command::Decrypt(args) => cmd_decrypt(args),
        Command::Compress(args) => cmd_compress(args, config),
        Command::Decompress(args) => cmd_decompress(args, config),
        Command::Salt(args) => cmd_salt(args),
        Command::Keygen(args) if args.agreement => {
            Ok(Report::KeyPair(AgreementPrivateKey::generate()))
        }
        Command::Keygen(_) => Ok(Report::Key(SymmetricKey::generate())),
    }
}

pub fn render(report: &Report, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(match report {
            Report::Envelope(e) => e.to_hex()?,
            Report::Digests(digests) => hex_list(digests).join("\n"),
            Report::Notation(s) => s.clone(),
            Report::Confirmation(None) => format!("{} proof confirmed", "✓".green().bold()),
            Report::Confirmation(Some(reason)) => {
                format!("{} proof rejected: {}", "✗".red().bold(), reason)
            }
            Report::Key(key) => key.to_hex(),
            Report::KeyPair(key) => format!("{}\n{}", key.to_hex(), key.public_key().to_hex()),
        }),
        OutputFormat::Json => {
            let value = match report {
                Report::Envelope(e) => json!({
                    "envelope": e.to_hex()?,
                    "digest": e.digest().to_hex(),
                }),
                Report::Digests(digests) => json!({ "digests": hex_list(digests) }),
                Report::Notation(s) => json!({ "notation": s }),
                Report::Confirmation(reason) => json!({
                    "confirmed": reason.is_none(),
                    "reason": reason,
                }),
                Report::Key(key) => json!({ "key": key.to_hex() }),
                Report::KeyPair(key) => json!({
                    "private_key": key.to_hex(),
                    "public_key": key.public_key().to_hex(),
                }),
            };
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}

fn hex_list(digests: &[Digest]) -> Vec<String> {
    digests.iter().map(Digest::to_hex).collect()
}

fn load_config(path: Option<&str>) -> anyhow::Result<EnvelopeConfig> {
    let Some(path) = path else {
        return Ok(EnvelopeConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    let config =
        EnvelopeConfig::from_toml_str(&text).with_context(|| format!("parsing config {path}"))?;
    debug!(path = %path, ?config, "loaded config");
    Ok(config)
}

fn parse_envelope(raw: &str) -> anyhow::Result<Envelope> {
    Envelope::from_hex(raw).context("invalid envelope")
}

fn parse_key(raw: &str) -> anyhow::Result<SymmetricKey> {
    SymmetricKey::from_hex(raw.trim()).context("invalid key")
}

fn parse_recipients(raw: &[String]) -> anyhow::Result<Vec<AgreementPublicKey>> {
    raw.iter()
        .map(|s| {
            AgreementPublicKey::from_hex(s.trim()).with_context(|| format!("invalid recipient: {s}"))
        })
        .collect()
}

fn parse_digests(raw: &[String]) -> anyhow::Result<HashSet<Digest>> {
    raw.iter()
        .map(|s| Digest::from_hex(s.trim()).with_context(|| format!("invalid digest: {s}")))
        .collect()
}

fn parse_known_value(raw: &str) -> anyhow::Result<KnownValue> {
    if let Ok(code) = raw.parse::<u64>() {
        return Ok(KnownValue::named(code));
    }
    KnownValue::by_name(raw).with_context(|| format!("unknown known value: {raw}"))
}

fn parse_value(raw: &str, kind: ValueKind) -> anyhow::Result<Envelope> {
    Ok(match kind {
        ValueKind::Text => Envelope::new(raw),
        ValueKind::Int => Envelope::new(
            raw.parse::<i64>()
                .with_context(|| format!("invalid integer: {raw}"))?,
        ),
        ValueKind::Bool => Envelope::new(
            raw.parse::<bool>()
                .with_context(|| format!("invalid bool: {raw}"))?,
        ),
        ValueKind::Bytes => {
            Envelope::new(hex::decode(raw).with_context(|| format!("invalid hex: {raw}"))?)
        }
        ValueKind::Known => Envelope::new(parse_known_value(raw)?),
        ValueKind::Envelope => parse_envelope(raw)?,
    })
}

fn cmd_assert(args: AssertArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let predicate = parse_value(&args.predicate, args.pred_type)?;
    let object = parse_value(&args.object, args.obj_type)?;
    Ok(Report::Envelope(envelope.add_assertion(predicate, object)))
}

fn cmd_format(args: FormatArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let notation = if args.tree {
        envelope.tree_format()
    } else {
        envelope.format()
    };
    Ok(Report::Notation(notation))
}

fn cmd_digest(args: DigestArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    if !args.deep {
        return Ok(Report::Digests(vec![envelope.digest()]));
    }
    let mut digests: Vec<Digest> = envelope.deep_digests().into_iter().collect();
    digests.sort();
    Ok(Report::Digests(digests))
}

fn cmd_elide(args: ElideArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let key = args.key.as_deref().map(parse_key).transpose()?;
    let action = match &key {
        Some(key) => ObscureAction::Encrypt(key),
        None => ObscureAction::Elide,
    };
    let result = match &args.reveal {
        Some(reveal) => {
            envelope.elide_revealing_set_with_action(&parse_digests(reveal)?, action)?
        }
        None => envelope.elide_removing_set_with_action(&parse_digests(&args.remove)?, action)?,
    };
    Ok(Report::Envelope(result))
}

fn cmd_unelide(args: UnelideArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let original = parse_envelope(&args.original).context("invalid original")?;
    Ok(Report::Envelope(envelope.unelide(&original)?))
}

fn cmd_proof(args: ProofArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let targets = parse_digests(&args.targets)?;
    let proof = envelope
        .proof_contains_set(&targets)
        .context("envelope does not visibly contain every target")?;
    Ok(Report::Envelope(proof))
}

fn cmd_confirm(args: ConfirmArgs) -> anyhow::Result<Report> {
    let root = Digest::from_hex(args.root.trim()).context("invalid root digest")?;
    let proof = parse_envelope(&args.proof).context("invalid proof")?;
    let targets = parse_digests(&args.targets)?;
    let outcome = Envelope::new_elided(root).check_contains_set(&targets, &proof);
    Ok(Report::Confirmation(outcome.err().map(|e| e.to_string())))
}

fn cmd_encrypt(args: EncryptArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let result = match args.key {
        Some(raw) => {
            let key = parse_key(&raw)?;
            if args.subject {
                envelope.encrypt_subject(&key)?
            } else {
                envelope.encrypt(&key)?
            }
        }
        None => {
            let recipients = parse_recipients(&args.recipient)?;
            if args.subject {
                envelope.encrypt_subject_to_recipients(&recipients)?
            } else {
                envelope.encrypt_to_recipients(&recipients)?
            }
        }
    };
    Ok(Report::Envelope(result))
}

fn cmd_decrypt(args: DecryptArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let result = match (args.key, args.identity) {
        (Some(raw), _) => {
            let key = parse_key(&raw)?;
            if args.subject {
                envelope.decrypt_subject(&key)?
            } else {
                envelope.decrypt(&key)?
            }
        }
        (None, Some(raw)) => {
            let identity =
                AgreementPrivateKey::from_hex(raw.trim()).context("invalid identity key")?;
            if args.subject {
                envelope.decrypt_subject_to_recipient(&identity)?
            } else {
                envelope.decrypt_to_recipient(&identity)?
            }
        }
        (None, None) => anyhow::bail!("either --key or --identity is required"),
    };
    Ok(Report::Envelope(result))
}

fn cmd_compress(args: CompressArgs, config: &EnvelopeConfig) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let result = if args.subject {
        envelope.compress_subject_with(config)?
    } else {
        envelope.compress_with(config)?
    };
    Ok(Report::Envelope(result))
}

fn cmd_decompress(args: CompressArgs, config: &EnvelopeConfig) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let result = if args.subject {
        envelope.decompress_subject_with(config)?
    } else {
        envelope.decompress_with(config)?
    };
    Ok(Report::Envelope(result))
}

fn cmd_salt(args: SaltArgs) -> anyhow::Result<Report> {
    let envelope = parse_envelope(&args.envelope)?;
    let salted = match args.len {
        Some(len) => envelope.add_salt_with_len(len)?,
        None => envelope.add_salt(),
    };
    Ok(Report::Envelope(salted))
}
