use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "envelope",
    about = "Build, redact, and verify digest-tree envelopes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with compression settings
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// How a positional value argument is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ValueKind {
    #[default]
    Text,
    Int,
    Bool,
    /// Hex-encoded bytes
    Bytes,
    /// Known value, by name or numeric code
    Known,
    /// Hex-encoded envelope
    Envelope,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an envelope with a single subject
    Subject(SubjectArgs),
    /// Add an assertion to an envelope
    Assert(AssertArgs),
    /// Render an envelope in envelope notation
    Format(FormatArgs),
    /// Print the digest of an envelope
    Digest(DigestArgs),
    /// Elide parts of an envelope by digest
    Elide(ElideArgs),
    /// Restore elided parts from the original envelope
    Unelide(UnelideArgs),
    /// Produce an inclusion proof for a set of digests
    Proof(ProofArgs),
    /// Check an inclusion proof against a trusted root digest
    Confirm(ConfirmArgs),
    /// Encrypt an envelope or its subject with a key or to recipients
    Encrypt(EncryptArgs),
    /// Decrypt an envelope or its subject with a key or a recipient identity
    Decrypt(DecryptArgs),
    /// Compress an envelope or its subject
    Compress(CompressArgs),
    /// Decompress an envelope or its subject
    Decompress(CompressArgs),
    /// Add a random salt assertion
    Salt(SaltArgs),
    /// Generate a symmetric key or an agreement key pair
    Keygen(KeygenArgs),
}

#[derive(Args)]
pub struct SubjectArgs {
    pub value: String,
    #[arg(short = 't', long = "type", value_enum, default_value = "text")]
    pub kind: ValueKind,
}

#[derive(Args)]
pub struct AssertArgs {
    pub predicate: String,
    pub object: String,
    pub envelope: String,
    #[arg(long, value_enum, default_value = "text")]
    pub pred_type: ValueKind,
    #[arg(long, value_enum, default_value = "text")]
    pub obj_type: ValueKind,
}

#[derive(Args)]
pub struct FormatArgs {
    pub envelope: String,
    /// One line per node with digests and edge labels
    #[arg(long)]
    pub tree: bool,
}

#[derive(Args)]
pub struct DigestArgs {
    pub envelope: String,
    /// List the digest of every node
    #[arg(long)]
    pub deep: bool,
}

#[derive(Args)]
pub struct ElideArgs {
    pub envelope: String,
    /// Digests to elide
    #[arg(long, num_args = 1.., conflicts_with = "reveal", required_unless_present = "reveal")]
    pub remove: Vec<String>,
    /// Digests to keep visible; everything else is elided
    #[arg(long, num_args = 0.., conflicts_with = "remove")]
    pub reveal: Option<Vec<String>>,
    /// Encrypt the selected nodes with this hex key instead of eliding
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Args)]
pub struct UnelideArgs {
    pub envelope: String,
    pub original: String,
}

#[derive(Args)]
pub struct ProofArgs {
    pub envelope: String,
    #[arg(required = true)]
    pub targets: Vec<String>,
}

#[derive(Args)]
pub struct ConfirmArgs {
    /// Trusted root digest
    pub root: String,
    pub proof: String,
    #[arg(required = true)]
    pub targets: Vec<String>,
}

#[derive(Args)]
pub struct EncryptArgs {
    pub envelope: String,
    /// Hex symmetric key
    #[arg(short, long, required_unless_present = "recipient", conflicts_with = "recipient")]
    pub key: Option<String>,
    /// Hex agreement public key; repeat for several recipients
    #[arg(short, long, num_args = 1..)]
    pub recipient: Vec<String>,
    /// Apply to the subject only, leaving assertions visible
    #[arg(long)]
    pub subject: bool,
}

#[derive(Args)]
pub struct DecryptArgs {
    pub envelope: String,
    /// Hex symmetric key
    #[arg(short, long, required_unless_present = "identity", conflicts_with = "identity")]
    pub key: Option<String>,
    /// Hex agreement private key of one of the recipients
    #[arg(short, long)]
    pub identity: Option<String>,
    #[arg(long)]
    pub subject: bool,
}

#[derive(Args)]
pub struct CompressArgs {
    pub envelope: String,
    #[arg(long)]
    pub subject: bool,
}

#[derive(Args)]
pub struct SaltArgs {
    pub envelope: String,
    #[arg(short, long)]
    pub len: Option<usize>,
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Generate an X25519 key pair for recipient encryption
    #[arg(long)]
    pub agreement: bool,
}
