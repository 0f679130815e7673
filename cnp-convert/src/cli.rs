use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cnp-convert")]
#[command(about = "Convert Kubernetes and Calico network policies to Cilium format")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Convert a tree of source policies to Cilium format.
    Convert(ConvertArgs),
    /// Validate one converted policy document.
    Validate(ValidateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum SourceCni {
    K8s,
    Calico,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Directory containing one subdirectory per source category (k8s/, calico/).
    pub input_dir: PathBuf,
    /// Directory to write converted policies, the manifest and the report into.
    pub output_dir: PathBuf,
    /// Source CNI the policies come from.
    #[arg(long, value_enum, default_value_t = SourceCni::K8s)]
    pub source_cni: SourceCni,
    /// Skip structural validation of converted policies.
    #[arg(long)]
    pub no_validate: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Converted policy document to check.
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
