use anyhow::{bail, Context, Result};
use clap::Parser;
use cnp_convert::convert::{convert_policies, ConvertOptions, REPORT_FILENAME};
use cnp_convert::report::render_summary;
use cnp_convert::validate::{build_validation_report, render_validation_text};
use netpol_model::{load_file, CiliumNetworkPolicy, SourceKind};

mod cli;

use cli::{Cli, Command, ConvertArgs, OutputFormat, SourceCni, ValidateArgs};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Validate(args) => run_validate(args),
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let source = match args.source_cni {
        SourceCni::K8s => SourceKind::K8s,
        SourceCni::Calico => SourceKind::Calico,
    };
    let options = ConvertOptions {
        validate: !args.no_validate,
        ..ConvertOptions::default()
    };

    // No live cluster applier is wired here; applying converted policies is
    // the responsibility of external tooling consuming the output tree.
    let manifest = convert_policies(
        source,
        &args.input_dir,
        &args.output_dir,
        &options,
        None,
        None,
    )?;
    println!("{}", render_summary(&manifest));

    if manifest.failed_count > 0 || manifest.validation_failed_count > 0 {
        bail!(
            "conversion finished with failures; see {}",
            args.output_dir.join(REPORT_FILENAME).display()
        );
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let value = load_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let policy: CiliumNetworkPolicy = serde_yaml::from_value(value).with_context(|| {
        format!(
            "failed to interpret {} as a Cilium policy",
            args.file.display()
        )
    })?;

    let report = build_validation_report(&policy);
    match args.format {
        OutputFormat::Text => println!("{}", render_validation_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.is_valid() {
        bail!("validation failed");
    }
    Ok(())
}
