//! omnicap - validate, convert and inspect CAP alert documents
//!
//! Reads CAP 1.0, 1.1 and 1.2 XML files, reports every diagnostic the codec
//! raises, and re-encodes alerts for another CAP version.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use omnicap_cap::{
    convert, decode, Alert, CapVersion, DiagnosticList, EncodeOptions, Info,
};
use omnicap_core::{AppConfig, LogFormat};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Validate and convert Common Alerting Protocol documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "OMNICAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode each file and report its diagnostics
    Validate {
        /// CAP documents to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encode a document for another CAP version
    Convert {
        /// CAP document to convert
        file: PathBuf,

        /// Target version (1.0, 1.1 or 1.2); defaults to the configured version
        #[arg(long)]
        to: Option<CapVersion>,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write the XML without indentation
        #[arg(long)]
        compact: bool,
    },

    /// Print a JSON summary of a decoded alert
    Inspect {
        /// CAP document to summarize
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    version: Option<CapVersion>,
    valid: bool,
    diagnostics: &'a DiagnosticList,
}

#[derive(Debug, Serialize)]
struct AlertSummary<'a> {
    version: CapVersion,
    identifier: &'a str,
    sender: &'a str,
    sent: Option<String>,
    status: Option<String>,
    msg_type: Option<String>,
    scope: Option<String>,
    references: Vec<ReferenceSummary<'a>>,
    info: Vec<InfoSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ReferenceSummary<'a> {
    sender: &'a str,
    identifier: &'a str,
    sent: &'a str,
}

#[derive(Debug, Serialize)]
struct InfoSummary<'a> {
    language: &'a str,
    event: &'a str,
    category: Vec<String>,
    urgency: Option<String>,
    severity: Option<String>,
    certainty: Option<String>,
    headline: Option<&'a str>,
    expires: Option<String>,
    resources: usize,
    areas: Vec<&'a str>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::from_config_builder(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => AppConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    init_tracing(&config);
    debug!(?config, "loaded configuration");

    match args.command {
        Command::Validate { files, json } => validate_files(&config, &files, json),
        Command::Convert {
            file,
            to,
            output,
            compact,
        } => {
            let target = to.unwrap_or(config.codec.default_target_version);
            let options = EncodeOptions {
                pretty: config.codec.pretty && !compact,
            };
            convert_file(&file, target, options, output.as_deref())
        }
        Command::Inspect { file } => inspect_file(&file),
    }
}

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read CAP file: {:?}", path))
}

fn validate_files(config: &AppConfig, files: &[PathBuf], json: bool) -> Result<ExitCode> {
    let mut failed = 0;
    let mut reports = Vec::new();

    for file in files {
        let xml = read_document(file)?;
        let decoded = decode(&xml);
        let version = decoded.alert.as_ref().map(|a| a.version);

        let valid = !decoded.diagnostics.has_errors()
            && !(config.codec.warnings_as_errors && !decoded.diagnostics.is_empty());
        if !valid {
            failed += 1;
        }
        info!(
            file = %file.display(),
            valid,
            diagnostics = decoded.diagnostics.len(),
            "validated document"
        );
        reports.push((file, version, valid, decoded.diagnostics));
    }

    if json {
        let reports: Vec<FileReport<'_>> = reports
            .iter()
            .map(|(file, version, valid, diagnostics)| FileReport {
                file,
                version: *version,
                valid: *valid,
                diagnostics,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (file, version, valid, diagnostics) in &reports {
            let status = if *valid { "OK" } else { "FAILED" };
            match version {
                Some(version) => println!("{}: {} ({})", file.display(), status, version),
                None => println!("{}: {}", file.display(), status),
            }
            for diagnostic in diagnostics {
                println!("  {}", diagnostic);
            }
        }
    }

    if failed > 0 {
        warn!(failed, total = files.len(), "validation failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn convert_file(
    file: &Path,
    target: CapVersion,
    options: EncodeOptions,
    output: Option<&Path>,
) -> Result<ExitCode> {
    let xml = read_document(file)?;
    let encoded = convert(&xml, target, options);

    for diagnostic in &encoded.diagnostics {
        eprintln!("{}", diagnostic);
    }
    let Some(out) = encoded.xml else {
        bail!("{:?} cannot be expressed as {}", file, target);
    };

    match output {
        Some(path) => {
            fs::write(path, out).with_context(|| format!("Failed to write {:?}", path))?;
            info!(file = %file.display(), output = %path.display(), %target, "converted document");
        }
        None => println!("{}", out),
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect_file(file: &Path) -> Result<ExitCode> {
    let xml = read_document(file)?;
    let decoded = decode(&xml);

    let Some(alert) = decoded.alert else {
        for diagnostic in &decoded.diagnostics {
            eprintln!("{}", diagnostic);
        }
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", serde_json::to_string_pretty(&summarize(&alert))?);
    Ok(ExitCode::SUCCESS)
}

fn summarize(alert: &Alert) -> AlertSummary<'_> {
    AlertSummary {
        version: alert.version,
        identifier: &alert.identifier,
        sender: &alert.sender,
        sent: alert.sent.map(|t| t.to_wire()),
        status: alert.status.map(|s| s.to_string()),
        msg_type: alert.msg_type.map(|m| m.to_string()),
        scope: alert.scope.map(|s| s.to_string()),
        references: alert
            .reference_records()
            .into_iter()
            .flatten()
            .map(|r| ReferenceSummary {
                sender: r.sender,
                identifier: r.identifier,
                sent: r.sent,
            })
            .collect(),
        info: alert.info.iter().map(summarize_info).collect(),
    }
}

fn summarize_info(info: &Info) -> InfoSummary<'_> {
    InfoSummary {
        language: &info.language,
        event: &info.event,
        category: info.category.iter().map(|c| c.to_string()).collect(),
        urgency: info.urgency.map(|u| u.to_string()),
        severity: info.severity.map(|s| s.to_string()),
        certainty: info.certainty.map(|c| c.to_string()),
        headline: info.headline.as_deref(),
        expires: info.expires.map(|t| t.to_wire()),
        resources: info.resource.len(),
        areas: info.area.iter().map(|a| a.area_desc.as_str()).collect(),
    }
}
