//! Signet command line.
//!
//! Reads the audit trail on standard input and writes, per the flags,
//! a re-sign DRF, a report workbook, a signings database and/or a
//! priority listing.
//!
//! ```bash
//! signet -c study.sig -d resign.drf -x report.txt < DFaudittrace
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use signet::{
    Centers, Countries, EvaluatePolicies, ExclusionTable, SigningDb, StatusVocabulary, Tracker,
    report::{ReportOptions, build_report, write_report},
    write_drf,
};
use tracing::{debug, error, warn};

/// Track electronic signatures across a clinical audit trail.
#[derive(Parser)]
#[command(name = "signet")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Signature configuration file.
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Write the re-sign DRF to this path.
    #[arg(short = 'd', long)]
    drf: Option<PathBuf>,

    /// Write the report workbook rows to this path.
    #[arg(short = 'x', long)]
    xls: Option<PathBuf>,

    /// Accept data changes made by the signer.
    #[arg(short = 'a', long)]
    allow_signer_changes: bool,

    /// Omit obligations whose signature plate never arrived.
    #[arg(short = 'A', long)]
    arrived_only: bool,

    /// Defer re-signature until records are final.
    #[arg(short = 'F', long = "resign-when-final")]
    resign_when_final: bool,

    /// Render statuses in the source-data-verification vocabulary.
    #[arg(short = 'S', long)]
    sdv: bool,

    /// Study directory root for centres/countries lookups.
    #[arg(short = 's', long)]
    studydir: Option<PathBuf>,

    /// SQLite output database.
    #[arg(short = 'D', long)]
    db: Option<PathBuf>,

    /// Exclusion table of administratively exempted changes.
    #[arg(short = 'E', long)]
    exclusion: Option<PathBuf>,

    /// Emit the plate|field|level priority listing and exit.
    #[arg(short = 'P', long)]
    priority_file: Option<PathBuf>,

    /// Print version information.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.config)
        .with_context(|| format!("unable to open configuration file '{}'", cli.config.display()))?;

    let outcome = signet::parse_config(&source);
    if !outcome.errors.is_empty() {
        for err in &outcome.errors {
            error!("{}: {err}", cli.config.display());
        }
        bail!("terminating due to errors in configuration file");
    }
    for config in &outcome.configs {
        debug!("{config}");
    }

    if let Some(path) = &cli.priority_file {
        let file = File::create(path)
            .with_context(|| format!("unable to open '{}' for writing", path.display()))?;
        signet::write_priority(BufWriter::new(file), &outcome.configs)?;
        return Ok(());
    }

    let exclusions = match &cli.exclusion {
        Some(path) => match ExclusionTable::load(path) {
            Ok(table) => table,
            Err(err) => {
                warn!("{err}; continuing without exclusions");
                ExclusionTable::new()
            }
        },
        None => ExclusionTable::new(),
    };

    let mut tracker = Tracker::new(outcome.configs, exclusions);
    if let Some(path) = &cli.db {
        let db = SigningDb::open(path)
            .with_context(|| format!("unable to create/open '{}'", path.display()))?;
        tracker = tracker.with_db(db);
    }

    tracker
        .process(io::stdin().lock())
        .context("reading audit trail")?;

    tracker.evaluate(EvaluatePolicies {
        allow_signer_changes: cli.allow_signer_changes,
        resign_at_final: cli.resign_when_final,
    });

    if let Some(path) = &cli.drf {
        let file = File::create(path)
            .with_context(|| format!("unable to create/open DRF output file '{}'", path.display()))?;
        write_drf(BufWriter::new(file), tracker.nodes())?;
    }

    if let Some(path) = &cli.xls {
        let (centers, countries) = load_sites(cli.studydir.as_deref());
        let vocabulary = if cli.sdv {
            StatusVocabulary::Sdv
        } else {
            StatusVocabulary::Signature
        };
        let blocks = build_report(
            tracker.nodes(),
            &centers,
            &countries,
            ReportOptions {
                arrived_only: cli.arrived_only,
                vocabulary,
            },
        );
        let file = File::create(path)
            .with_context(|| format!("unable to create report file '{}'", path.display()))?;
        write_report(BufWriter::new(file), &blocks, vocabulary)?;
    }

    tracker.finish().context("committing signings database")?;
    Ok(())
}

/// Loads the centres and countries tables from the study directory;
/// missing tables just leave the geography columns empty.
fn load_sites(studydir: Option<&Path>) -> (Centers, Countries) {
    let Some(studydir) = studydir else {
        return (Centers::new(), Countries::new());
    };

    let centers = match Centers::load(&studydir.join("lib").join("DFcenters")) {
        Ok(centers) => centers,
        Err(err) => {
            warn!("{err}");
            Centers::new()
        }
    };
    let countries = match Countries::load(&studydir.join("lib").join("DFcountries")) {
        Ok(countries) => countries,
        Err(err) => {
            warn!("{err}");
            Countries::new()
        }
    };
    (centers, countries)
}
