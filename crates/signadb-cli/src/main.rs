//! Maintenance console for signadb snapshots.
//!
//! Operates on a JSON snapshot of the full store set (the serde form of
//! [`Db`]): `check` reports counter drift without touching the file, `reset`
//! repairs it in place, `stats` prints table sizes and the engine metrics
//! gathered while loading.

use clap::{Parser, Subcommand};
use signadb::{core::obs, core::reconcile, Db, ReconcileReport};
use std::{fs, path::Path, path::PathBuf, process::ExitCode};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "signadb")]
#[command(about = "Maintenance console for signadb snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dry-run reconciliation: report counter columns that diverge from
    /// ground truth. Exits non-zero when drift is found.
    Check {
        /// JSON snapshot to inspect.
        snapshot: PathBuf,
    },
    /// Reset every counter column from ground truth and write the snapshot
    /// back in place.
    Reset {
        /// JSON snapshot to repair.
        snapshot: PathBuf,
    },
    /// Print per-table row counts and the engine metrics report.
    Stats {
        /// JSON snapshot to summarize.
        snapshot: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match &cli.command {
        Command::Check { snapshot } => cmd_check(snapshot),
        Command::Reset { snapshot } => cmd_reset(snapshot),
        Command::Stats { snapshot } => cmd_stats(snapshot),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn load(path: &Path) -> Result<Db, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })
}

fn save(path: &Path, db: &Db) -> Result<(), CliError> {
    let raw = serde_json::to_string_pretty(db).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, raw).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn print_report(report: &ReconcileReport) {
    println!("table           rows updated");
    println!("--------------- ------------");
    println!("communes        {:>12}", report.communes);
    println!("epcis           {:>12}", report.epcis);
    println!("departements    {:>12}", report.departements);
    println!("regions         {:>12}", report.regions);
    println!("collectivities  {:>12}", report.collectivities);
    println!("publishers      {:>12}", report.publishers);
    println!("ddfips          {:>12}", report.ddfips);
    println!("dgfips          {:>12}", report.dgfips);
    println!("offices         {:>12}", report.offices);
    println!("packages        {:>12}", report.packages);
    println!("--------------- ------------");
    println!("total           {:>12}", report.total());
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(path: &Path) -> Result<ExitCode, CliError> {
    let db = load(path)?;

    // Reconcile a copy; the snapshot on disk stays as-is.
    let mut scratch = db.clone();
    let report = reconcile::reset_all_counters(&mut scratch);

    print_report(&report);
    if report.total() == 0 {
        println!("ok: every counter matches ground truth");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("drift: {} row(s) diverge; run `signadb reset`", report.total());
        Ok(ExitCode::FAILURE)
    }
}

// ---------------------------------------------------------------------------
// reset
// ---------------------------------------------------------------------------

fn cmd_reset(path: &Path) -> Result<ExitCode, CliError> {
    let mut db = load(path)?;
    let report = reconcile::reset_all_counters(&mut db);

    print_report(&report);
    if report.total() > 0 {
        save(path, &db)?;
        println!("repaired {} row(s), snapshot rewritten", report.total());
    } else {
        println!("ok: nothing to repair");
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

fn cmd_stats(path: &Path) -> Result<ExitCode, CliError> {
    let mut db = load(path)?;

    println!("table           rows   live");
    println!("--------------- ------ ------");
    println!(
        "communes        {:>6}      -",
        db.communes().len()
    );
    println!("epcis           {:>6}      -", db.epcis().len());
    println!("departements    {:>6}      -", db.departements().len());
    println!("regions         {:>6}      -", db.regions().len());
    println!(
        "collectivities  {:>6} {:>6}",
        db.collectivities().len(),
        db.collectivities().count_live()
    );
    println!(
        "publishers      {:>6} {:>6}",
        db.publishers().len(),
        db.publishers().count_live()
    );
    println!(
        "ddfips          {:>6} {:>6}",
        db.ddfips().len(),
        db.ddfips().count_live()
    );
    println!(
        "dgfips          {:>6} {:>6}",
        db.dgfips().len(),
        db.dgfips().count_live()
    );
    println!(
        "users           {:>6} {:>6}",
        db.users().len(),
        db.users().count_live()
    );
    println!(
        "offices         {:>6} {:>6}",
        db.offices().len(),
        db.offices().count_live()
    );
    println!("office_communes {:>6}      -", db.office_communes().len());
    println!("office_users    {:>6}      -", db.office_users().len());
    println!(
        "reports         {:>6} {:>6}",
        db.reports().len(),
        db.reports().count_live()
    );
    println!(
        "packages        {:>6} {:>6}",
        db.packages().len(),
        db.packages().count_live()
    );
    println!("transmissions   {:>6}      -", db.transmissions().len());

    // A reconcile pass feeds the metrics state, so the report below carries
    // real numbers even in a fresh process.
    obs::metrics_reset();
    reconcile::reset_all_counters(&mut db);
    let metrics = obs::metrics_report();
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&metrics).map_err(|source| CliError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?
    );

    Ok(ExitCode::SUCCESS)
}
