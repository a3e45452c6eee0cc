use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use regimen_core::*;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regimen")]
#[command(about = "Medication regimen history and change tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new medication with its initial dose
    Add {
        name: String,
        #[command(flatten)]
        dose: DoseArgs,
        /// Mark as a diuretic
        #[arg(long)]
        diuretic: bool,
        /// Clinical category (e.g. beta_blocker, arni, mra)
        #[arg(long)]
        category: Option<String>,
        /// Effective date (YYYY-MM-DD, default now)
        #[arg(long)]
        at: Option<NaiveDate>,
    },

    /// Record a dose change for a medication
    ChangeDose {
        name: String,
        #[command(flatten)]
        dose: DoseArgs,
        #[arg(long)]
        at: Option<NaiveDate>,
    },

    /// Stop a medication
    Archive {
        name: String,
        #[arg(long)]
        at: Option<NaiveDate>,
    },

    /// Restart a previously stopped medication
    Reactivate {
        name: String,
        #[command(flatten)]
        dose: DoseArgs,
        #[arg(long)]
        at: Option<NaiveDate>,
    },

    /// List medications in the ledger
    List {
        /// Include archived medications
        #[arg(long)]
        all: bool,
    },

    /// Show the regimen in effect on a date
    Snapshot {
        /// Date to reconstruct (default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show dose change history, most recent first
    Timeline {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Ignore the default window and show everything
        #[arg(long, conflicts_with = "from")]
        all: bool,
    },

    /// Compare the regimens in effect on two dates
    Compare {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Export a timeline or comparison as CSV
    Export {
        #[command(subcommand)]
        what: ExportCommands,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export the full timeline (or a date range of it)
    Timeline {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Export a comparison between two dates
    Compare {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(clap::Args)]
struct DoseArgs {
    /// Dosage amount, e.g. 40 or 49/51
    #[arg(long)]
    dosage: String,
    /// Dosage unit
    #[arg(long, default_value = "mg")]
    unit: String,
    /// Schedule, e.g. "once daily"
    #[arg(long, default_value = "once daily")]
    schedule: String,
}

impl From<DoseArgs> for DoseSpec {
    fn from(args: DoseArgs) -> Self {
        DoseSpec::new(args.dosage, args.unit, args.schedule)
    }
}

fn main() -> Result<()> {
    regimen_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::in_dir(&data_dir);
    tracing::debug!("Using ledger at {:?}", store.path());
    let out = Output {
        json: cli.json,
        date_format: config.display.date_format.clone(),
    };

    match cli.command {
        Commands::Add {
            name,
            dose,
            diuretic,
            category,
            at,
        } => cmd_add(&store, name, dose.into(), diuretic, category, at),
        Commands::ChangeDose { name, dose, at } => {
            cmd_edit(&store, &name, |ledger, id| {
                ledger.change_dosage(id, dose.into(), effective(at))
            })?;
            println!("✓ Dose changed for {}", name);
            Ok(())
        }
        Commands::Archive { name, at } => {
            cmd_edit(&store, &name, |ledger, id| ledger.archive(id, effective(at)))?;
            println!("✓ Archived {}", name);
            Ok(())
        }
        Commands::Reactivate { name, dose, at } => {
            cmd_edit(&store, &name, |ledger, id| {
                ledger.reactivate(id, dose.into(), effective(at))
            })?;
            println!("✓ Reactivated {}", name);
            Ok(())
        }
        Commands::List { all } => cmd_list(&store, all, &out),
        Commands::Snapshot { date } => {
            cmd_snapshot(&store, date.unwrap_or_else(today), &out)
        }
        Commands::Timeline { from, to, all } => {
            let range = timeline_range(from, to, all, &config);
            cmd_timeline(&store, range, &out)
        }
        Commands::Compare { from, to } => cmd_compare(&store, from, to, &out),
        Commands::Export { what } => cmd_export(&store, what),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Midnight UTC on the given day, or now
fn effective(at: Option<NaiveDate>) -> DateTime<Utc> {
    at.map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(Utc::now)
}

fn timeline_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    all: bool,
    config: &Config,
) -> Option<(NaiveDate, NaiveDate)> {
    let end = to.unwrap_or_else(today);
    match (from, all) {
        (Some(start), _) => Some((start, end)),
        (None, true) if to.is_none() => None,
        (None, true) => Some((NaiveDate::MIN, end)),
        (None, false) => {
            let window = Duration::days(i64::from(config.timeline.default_window_days));
            let start = end.checked_sub_signed(window).unwrap_or(NaiveDate::MIN);
            Some((start, end))
        }
    }
}

fn cmd_add(
    store: &JsonFileStore,
    name: String,
    dose: DoseSpec,
    diuretic: bool,
    category: Option<String>,
    at: Option<NaiveDate>,
) -> Result<()> {
    let category = match category {
        Some(key) => Some(MedicationCategory::from_key(&key).ok_or_else(|| {
            Error::Other(format!(
                "Unknown category: {}. Expected one of: {}",
                key,
                MedicationCategory::ALL
                    .iter()
                    .map(|c| c.key())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?),
        None => None,
    };

    store.update(|ledger| {
        if let Some(existing) = ledger.find_by_name(&name) {
            return Err(Error::Ledger(if existing.is_active {
                format!("{} is already in the ledger", existing.name)
            } else {
                format!(
                    "{} is archived; use `regimen reactivate {}` to restart it",
                    existing.name, existing.name
                )
            }));
        }
        ledger.add_medication(name.clone(), dose, diuretic, category, effective(at))
    })?;

    println!("✓ Added {}", name);
    Ok(())
}

fn cmd_edit<F>(store: &JsonFileStore, name: &str, f: F) -> Result<()>
where
    F: FnOnce(&mut Ledger, uuid::Uuid) -> Result<()>,
{
    store.update(|ledger| {
        let id = ledger
            .find_by_name(name)
            .map(|m| m.id)
            .ok_or_else(|| Error::Ledger(format!("No medication named {}", name)))?;
        f(ledger, id)
    })
}

fn cmd_list(store: &JsonFileStore, all: bool, out: &Output) -> Result<()> {
    let ledger = store.load()?;
    let medications: Vec<&Medication> = ledger
        .medications()
        .iter()
        .filter(|m| all || m.is_active)
        .collect();

    if out.json {
        println!("{}", serde_json::to_string_pretty(&medications)?);
        return Ok(());
    }

    if medications.is_empty() {
        println!("No medications recorded.");
        return Ok(());
    }

    for med in medications {
        let current = med
            .open_period()
            .map(|p| format!("{} {}", p.dosage_text(), p.schedule))
            .unwrap_or_else(|| med.header_dosage_text());
        let status = if med.is_active { "" } else { " (archived)" };
        println!("  {}{}: {}", med.name, status, current);
    }
    Ok(())
}

fn cmd_snapshot(store: &JsonFileStore, date: NaiveDate, out: &Output) -> Result<()> {
    let ledger = store.load()?;
    let snapshot = regimen_as_of(date, &ledger);

    if out.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Regimen on {}", out.date(date));
    if snapshot.is_empty() {
        println!("  (no medications)");
    }
    for med in &snapshot.medications {
        let marker = if med.is_diuretic { " [diuretic]" } else { "" };
        println!(
            "  {} {} {}{} (since {})",
            med.name,
            med.dosage_text(),
            med.schedule,
            marker,
            out.date(med.period_start.date_naive())
        );
    }
    Ok(())
}

fn cmd_timeline(
    store: &JsonFileStore,
    range: Option<(NaiveDate, NaiveDate)>,
    out: &Output,
) -> Result<()> {
    let ledger = store.load()?;
    let events = match range {
        Some((start, end)) => timeline_between(start, end, &ledger),
        None => timeline(&ledger),
    };

    if out.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No changes recorded.");
    }
    for event in &events {
        let detail = match (&event.previous_dosage, &event.new_dosage) {
            (Some(previous), Some(new)) => format!("{} → {}", previous, new),
            (None, Some(new)) => new.clone(),
            (Some(previous), None) => previous.clone(),
            (None, None) => String::new(),
        };
        println!(
            "  {}  {:<13} {} {}",
            out.date(event.date.date_naive()),
            event.kind.label(),
            event.medication_name,
            detail
        );
    }
    Ok(())
}

fn cmd_compare(store: &JsonFileStore, from: NaiveDate, to: NaiveDate, out: &Output) -> Result<()> {
    let ledger = store.load()?;
    let rows = compare(&regimen_as_of(from, &ledger), &regimen_as_of(to, &ledger));

    if out.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Changes from {} to {}", out.date(from), out.date(to));
    if rows.is_empty() {
        println!("  (no medications on either date)");
    }
    for row in &rows {
        println!(
            "  {:<13} {}: {} → {}",
            row.change.label(),
            row.medication_name,
            row.start_dosage,
            row.end_dosage
        );
    }
    Ok(())
}

fn cmd_export(store: &JsonFileStore, what: ExportCommands) -> Result<()> {
    let ledger = store.load()?;

    match what {
        ExportCommands::Timeline { from, to, out } => {
            let events = match (from, to) {
                (None, None) => timeline(&ledger),
                (from, to) => timeline_between(
                    from.unwrap_or(NaiveDate::MIN),
                    to.unwrap_or(NaiveDate::MAX),
                    &ledger,
                ),
            };
            let count = export::write_timeline_csv(&events, File::create(&out)?)?;
            println!("✓ Exported {} events to {}", count, out.display());
        }
        ExportCommands::Compare { from, to, out } => {
            let rows = compare(&regimen_as_of(from, &ledger), &regimen_as_of(to, &ledger));
            let count = export::write_comparison_csv(&rows, File::create(&out)?)?;
            println!("✓ Exported {} rows to {}", count, out.display());
        }
    }
    Ok(())
}

struct Output {
    json: bool,
    date_format: String,
}

impl Output {
    fn date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}
