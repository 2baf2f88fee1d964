use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use medlog_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medlog")]
#[command(about = "Medication intake tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a dose of a medicine
    Take {
        /// Medicine name (one of the configured cards)
        medicine: String,

        /// When the dose was taken (YYYY-MM-DDTHH:MM local, or RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,

        /// Skip the confirmation question
        #[arg(long, short = 'y')]
        yes: bool,

        /// PIN, when recording requires one
        #[arg(long)]
        pin: Option<String>,
    },

    /// Show the dose history table
    History {
        /// Only show this medicine ("all" for every medicine)
        #[arg(long, default_value = "all")]
        medicine: String,

        /// Show every dose instead of the latest per medicine
        #[arg(long)]
        all: bool,
    },

    /// Show when each medicine was last taken
    Last,

    /// List medicines available for filtering
    Medicines,

    /// Change the time of a logged dose
    Edit {
        /// Id of the log entry
        id: i64,

        /// New time (YYYY-MM-DDTHH:MM local, or RFC 3339)
        #[arg(long)]
        at: String,

        /// Shared PIN; prompted for when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// Delete a logged dose
    Delete {
        /// Id of the log entry
        id: i64,

        /// Shared PIN; prompted for when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// Export the full history as CSV
    Export {
        /// Output file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    medlog_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let store = JsonFileStore::new(config.logs_path());
    let mut tracker = Tracker::from_config(store, &config);

    match cli.command {
        Some(Commands::Take {
            medicine,
            at,
            yes,
            pin,
        }) => cmd_take(&mut tracker, medicine, at, yes, pin),
        Some(Commands::History { medicine, all }) => cmd_history(&mut tracker, &medicine, all),
        Some(Commands::Last) => {
            print_last_taken(&tracker);
            Ok(())
        }
        Some(Commands::Medicines) => {
            println!("all");
            for name in tracker.filter_options() {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Edit { id, at, pin }) => cmd_edit(&mut tracker, id, &at, pin),
        Some(Commands::Delete { id, pin }) => cmd_delete(&mut tracker, id, pin),
        Some(Commands::Export { path }) => {
            let count = export_csv(tracker.logs(), &path)?;
            println!("✓ Exported {} logs to {}", count, path.display());
            Ok(())
        }
        None => {
            // Default to an overview of cards and latest doses
            print_last_taken(&tracker);
            println!();
            cmd_history(&mut tracker, "all", false)
        }
    }
}

type FileTracker = Tracker<JsonFileStore>;

fn cmd_take(
    tracker: &mut FileTracker,
    medicine: String,
    at: Option<String>,
    yes: bool,
    pin: Option<String>,
) -> Result<()> {
    let date_time = match at {
        Some(raw) => parse_time(&raw)?,
        None => Utc::now(),
    };

    let outcome = tracker.dispatch(
        Action::Record {
            medicine,
            date_time,
        },
        Utc::now(),
    )?;

    let pending = match &tracker.state().dialog {
        Dialog::ConfirmRecord {
            medicine,
            date_time,
        } => Some(format!(
            "Log {} at {}?",
            medicine,
            date_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        )),
        _ => None,
    };

    let outcome = match (outcome, pending) {
        (Outcome::DialogOpened, Some(question)) => {
            if tracker.policy().require_pin_to_record {
                println!("{}", question);
                pin_gate(tracker, pin, |pin| Action::ConfirmRecord { pin: Some(pin) })?
            } else if yes || confirm(&question)? {
                tracker.dispatch(Action::ConfirmRecord { pin: None }, Utc::now())?
            } else {
                tracker.dispatch(Action::Cancel, Utc::now())?
            }
        }
        (outcome, _) => outcome,
    };
    tracing::debug!(?outcome, "take finished");

    report(tracker, &outcome);
    Ok(())
}

fn cmd_history(tracker: &mut FileTracker, medicine: &str, all: bool) -> Result<()> {
    let filter = medicine
        .parse::<MedicineFilter>()
        .unwrap_or_default();
    tracker.dispatch(Action::SetFilter(filter), Utc::now())?;
    if all {
        tracker.dispatch(Action::ToggleView, Utc::now())?;
    }

    println!("{}", tracker.render_table(&Local));

    let state = tracker.state();
    let flag = if state.show_all { "" } else { " (--all)" };
    println!();
    println!(
        "Filter: {}   [{}{}]",
        state.filter,
        medlog_core::render::toggle_caption(state.show_all),
        flag
    );
    Ok(())
}

fn cmd_edit(tracker: &mut FileTracker, id: i64, at: &str, pin: Option<String>) -> Result<()> {
    let date_time = parse_time(at)?;

    // Unknown ids are a silent no-op
    if tracker.dispatch(Action::OpenEdit { log_id: id }, Utc::now())? != Outcome::DialogOpened {
        return Ok(());
    }

    let outcome = pin_gate(tracker, pin, |pin| Action::SaveEdit { pin, date_time })?;
    report(tracker, &outcome);
    Ok(())
}

fn cmd_delete(tracker: &mut FileTracker, id: i64, pin: Option<String>) -> Result<()> {
    if tracker.dispatch(Action::OpenDelete { log_id: id }, Utc::now())? != Outcome::DialogOpened {
        return Ok(());
    }

    if let Dialog::Delete { medicine, .. } = &tracker.state().dialog {
        println!("Delete {} entry {}?", medicine, id);
    }

    let outcome = pin_gate(tracker, pin, |pin| Action::ConfirmDelete { pin })?;
    report(tracker, &outcome);
    Ok(())
}

/// Drive an open PIN-gated dialog to completion
///
/// A PIN given on the command line gets one attempt. Otherwise the user is
/// prompted until the PIN matches or an empty line cancels.
fn pin_gate<F>(tracker: &mut FileTracker, pin: Option<String>, action: F) -> Result<Outcome>
where
    F: Fn(String) -> Action,
{
    if let Some(pin) = pin {
        let outcome = tracker.dispatch(action(pin), Utc::now())?;
        tracing::debug!(?outcome, "PIN from command line");
        if outcome == Outcome::PinRejected {
            tracker.dispatch(Action::Cancel, Utc::now())?;
            eprintln!("Incorrect PIN. Nothing was changed.");
            return Err(Error::Unauthorized);
        }
        return Ok(outcome);
    }

    loop {
        let Some(pin) = prompt_pin("PIN (empty to cancel): ")? else {
            return tracker.dispatch(Action::Cancel, Utc::now());
        };

        let outcome = tracker.dispatch(action(pin), Utc::now())?;
        tracing::debug!(?outcome, "PIN from prompt");
        if outcome != Outcome::PinRejected {
            return Ok(outcome);
        }
        eprintln!("Incorrect PIN. Try again.");
    }
}

fn report(tracker: &FileTracker, outcome: &Outcome) {
    match outcome {
        Outcome::Recorded(log) | Outcome::Edited(log) => {
            if let Some(message) = tracker.banner(Utc::now()) {
                println!("✓ {}", message);
            }
            println!("  Id: {}", log.id);
        }
        Outcome::Deleted(_) => {
            if let Some(message) = tracker.banner(Utc::now()) {
                println!("✓ {}", message);
            }
        }
        Outcome::DialogClosed => println!("Cancelled."),
        _ => {}
    }
}

fn print_last_taken(tracker: &FileTracker) {
    for label in tracker.render_last_taken(&Local) {
        println!("{}", label);
    }
}

/// Parse a user supplied time, either RFC 3339 or a local `YYYY-MM-DDTHH:MM`
fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| Error::Validation(format!("Unrecognised time: {}", raw)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::Validation(format!("Time does not exist locally: {}", raw)))
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(
        answer.as_deref().map(str::to_lowercase).as_deref(),
        Some("y") | Some("yes")
    ))
}

/// Read one trimmed line; `None` on end of input or an empty line
fn prompt_line(prompt: &str) -> Result<Option<String>> {
    let line = read_line(prompt)?;
    Ok(line
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty()))
}

/// Read a PIN exactly as typed, minus the line ending
fn prompt_pin(prompt: &str) -> Result<Option<String>> {
    let line = read_line(prompt)?;
    Ok(line.filter(|line| !line.is_empty()))
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        println!();
        return Ok(None);
    }

    let line = input.strip_suffix('\n').unwrap_or(&input);
    let line = line.strip_suffix('\r').unwrap_or(line);
    Ok(Some(line.to_string()))
}
