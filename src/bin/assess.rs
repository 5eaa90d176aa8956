//! Assess CLI - Command-line interface for Safeguard Assess
//!
//! Commands:
//! - score: Score an answer file and print a report (batch mode)
//! - run: Apply NDJSON commands from stdin to one engine (streaming mode)
//! - questions: Print the questionnaire
//! - resources: Print support contacts
//! - doctor: Diagnose configuration and saved state

use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use safeguard_assess::resources::support_resources;
use safeguard_assess::types::Answers;
use safeguard_assess::{
    AssessmentError, DangerAssessmentEngine, IncidentUpdate, ReportEncoder, ScoringConfig,
    PRODUCER_NAME, SAFEGUARD_VERSION,
};

/// Assess - On-device danger assessment engine
#[derive(Parser)]
#[command(name = "assess")]
#[command(version = SAFEGUARD_VERSION)]
#[command(about = "Score danger assessments and manage incident logs", long_about = None)]
struct Cli {
    /// Custom scoring config (JSON). Defaults to the built-in Danger Assessment table.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an answer map and print a report (batch mode)
    Score {
        /// Answers file: JSON object of question id to bool (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Incidents file: JSON array of {date, severity, description}
        #[arg(long)]
        incidents: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Apply NDJSON commands from stdin (streaming mode)
    Run {
        /// Load engine state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file on exit
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Flush output after each response (`--flush false` to buffer)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Print the questionnaire
    Questions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print support contacts
    Resources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and saved state
    Doctor {
        /// Check a saved state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// One line of `run` input
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum StreamCommand {
    SetAnswer {
        question_id: String,
        answer: bool,
    },
    AddIncident {
        date: NaiveDate,
        severity: i32,
        #[serde(default)]
        description: String,
    },
    UpdateIncident {
        id: String,
        update: IncidentUpdate,
    },
    DeleteIncident {
        id: String,
    },
    Incidents,
    Result,
    Report,
    History,
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Clear,
}

#[derive(Deserialize)]
struct IncidentInput {
    date: NaiveDate,
    severity: i32,
    #[serde(default)]
    description: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AssessCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Score {
            input,
            incidents,
            output_format,
        } => cmd_score(config, &input, incidents.as_deref(), output_format),

        Commands::Run {
            load_state,
            save_state,
            flush,
        } => cmd_run(config, load_state.as_deref(), save_state.as_deref(), flush),

        Commands::Questions { json } => cmd_questions(&config, json),

        Commands::Resources { json } => cmd_resources(json),

        Commands::Doctor { state, json } => cmd_doctor(&config, state.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig, AssessCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(ScoringConfig::from_json(&json)?)
        }
        None => Ok(ScoringConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, AssessCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn cmd_score(
    config: ScoringConfig,
    input: &Path,
    incidents: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), AssessCliError> {
    let answers: Answers = serde_json::from_str(&read_input(input)?)?;

    let mut engine = DangerAssessmentEngine::with_config(config)?;
    for (question_id, answer) in &answers {
        engine.set_answer(question_id, *answer);
    }

    if let Some(path) = incidents {
        let records: Vec<IncidentInput> = serde_json::from_str(&fs::read_to_string(path)?)?;
        for record in records {
            engine.add_incident(record.date, record.severity, &record.description);
        }
    }

    let result = engine.get_assessment_result();
    let report = ReportEncoder::new().encode(&engine, &result);

    let output = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };
    println!("{output}");

    Ok(())
}

fn cmd_run(
    config: ScoringConfig,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
    flush: bool,
) -> Result<(), AssessCliError> {
    let mut engine = DangerAssessmentEngine::with_config(config)?;

    if let Some(path) = load_state {
        let state_json = fs::read_to_string(path)?;
        engine.load_state(&state_json)?;
    }

    let encoder = ReportEncoder::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let command: StreamCommand = serde_json::from_str(trimmed)
            .map_err(|e| AssessCliError::ParseError(format!("Failed to parse command: {e}")))?;

        let response = apply_command(&mut engine, &encoder, command)?;
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        if flush {
            stdout.flush()?;
        }
    }
    stdout.flush()?;

    if let Some(path) = save_state {
        let state_json = engine.save_state()?;
        fs::write(path, state_json)?;
    }

    Ok(())
}

fn apply_command(
    engine: &mut DangerAssessmentEngine,
    encoder: &ReportEncoder,
    command: StreamCommand,
) -> Result<serde_json::Value, AssessCliError> {
    let data = match command {
        StreamCommand::SetAnswer {
            question_id,
            answer,
        } => {
            engine.set_answer(&question_id, answer);
            serde_json::Value::Null
        }
        StreamCommand::AddIncident {
            date,
            severity,
            description,
        } => serde_json::to_value(engine.add_incident(date, severity, &description))?,
        StreamCommand::UpdateIncident { id, update } => {
            engine.update_incident(&id, update);
            serde_json::Value::Null
        }
        StreamCommand::DeleteIncident { id } => {
            engine.delete_incident(&id);
            serde_json::Value::Null
        }
        StreamCommand::Incidents => serde_json::to_value(engine.get_incidents())?,
        StreamCommand::Result => serde_json::to_value(engine.get_assessment_result())?,
        StreamCommand::Report => {
            let result = engine.get_assessment_result();
            serde_json::to_value(encoder.encode(engine, &result))?
        }
        StreamCommand::History => serde_json::to_value(engine.get_assessment_history())?,
        StreamCommand::Range { start, end } => {
            serde_json::to_value(engine.get_assessments_by_date_range(start, end))?
        }
        StreamCommand::Clear => {
            engine.clear_assessment();
            serde_json::Value::Null
        }
    };

    Ok(serde_json::json!({ "ok": true, "data": data }))
}

fn cmd_questions(config: &ScoringConfig, json: bool) -> Result<(), AssessCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.questions)?);
        return Ok(());
    }

    println!("Questionnaire: {}", config.version);
    println!();
    for question in &config.questions {
        println!("{:>3}. [{}] {}", question.id, question.weight, question.text);
        if let Some(help) = &question.help_text {
            println!("       {help}");
        }
    }
    println!();
    let t = &config.thresholds;
    println!(
        "Max score {}. Tiers: variable < {} <= increased < {} <= severe < {} <= extreme",
        config.max_score(),
        t.increased,
        t.severe,
        t.extreme
    );

    Ok(())
}

fn cmd_resources(json: bool) -> Result<(), AssessCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(support_resources())?);
        return Ok(());
    }

    for group in support_resources() {
        println!("{}", group.title);
        for contact in group.contacts {
            println!("  {:<24} {}", contact.name, contact.number);
        }
        println!();
    }

    Ok(())
}

fn cmd_doctor(
    config: &ScoringConfig,
    state: Option<&Path>,
    json: bool,
) -> Result<(), AssessCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, SAFEGUARD_VERSION),
    });

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} ({} questions, max score {})",
                config.version,
                config.questions.len(),
                config.max_score()
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(path) = state {
        let check = if !path.exists() {
            DoctorCheck {
                name: "state".to_string(),
                status: CheckStatus::Warning,
                message: "State file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(path) {
                Ok(content) => {
                    let loaded = DangerAssessmentEngine::with_config(config.clone())
                        .and_then(|mut engine| engine.load_state(&content).map(|()| engine));
                    match loaded {
                        Ok(engine) => DoctorCheck {
                            name: "state".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "State file valid ({} incidents, {} assessments)",
                                engine.get_incidents().len(),
                                engine.get_assessment_history().len()
                            ),
                        },
                        Err(e) => DoctorCheck {
                            name: "state".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid state file: {e}"),
                        },
                    }
                }
                Err(e) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read state file: {e}"),
                },
            }
        };
        checks.push(check);
    }

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (interactive mode)".to_string()
        } else {
            "stdin is a pipe (streaming mode ready)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SAFEGUARD_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Assess Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AssessCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum AssessCliError {
    Io(io::Error),
    Assessment(AssessmentError),
    Json(serde_json::Error),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for AssessCliError {
    fn from(e: io::Error) -> Self {
        AssessCliError::Io(e)
    }
}

impl From<AssessmentError> for AssessCliError {
    fn from(e: AssessmentError) -> Self {
        AssessCliError::Assessment(e)
    }
}

impl From<serde_json::Error> for AssessCliError {
    fn from(e: serde_json::Error) -> Self {
        AssessCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AssessCliError> for CliError {
    fn from(e: AssessCliError) -> Self {
        match e {
            AssessCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AssessCliError::Assessment(AssessmentError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'assess doctor --config <file>' for details".to_string()),
            },
            AssessCliError::Assessment(e) => CliError {
                code: "ASSESSMENT_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            AssessCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AssessCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            AssessCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some(
                    "Each line must be a JSON object with an \"op\" field".to_string(),
                ),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
