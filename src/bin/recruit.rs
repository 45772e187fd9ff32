//! `recruit` operator CLI.
//!
//! Configuration comes from `RECRUIT_*` environment variables (see
//! [`recruit::Config::from_env`]). Log verbosity follows `RECRUIT_LOG`
//! (default `info`); logs go to stderr.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use recruit::export::{default_export_file_name, export_csv};
use recruit::network::NetworkFlag;
use recruit::submission::{FormsRelayBackend, FORM_FIELD_MAP, RELAY_FIELD_MAP};
use recruit::{
    create_backend, open_store, validate, ApplicationFilter, ApplicationRecord, BackendConfig,
    Config, Field, FormController, SortKey, SubmitOutcome,
};

#[derive(Parser)]
#[command(name = "recruit")]
#[command(about = "Recruitment form intake operations")]
#[command(
    after_help = "Environment:\n  RECRUIT_BACKEND   embedded | database | relay | forms\n  RECRUIT_LOG       Log filter (default: info)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active backend and whether it is usable
    CheckConfig,
    /// Print the field → wire key table for the active backend and the catalog
    Fields,
    /// Validate a record (inline JSON, or @path to a JSON file)
    Validate { record: String },
    /// Run the full submit flow for a record
    Submit {
        /// Inline JSON, or @path to a JSON file
        record: String,
        /// Simulate no connectivity
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Send a canned test application straight to the backend
    TestSubmission,
    /// Run the forms relay connectivity probe
    Probe,
    /// List stored applications (direct-write backends)
    List {
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,
    },
    /// Export stored applications as CSV (direct-write backends)
    Export {
        /// Output path (default: applications-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Name,
    Position,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => SortKey::Newest,
            SortArg::Name => SortKey::Name,
            SortArg::Position => SortKey::Position,
        }
    }
}

fn read_record(arg: &str) -> anyhow::Result<ApplicationRecord> {
    let json = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&json).context("record is not a valid JSON object")
}

fn test_record() -> ApplicationRecord {
    ApplicationRecord::new()
        .with(Field::Name, "Test User")
        .with(Field::Email, "test@example.com")
        .with(Field::University, "VIT")
        .with(Field::Year, "2nd")
        .with(Field::Position, "Technical Team")
        .with(Field::Skills, "Testing the form submission functionality")
        .with(Field::Experience, "No previous experience - this is a test")
        .with(
            Field::Motivation,
            "This is a test submission to verify the form is working correctly",
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RECRUIT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Commands::CheckConfig => {
            let backend = create_backend(&config)?;
            println!("backend: {} ({})", config.backend.name(), backend.name());
            match backend.validate_configuration() {
                Ok(()) => println!("status:  configured"),
                Err(e) => bail!("status:  not configured: {}", e),
            }
        }
        Commands::Fields => {
            let map = match config.backend {
                BackendConfig::Forms { .. } => &FORM_FIELD_MAP,
                _ => &RELAY_FIELD_MAP,
            };
            for (field, key) in map.entries() {
                println!("{:<12} {}", field.as_str(), key);
            }
            for field in [Field::University, Field::Year, Field::Position] {
                let entries = config.catalog.entries(field).unwrap_or_default();
                let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
                println!("{}: {}", field, values.join(" | "));
            }
        }
        Commands::Validate { record } => {
            let record = read_record(&record)?;
            let result = validate(&record, &config.catalog);
            if result.is_valid() {
                println!("valid");
            } else {
                for (field, message) in result.errors() {
                    println!("{:<12} {}", field.as_str(), message);
                }
                bail!("{} field(s) failed validation", result.errors().len());
            }
        }
        Commands::Submit { record, offline } => {
            let record = read_record(&record)?;
            let controller = FormController::from_config(&config)?
                .with_network(Arc::new(NetworkFlag::new(!offline)));
            controller.load(record);

            match controller.submit().await {
                SubmitOutcome::Submitted { ack, notice } => {
                    println!("{}", notice.title);
                    println!("{}", notice.description);
                    if let Some(link) = notice.link {
                        println!("{}", link);
                    }
                    println!("acknowledgement: {}", ack);
                }
                SubmitOutcome::Failed { error, notice } => {
                    for (field, message) in controller.errors() {
                        println!("{:<12} {}", field.as_str(), message);
                    }
                    println!("{}: {}", notice.title, notice.description);
                    bail!(error);
                }
                SubmitOutcome::Ignored => bail!("a submission is already in flight"),
            }
        }
        Commands::TestSubmission => {
            let backend = create_backend(&config)?;
            backend.validate_configuration()?;
            info!(backend = backend.name(), "Sending test submission");
            let ack = backend.submit(&test_record()).await?;
            println!("test submission delivered: {}", ack);
        }
        Commands::Probe => match &config.backend {
            BackendConfig::Forms {
                form_url,
                probe_urls,
            } => {
                let backend = FormsRelayBackend::new(form_url.clone(), config.timeouts)?
                    .with_probe_urls(probe_urls.clone());
                backend.probe().await?;
                println!("probe ok ({} url(s))", probe_urls.len());
            }
            other => bail!("probe applies to the forms backend, active backend is {}", other.name()),
        },
        Commands::List {
            position,
            search,
            sort,
        } => {
            let store = open_store(&config.backend, &config.timeouts)?;
            store.check_configuration()?;
            let filter = ApplicationFilter {
                position,
                search,
                sort: sort.into(),
            };
            let applications = store.list(&filter).await?;
            for app in &applications {
                println!(
                    "{}  {:<24} {:<32} {:<6} {:<4} {}",
                    app.created_at.to_rfc3339(),
                    app.record.name,
                    app.record.email,
                    app.record.university,
                    app.record.year,
                    app.record.position
                );
            }
            println!("{} application(s)", applications.len());
        }
        Commands::Export { output } => {
            let store = open_store(&config.backend, &config.timeouts)?;
            store.check_configuration()?;
            let applications = store.list(&ApplicationFilter::default()).await?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(default_export_file_name(chrono::Utc::now().date_naive()))
            });
            let file = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            export_csv(&applications, std::io::BufWriter::new(file))?;
            println!("exported {} application(s) to {}", applications.len(), path.display());
        }
    }

    Ok(())
}
