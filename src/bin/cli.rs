//! Opsdesk CLI
//!
//! Operator command-line interface for record management against the
//! configured backend, plus access-matrix inspection and a config check.

use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opsdesk::access::{self, Module, Role};
use opsdesk::config::{AppConfig, ENV_API_KEY, ENV_BACKEND_URL};
use opsdesk::error::{OpsdeskError, Result};
use opsdesk::records::{Filter, OrderBy, QueryOptions, RawRecordService, RecordService, RestBackend};

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "Agency operating system CLI")]
#[command(version)]
struct Cli {
    /// Backend project URL
    #[arg(long, env = ENV_BACKEND_URL)]
    backend_url: Option<String>,

    /// Public API key
    #[arg(long, env = ENV_API_KEY)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List records in a collection
    List {
        /// Collection name (e.g. projects, tasks, invoices)
        collection: String,
        /// Maximum number to return
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Filters as field=value; comma-separated values mean IN
        #[arg(short, long)]
        filter: Vec<String>,
        /// Sort field
        #[arg(short, long)]
        order: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Projection: comma-separated field list
        #[arg(short, long)]
        select: Option<String>,
    },
    /// Get a record by ID
    Get {
        collection: String,
        id: String,
    },
    /// Create a record from a JSON payload
    Create {
        collection: String,
        /// Row as a JSON object
        json: String,
    },
    /// Partially update a record
    Update {
        collection: String,
        id: String,
        /// Changed fields as a JSON object
        json: String,
    },
    /// Delete a record by ID
    Delete {
        collection: String,
        id: String,
    },
    /// Count records matching equality filters
    Count {
        collection: String,
        /// Filters as field=value
        #[arg(short, long)]
        filter: Vec<String>,
    },
    /// Show the access-matrix row for a role
    Modules {
        /// Role name (admin, manager, user, client; legacy labels accepted)
        role: String,
    },
    /// Check required configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Modules { role } => {
            let role = Role::from_str(&role)?;
            println!("{:<14} {:<6}", "module", "level");
            for module in Module::ALL {
                println!(
                    "{:<14} {:<6}",
                    module.as_str(),
                    access::level_for(role, module).as_str()
                );
            }
            return Ok(());
        }
        Commands::Check => {
            let checks = AppConfig::diagnose();
            let mut complete = true;
            for check in &checks {
                if check.present {
                    println!("ok      {}", check.var);
                } else {
                    complete = false;
                    println!("missing {}", check.var);
                    println!("        {}", check.hint);
                }
            }
            if !complete {
                std::process::exit(1);
            }
            println!("Configuration complete.");
            return Ok(());
        }
        command => {
            let config = match (cli.backend_url, cli.api_key) {
                (Some(backend_url), Some(api_key)) => AppConfig {
                    backend_url: backend_url.trim_end_matches('/').to_string(),
                    api_key,
                    demo_mode: false,
                },
                _ => AppConfig::from_env()?,
            };
            let backend = Arc::new(RestBackend::from_config(&config));
            run_record_command(command, backend).await?;
        }
    }

    Ok(())
}

async fn run_record_command(command: Commands, backend: Arc<RestBackend>) -> Result<()> {
    match command {
        Commands::List {
            collection,
            limit,
            filter,
            order,
            desc,
            select,
        } => {
            let records: RawRecordService = RecordService::new(backend, collection);
            let mut options = QueryOptions::new().limit(limit);
            if !filter.is_empty() {
                options = options.filter(parse_filters(&filter)?);
            }
            if let Some(field) = order {
                options = options.order_by(if desc {
                    OrderBy::desc(field)
                } else {
                    OrderBy::asc(field)
                });
            }
            if let Some(projection) = select {
                options = options.select(projection);
            }

            let rows = records.get_all(options).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        Commands::Get { collection, id } => {
            let records: RawRecordService = RecordService::new(backend, collection);
            match records.get_by_id(&id).await? {
                Some(row) => println!("{}", serde_json::to_string_pretty(&row)?),
                None => println!("null"),
            }
        }

        Commands::Create { collection, json } => {
            let payload: serde_json::Value = serde_json::from_str(&json)?;
            let records: RawRecordService = RecordService::new(backend, collection);
            let created = records.create(&payload).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }

        Commands::Update { collection, id, json } => {
            let changes: serde_json::Value = serde_json::from_str(&json)?;
            let records: RawRecordService = RecordService::new(backend, collection);
            let updated = records.update(&id, &changes).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }

        Commands::Delete { collection, id } => {
            let records: RawRecordService = RecordService::new(backend, collection.clone());
            records.delete(&id).await?;
            println!("Deleted {}/{}", collection, id);
        }

        Commands::Count { collection, filter } => {
            let records: RawRecordService = RecordService::new(backend, collection);
            let count = records.count(parse_filters(&filter)?).await?;
            println!("{}", count);
        }

        Commands::Modules { .. } | Commands::Check => unreachable!("handled in main"),
    }
    Ok(())
}

/// Parse repeated `field=value` arguments; comma-separated values become
/// IN filters.
fn parse_filters(args: &[String]) -> Result<Filter> {
    let mut filter = Filter::new();
    for arg in args {
        let (field, value) = arg.split_once('=').ok_or_else(|| {
            OpsdeskError::InvalidInput(format!("Invalid filter '{}'; expected field=value", arg))
        })?;
        if value.contains(',') {
            filter = filter.any(field, value.split(',').map(str::trim));
        } else {
            filter = filter.eq(field, value);
        }
    }
    Ok(filter)
}
