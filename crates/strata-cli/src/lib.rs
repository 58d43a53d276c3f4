//! The `strata` command line.
//!
//! Table models register themselves through inventory, so the models a
//! binary knows about are whatever it links. Applications that want
//! `strata plan` / `strata apply` over their own models build a tiny binary
//! that depends on their model crate and calls [`main`].

pub mod config;
mod report;

use facet::Facet;
use figue as args;
use strata::sql::Postgres;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use crate::config::Settings;
use crate::report::Style;

/// Postgres schema sync for Rust, powered by facet reflection.
#[derive(Facet, Debug)]
struct Cli {
    /// Show version information
    #[facet(args::named, args::short = 'V')]
    version: bool,

    /// Command to run
    #[facet(default, args::subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Facet, Debug)]
#[repr(u8)]
enum Commands {
    /// Show the tables, views and enum types in the database
    Inspect {
        /// Database connection URL
        #[facet(default, args::named)]
        database_url: Option<String>,
    },
    /// Compare registered table models to the database
    Plan {
        /// Database connection URL
        #[facet(default, args::named)]
        database_url: Option<String>,
    },
    /// Bring the database in line with registered table models
    Apply {
        /// Database connection URL
        #[facet(default, args::named)]
        database_url: Option<String>,
    },
}

type BoxError = Box<dyn std::error::Error>;

/// Parse the process arguments and run.
pub fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args_ref: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let result: Result<Cli, _> = args::from_slice(&args_ref)
        .into_result()
        .map(|output| output.value);

    match result {
        Ok(cli) => {
            if let Err(e) = run(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Err(err) if err.is_help() => {
            print!("{}", err.help_text().unwrap_or(""));
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), BoxError> {
    if cli.version {
        println!("strata {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(command) = cli.command else {
        let config = args::HelpConfig {
            program_name: Some("strata".to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            ..Default::default()
        };
        print!("{}", args::generate_help::<Cli>(&config));
        return Ok(());
    };

    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(command, Style::detect()))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn dispatch(command: Commands, style: Style) -> Result<(), BoxError> {
    match command {
        Commands::Inspect { database_url } => {
            let settings = settings(database_url)?;
            let client = connect(&settings, style).await?;
            let catalog = strata::db_first(&client, &settings.options).await?;
            print!("{}", report::catalog(&catalog, style));
        }
        Commands::Plan { database_url } => {
            let settings = settings(database_url)?;
            let Some(plan) = plan(&settings, style).await? else {
                return Ok(());
            };
            print!("{}", plan);
            if !plan.is_empty() {
                println!();
                println!("{}", plan.to_sql(&Postgres::default()));
            }
        }
        Commands::Apply { database_url } => {
            let settings = settings(database_url)?;
            let client = connect(&settings, style).await?;
            let Some(plan) = plan_with(&client, &settings, style).await? else {
                return Ok(());
            };
            print!("{}", plan);
            if strata::apply(&client, &plan, &Postgres::default()).await? {
                println!();
                println!(
                    "{}",
                    style.good(&format!("Applied {} statements.", plan.statement_count()))
                );
            }
        }
    }
    Ok(())
}

/// Load `.config/strata.styx` and resolve it against the flag and
/// environment.
fn settings(flag_url: Option<String>) -> Result<Settings, BoxError> {
    let _ = dotenvy::dotenv();

    let (config, path) = config::load()?;
    info!(config_path = %path.display(), "loaded config");
    let env_url = std::env::var("DATABASE_URL").ok();
    let settings = config::resolve(&config, config::project_root(&path), flag_url, env_url)?;
    Ok(settings)
}

async fn connect(settings: &Settings, style: Style) -> Result<Client, BoxError> {
    println!("{}", report::header(settings, style));

    let (client, connection) = tokio_postgres::connect(&settings.database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("connection error: {}", e);
        }
    });
    Ok(client)
}

async fn plan(settings: &Settings, style: Style) -> Result<Option<strata::Plan>, BoxError> {
    let client = connect(settings, style).await?;
    plan_with(&client, settings, style).await
}

/// `None` when no table models are linked into this binary.
async fn plan_with(
    client: &Client,
    settings: &Settings,
    style: Style,
) -> Result<Option<strata::Plan>, BoxError> {
    let descriptors = strata::table_descriptors();
    if descriptors.is_empty() {
        println!("{}", style.warn("No table models registered."));
        println!();
        println!("Define tables using #[facet(strata::table = \"name\")] on Facet structs,");
        println!(
            "then register them with: strata::inventory::submit!(strata::TableDef::new::<YourType>());"
        );
        return Ok(None);
    }
    let plan = strata::code_first(client, &settings.options, descriptors).await?;
    Ok(Some(plan))
}
