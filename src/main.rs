use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use adaverse::config::ServerConfig;
use adaverse::import;
use adaverse::server::{AppState, create_router};
use adaverse::store::{SqliteStore, Store};
use adaverse::types::Role;
use adaverse::workflow;

#[derive(Parser)]
#[command(name = "adaverse")]
#[command(about = "Student project showcase server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and adaverse.toml
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Service key expected in the x-api-key header
        #[arg(long, env = "ADAVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Serve without a service key (local development only)
        #[arg(long)]
        insecure_no_api_key: bool,
    },

    /// Queue projects from a CSV export for review
    Import {
        /// CSV file with a Promotion,Participants,Category,Title,GithubUrl,DemoUrl,HasThumbnail header
        csv: PathBuf,

        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print a session token for it
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,

        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn open_initialized_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let db_path = data_dir.join("adaverse.db");
    if !db_path.exists() {
        bail!("Database not initialized. Run 'adaverse admin init' first.");
    }
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(data_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let db_path = data_dir.join("adaverse.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Database initialized at {}", db_path.display());
    if !store.has_admin_user()? {
        println!("No admin yet. Create one with 'adaverse admin user add --admin'.");
    }

    Ok(())
}

fn run_user_add(data_dir: &Path, name: &str, email: &str, admin: bool) -> anyhow::Result<()> {
    let store = open_initialized_store(data_dir)?;
    let role = if admin { Role::Admin } else { Role::User };

    let user = workflow::create_user(&store, name, email, role)?;
    let token = workflow::open_session(&store, &user.id, None)?;

    println!();
    println!("========================================");
    println!("Created {} '{}' ({})", user.role, user.name, user.id);
    println!("Session token (save this, it won't be shown again):");
    println!();
    println!("  {token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

fn run_import(csv: &Path, data_dir: &Path) -> anyhow::Result<()> {
    let store = open_initialized_store(data_dir)?;

    let rows = import::read_rows(csv)?;
    println!("Found {} project(s) to import", rows.len());

    let summary = import::import_rows(&store, rows)?;

    println!("Imported: {}", summary.imported);
    println!(
        "Skipped: {} ({} duplicate, {} without students, {} invalid)",
        summary.skipped(),
        summary.skipped_duplicate,
        summary.skipped_no_students,
        summary.failed.len()
    );
    for (title, reason) in &summary.failed {
        println!("  - {title}: {reason}");
    }

    Ok(())
}

async fn run_serve(
    data_dir: PathBuf,
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    insecure_no_api_key: bool,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(&data_dir)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if api_key.is_some() {
        config.api_key = api_key;
    }
    config.insecure_no_api_key |= insecure_no_api_key;

    let service_key = config.resolve_service_key()?;

    if !config.db_path().exists() {
        bail!("Database not initialized. Run 'adaverse admin init' first.");
    }
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let state = Arc::new(AppState::new(Arc::new(store), service_key));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("adaverse=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(&data_dir)?,
            AdminCommands::User {
                command:
                    UserCommands::Add {
                        name,
                        email,
                        admin,
                        data_dir,
                    },
            } => run_user_add(&data_dir, &name, &email, admin)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            api_key,
            insecure_no_api_key,
        } => run_serve(data_dir, host, port, api_key, insecure_no_api_key).await?,
        Commands::Import { csv, data_dir } => run_import(&csv, &data_dir)?,
    }

    Ok(())
}
