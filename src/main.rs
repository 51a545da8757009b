use access_projects::api::{format_api_error, AccessClient};
use access_projects::config::{read_document, Config};
use access_projects::driver;
use access_projects::resource::{MembershipResource, ProjectResource, Resource};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage JFrog Access projects and their memberships declaratively
#[derive(Parser, Debug)]
#[command(name = "access-projects", version = access_projects::VERSION, about, long_about = None)]
struct Args {
    /// Platform URL (overrides PROJECTS_URL and the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Access token (overrides PROJECTS_ACCESS_TOKEN and the config file)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage a project
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage a user membership (project_user)
    User {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Manage a group membership (project_group)
    Group {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Store connection settings in the config file
    Configure {
        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    #[command(flatten)]
    Resource(ResourceCommand),
    /// Check whether a project exists
    Exists { key: String },
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    /// Create or update the resource described by a configuration file
    Apply {
        /// Configuration file (.json, .yaml or .yml)
        #[arg(short, long)]
        file: PathBuf,
        /// State file
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Show the changes apply would make
    Plan {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Refresh the state file from the API and print it
    Read {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Delete the resource and its state file
    Delete {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Adopt an existing remote object into a state file
    Import {
        /// Project key, or project_key:name for memberships
        id: String,
        #[arg(short, long)]
        state: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| anyhow!("Failed to open log file {:?}: {}", log_path, e))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("access-projects {} started with log level: {:?}", access_projects::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("access-projects").join("access-projects.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".access-projects").join("access-projects.log");
    }
    PathBuf::from("access-projects.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err}");
            None
        }
    };

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_api_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load()
        .with_env()
        .with_overrides(args.url.clone(), args.access_token.clone());

    match args.command {
        Command::Configure { timeout_secs } => {
            let mut stored = Config::load().with_overrides(args.url, args.access_token);
            if timeout_secs.is_some() {
                stored.timeout_secs = timeout_secs;
            }
            stored.save()?;
            println!("Saved {:?}", Config::config_path().unwrap_or_default());
            Ok(())
        }
        Command::Project {
            command: ProjectCommand::Exists { key },
        } => {
            let client = connect(&config)?;
            let exists = ProjectResource.exists(&client, &key).await?;
            println!("{}", exists);
            Ok(())
        }
        Command::Project {
            command: ProjectCommand::Resource(command),
        } => run_resource(&ProjectResource, &config, command).await,
        Command::User { command } => run_resource(&MembershipResource::users(), &config, command).await,
        Command::Group { command } => run_resource(&MembershipResource::groups(), &config, command).await,
    }
}

fn connect(config: &Config) -> Result<AccessClient> {
    AccessClient::new(&config.effective_url()?, &config.effective_token(), config.timeout())
}

async fn run_resource<R: Resource>(resource: &R, config: &Config, command: ResourceCommand) -> Result<()> {
    match command {
        ResourceCommand::Plan { file, state } => {
            let desired: R::Attributes = read_document(&file)?;
            let prior = driver::load_state(&state)?;
            let changes = driver::plan(resource, prior.as_ref(), &desired)?;

            if changes.is_empty() {
                println!("No changes.");
            }
            for change in changes {
                println!("{}", change);
            }
            Ok(())
        }
        ResourceCommand::Apply { file, state } => {
            let desired: R::Attributes = read_document(&file)?;
            let prior = driver::load_state(&state)?;
            let client = connect(config)?;

            let data = driver::apply(resource, &client, prior, desired).await?;
            if data.id().is_none() {
                println!("Nothing to apply.");
                return Ok(());
            }

            driver::save_state(&state, &data)?;
            print_state(&data)
        }
        ResourceCommand::Read { state } => {
            let data = require_state::<R>(&state)?;
            let client = connect(config)?;

            let data = driver::refresh(resource, &client, data).await?;
            driver::save_state(&state, &data)?;
            print_state(&data)
        }
        ResourceCommand::Delete { state } => {
            let data = require_state::<R>(&state)?;
            let client = connect(config)?;

            driver::destroy(resource, &client, data).await?;
            std::fs::remove_file(&state)?;
            println!("Deleted.");
            Ok(())
        }
        ResourceCommand::Import { id, state } => {
            let client = connect(config)?;

            let data = driver::import(resource, &client, &id).await?;
            driver::save_state(&state, &data)?;
            print_state(&data)
        }
    }
}

fn require_state<R: Resource>(path: &Path) -> Result<access_projects::resource::ResourceData<R::Attributes>> {
    driver::load_state(path)?.ok_or_else(|| anyhow!("No state at {:?}; apply or import first", path))
}

fn print_state<T: serde::Serialize>(data: &access_projects::resource::ResourceData<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}
