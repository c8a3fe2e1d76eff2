//! apigen CLI
//!
//! Commands:
//! - `apigen api` - create or merge `<service>Param.api` and `<service>.api`
//! - `apigen logic` - write logic skeletons for the RPCs of a definition file

use apigen::config::{self, database_url, GeneratorConfig};
use apigen::{
    generate_api, generate_logic, key_source, load_definition, ArtifactStatus, ConfigError, GenError, LogicTarget, MySqlStore,
    PlaceholderEngine,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "apigen")]
#[command(author, version, about = "Generate .api contracts from a MySQL schema", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Flags override values from `--config` or the environment.
#[derive(Args)]
struct Settings {
    /// JSON config file (default: APIGEN_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for the .api artifacts
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Service name
    #[arg(short, long, global = true)]
    service: Option<String>,

    /// Comma-separated table names, or * for all
    #[arg(short, long, global = true)]
    tables: Option<String>,

    /// Comma-separated tables to skip
    #[arg(long, global = true)]
    ignore_tables: Option<String>,

    /// Comma-separated CRUD methods (insert, update, query, delete)
    #[arg(long, global = true)]
    crud: Option<String>,

    /// Definition (.proto) file
    #[arg(short, long, global = true)]
    proto: Option<PathBuf>,

    /// MySQL connection URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or merge the parameters and service artifacts
    Api,

    /// Write logic skeletons for the RPCs of the definition file
    Logic {
        /// Directory for the logic files
        #[arg(short, long)]
        logic_dir: Option<PathBuf>,
    },
}

impl Settings {
    fn var(&self, key: &str) -> Option<String> {
        match key {
            config::ENV_DIR => self.dir.as_ref().map(|p| p.display().to_string()),
            config::ENV_SERVICE => self.service.clone(),
            config::ENV_TABLES => self.tables.clone(),
            config::ENV_IGNORE_TABLES => self.ignore_tables.clone(),
            config::ENV_CRUD_METHODS => self.crud.clone(),
            config::ENV_PROTO_FILE => self.proto.as_ref().map(|p| p.display().to_string()),
            config::ENV_DATABASE_URL => self.database_url.clone(),
            _ => None,
        }
    }

    fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(dir) = &self.dir {
            config.dir = dir.clone();
        }
        if let Some(service) = &self.service {
            config.service_name = service.clone();
        }
        if let Some(tables) = &self.tables {
            config.tables = config::split_list(tables);
        }
        if let Some(ignore) = &self.ignore_tables {
            config.ignore_tables = config::split_list(ignore);
        }
        if let Some(crud) = &self.crud {
            config.crud_methods = config::split_list(crud);
        }
        if let Some(proto) = &self.proto {
            config.proto_file = Some(proto.clone());
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
    }

    fn load(&self) -> Result<GeneratorConfig, GenError> {
        let mut config = match &self.config {
            Some(path) => config::from_json_file(path)?,
            None => config::from_vars(|key| self.var(key).or_else(|| std::env::var(key).ok()))?,
        };
        self.apply(&mut config);
        config::validate(&config)?;
        Ok(config)
    }
}

async fn run(cli: Cli) -> Result<(), GenError> {
    let config = cli.settings.load()?;
    let definition = match &config.proto_file {
        Some(path) => Some(load_definition(path).await?),
        None => None,
    };

    match cli.command {
        Commands::Api => {
            let store = MySqlStore::connect(database_url(&config)?).await?;
            let report = generate_api(&store, &config, definition.as_ref()).await?;
            for artifact in [&report.params, &report.service] {
                match &artifact.status {
                    ArtifactStatus::Created => println!("created {}", artifact.path.display()),
                    ArtifactStatus::Merged { added } => {
                        println!("merged {} (+{})", artifact.path.display(), added.join(", "))
                    }
                    ArtifactStatus::Unchanged => println!("unchanged {}", artifact.path.display()),
                }
            }
        }
        Commands::Logic { logic_dir } => {
            let definition = definition.ok_or(ConfigError::Missing("proto_file"))?;
            let dir = logic_dir
                .or_else(|| config.logic_dir.clone())
                .unwrap_or_else(|| config.dir.join("logic"));
            let target = LogicTarget::new(dir, &config.service_name);
            let source = key_source(config.database_url.as_deref()).await;
            let report = generate_logic(source.as_ref(), &PlaceholderEngine, &definition, &target).await?;
            println!("{} logic files written, {} kept", report.written.len(), report.skipped.len());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("apigen=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            eprintln!("apigen: {}", e);
            ExitCode::FAILURE
        }
    }
}
