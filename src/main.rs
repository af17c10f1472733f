use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use easy_kit::config::KitConfig;
use easy_kit::loader::{DirSource, DocumentSource, HttpSource, KitSelection, load_documents};
use easy_kit::logging::init_logging;
use easy_kit::routes::{WizardRouteState, wizard_routes};
use easy_kit::schema::validate_steps;
use easy_kit::terminal;
use easy_kit::webhook::WebhookClient;
use easy_kit::wizard::WizardEngine;

#[derive(Parser)]
#[command(name = "easy-kit")]
#[command(about = "Step-by-step kit questionnaires with webhook-backed AI steps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through a module in the terminal
    Run(KitArgs),
    /// Serve a module over HTTP for a browser front end
    Serve {
        #[command(flatten)]
        kit: KitArgs,
        /// Port to listen on (overrides EASY_KIT_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load and validate a module without running it
    Check(KitArgs),
}

#[derive(Args)]
struct KitArgs {
    /// Kit identifier
    #[arg(long)]
    kit: String,
    /// Module identifier within the kit
    #[arg(long)]
    module: String,
    /// Local site directory (overrides EASY_KIT_SITE_DIR)
    #[arg(long, conflicts_with = "base_url")]
    site_dir: Option<PathBuf>,
    /// Base URL serving the site (overrides EASY_KIT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// Fallback webhook URL (overrides EASY_KIT_WEBHOOK_URL)
    #[arg(long)]
    webhook_url: Option<String>,
}

impl KitArgs {
    fn apply(&self, config: &mut KitConfig) {
        if let Some(dir) = &self.site_dir {
            config.site_dir = dir.clone();
            config.base_url = None;
        }
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(url) = &self.webhook_url {
            config.default_webhook_url = Some(url.clone());
        }
    }
}

fn document_source(config: &KitConfig) -> Box<dyn DocumentSource> {
    match &config.base_url {
        Some(url) => Box::new(HttpSource::new(url.clone())),
        None => Box::new(DirSource::new(config.site_dir.clone())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = KitConfig::from_env();
    let kit = match &cli.command {
        Command::Run(kit) | Command::Check(kit) => kit,
        Command::Serve { kit, port } => {
            if let Some(port) = port {
                config.port = *port;
            }
            kit
        }
    };
    kit.apply(&mut config);
    config.validate()?;

    let _guard = init_logging(config.log_dir.as_deref()).context("Failed to initialize logging")?;

    let selection = KitSelection::new(&kit.kit, &kit.module)?;
    let source = document_source(&config);
    let client = WebhookClient::new(config.webhook_timeout, config.default_webhook_url.clone());

    match cli.command {
        Command::Check(_) => {
            let documents = load_documents(source.as_ref(), &selection)
                .await
                .with_context(|| format!("Failed to load {}", source.describe()))?;
            let report = validate_steps(&documents.steps)?;
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            eprintln!(
                "{}/{}: {} steps, {} warnings",
                selection.kit,
                selection.module,
                documents.steps.len(),
                report.warnings.len()
            );
        }
        Command::Run(_) => {
            let mut engine = WizardEngine::load(source.as_ref(), selection, client)
                .await
                .with_context(|| format!("Failed to start session from {}", source.describe()))?;
            terminal::run(&mut engine).await?;
        }
        Command::Serve { .. } => {
            let state = match WizardEngine::load(source.as_ref(), selection, client).await {
                Ok(engine) => WizardRouteState::new(engine),
                Err(e) => {
                    tracing::error!(source = %source.describe(), "Failed to start session: {e}");
                    WizardRouteState::load_failed(e)
                }
            };
            let app = wizard_routes(state);
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
                .await
                .with_context(|| format!("Failed to bind port {}", config.port))?;
            tracing::info!(port = config.port, "Wizard HTTP server started");
            eprintln!("Easy Kit v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("   Wizard API: http://0.0.0.0:{}/api/wizard", config.port);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
