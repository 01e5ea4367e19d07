pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();

    let prometheus_handle = init_telemetry(&config)?;

    match cli.command {
        Some(Commands::Serve) => {
            config.validate()?;
            cli::cmd_serve(config, prometheus_handle).await
        }

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Some(Commands::CheckConfig) => cmd_check_config(&config),

        Some(Commands::Score {
            topic,
            file,
            save_as,
        }) => cli::cmd_score(config, &topic, &file, save_as.as_deref()).await,

        Some(Commands::Draft {
            email,
            file,
            topic,
            every,
        }) => cli::cmd_draft(&config, &email, &file, &topic, every.as_deref()).await,

        Some(Commands::History {
            email,
            limit,
            drafts,
        }) => cli::cmd_history(&config, &email, limit, drafts).await,

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn init_telemetry(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder()
            .extra_field("env", config.general.environment.to_string())?;
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key, value)?;
        }

        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("Environment: {}", config.general.environment);
    println!("Database:    {}", config.general.database_url);
    println!("LLM:         {} ({})", config.llm.model, config.llm.base_url);

    let problems = config.problems();
    if problems.is_empty() {
        println!("✓ Configuration looks good");
    } else {
        println!("Problems:");
        for problem in &problems {
            println!("  ✗ {problem}");
        }
    }

    config.validate()
}
