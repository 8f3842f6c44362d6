use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use mesh_router::{
    InboundRequest, Labels, LocalRouterEvaluator, RoutingPipeline, ServiceInstanceRecord,
    config::{RouterConfig, RouterConfigValidator, loader::load_config},
    core::encode_labels,
    metrics, tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "mesh-router.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "mesh-router.toml")]
        config: String,
    },
    /// Route a JSON list of instances with the local router evaluator
    Route {
        /// Configuration file to use
        #[clap(short, long, default_value = "mesh-router.toml")]
        config: String,
        /// JSON file holding an array of service instances
        #[clap(short, long)]
        instances: String,
        /// Routing label `key=value`, sent as one encoded header value
        #[clap(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
        /// Raw routing-label header value, may be repeated
        #[clap(long = "header")]
        headers: Vec<String>,
        /// Transitive label `key=value` propagated from the caller
        #[clap(short, long = "transitive", value_parser = parse_label)]
        transitive: Vec<(String, String)>,
    },
    /// Print the encoded routing-label header value for the given labels
    Encode {
        /// Routing label `key=value`
        #[clap(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
}

fn parse_label(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Commands::Validate { config } => validate_config_command(&config).await,
        Commands::Init { config } => init_config_command(&config).await,
        Commands::Route {
            config,
            instances,
            labels,
            headers,
            transitive,
        } => route_command(&config, &instances, labels, headers, transitive).await,
        Commands::Encode { labels } => {
            let labels: Labels = labels.into_iter().collect();
            println!("{}", encode_labels(&labels)?);
            Ok(())
        }
    }
}

async fn route_command(
    config_path: &str,
    instances_path: &str,
    labels: Vec<(String, String)>,
    mut headers: Vec<String>,
    transitive: Vec<(String, String)>,
) -> Result<()> {
    let config = load_config(config_path).await?;
    RouterConfigValidator::validate(&config)
        .map_err(|e| eyre!("Configuration validation failed:\n{e}"))?;

    tracing_setup::init_tracing_with_config(&config.logging)?;
    metrics::init_metrics()?;

    let raw = tokio::fs::read_to_string(instances_path)
        .await
        .wrap_err_with(|| format!("Failed to read instances from {instances_path}"))?;
    let instances: Vec<ServiceInstanceRecord> = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse instances from {instances_path}"))?;

    if !labels.is_empty() {
        let labels: Labels = labels.into_iter().collect();
        headers.push(encode_labels(&labels)?);
    }

    let mut request = InboundRequest::default().with_transitive(transitive.into_iter().collect());
    for value in headers {
        request = request.with_header(config.label_header.clone(), value);
    }

    let pipeline = build_pipeline(&config);
    let target = instances
        .first()
        .map(|i| i.service.clone())
        .unwrap_or_default();
    let span = tracing_setup::create_route_span(&config.namespace, &target, "cli");
    let routed = span.in_scope(|| pipeline.route(instances, Some(&request)))?;
    span.record("instances.remaining", routed.len());

    println!("{}", serde_json::to_string_pretty(&routed)?);
    Ok(())
}

fn build_pipeline(config: &RouterConfig) -> RoutingPipeline {
    RoutingPipeline::new(
        config.identity(),
        config.flags(),
        config.label_header.clone(),
        Arc::new(LocalRouterEvaluator::new(config.location.clone())),
    )
}

async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:?}");
            std::process::exit(1);
        }
    };

    match RouterConfigValidator::validate(&config) {
        Ok(()) => {
            let flags = config.flags();
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Local Service: {}/{}", config.namespace, config.service);
            println!("   • Label Header: {}", config.label_header);
            println!("   • Metadata Router: {}", flags.metadata);
            println!("   • Nearby Router: {}", flags.nearby);
            println!("   • Rule-Based Router: {}", flags.rule_based);
            if let Some(location) = &config.location {
                println!("   • Location: {}/{}", location.region, location.zone);
            }
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# mesh-router configuration

# Identity of the calling service
namespace = "default"
service = "my-service"

# Header carrying percent-encoded JSON routing labels
label_header = "X-Router-Label"

[routers.metadata]
enabled = true

[routers.nearby]
enabled = false

[routers.rule_based]
enabled = true

# Location used by the nearby router
# [location]
# region = "eu"
# zone = "eu-1"

[logging]
level = "info"
json = false
"#;

    tokio::fs::write(path, default_config)
        .await
        .wrap_err_with(|| format!("Failed to write configuration to {config_path}"))?;

    println!("✅ Created default configuration at {config_path}");
    Ok(())
}
