mod config;
mod wiring;

use clap::{Parser, Subcommand};
use config::SwitchyardConfig;
use std::path::PathBuf;
use std::sync::Arc;
use switchyard_fabric::RoutingEnvelope;
use switchyard_gateway::{AppState, AuthConfig, GatewayServer};
use switchyard_vector::{ingest, ChunkConfig, EmbedMode, IngestConfig, Ingestor};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "switchyard", about = "Switchyard: task routing fabric and vector bus")]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "SWITCHYARD_CONFIG", default_value = "switchyard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chunk, embed and upsert a directory tree
    Ingest {
        /// Root directory to walk
        #[arg(env = "INGEST_ROOT", default_value = ".")]
        root: PathBuf,
        /// Target namespace (overrides config)
        #[arg(long, env = "NAMESPACE")]
        namespace: Option<String>,
        /// Vector bus base URL (overrides config)
        #[arg(long, env = "VECTOR_BUS_URL")]
        vector_bus: Option<String>,
        /// Vector bus bearer token (overrides config)
        #[arg(long, env = "VECTOR_BUS_BEARER", hide_env_values = true)]
        token: Option<String>,
        /// Embed through the vector service instead of locally
        #[arg(long, env = "USE_REMOTE_EMBED")]
        remote: bool,
        /// Embedding dimension
        #[arg(long)]
        dim: Option<usize>,
        /// Remote embedding model hint
        #[arg(long)]
        model: Option<String>,
        /// Batches in flight at once (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Route one task through the fabric and print the result
    Route {
        /// Task name, e.g. `dmn.orchestrate`
        task: String,
        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Target role
        #[arg(long)]
        role: Option<String>,
        /// Bearer token passed on to forwarded calls
        #[arg(long, hide_env_values = true, env = "SWITCHYARD_TOKEN")]
        token: Option<String>,
        #[arg(long, default_value = "CLI001")]
        source: String,
    },
    /// List the agent directory
    Agents,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = SwitchyardConfig::load(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let vectors = wiring::vector_service(&config).await?;
            let fabric = Arc::new(wiring::fabric(&config, vectors.clone())?);
            let auth = AuthConfig::new(config.security.api_keys.clone());
            let app = GatewayServer::build_with_auth(
                Arc::new(AppState { fabric, vectors }),
                &config.server.prefix,
                auth,
            );

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(%addr, prefix = %config.server.prefix, "Switchyard gateway listening");
            axum::serve(listener, app).await?;
        }
        Commands::Ingest {
            root,
            namespace,
            vector_bus,
            token,
            remote,
            dim,
            model,
            concurrency,
        } => {
            if vector_bus.is_some() {
                config.vector_bus.url = vector_bus;
            }
            if token.is_some() {
                config.vector_bus.token = token;
            }
            let vectors = wiring::vector_service(&config).await?;

            let section = &config.ingest;
            let mut settings = IngestConfig::new(root.clone())?;
            if let Some(pattern) = &section.include {
                settings = settings.with_include(pattern)?;
            }
            settings.namespace = namespace.unwrap_or_else(|| section.namespace.clone());
            settings.chunk = ChunkConfig::new(section.window, section.overlap)?;
            settings.embed_batch = section.embed_batch;
            settings.upsert_batch = section.upsert_batch;
            settings.concurrency = concurrency.unwrap_or(section.concurrency);
            settings.mode = if remote {
                EmbedMode::Remote {
                    dim: dim.unwrap_or(ingest::DEFAULT_REMOTE_DIMENSION),
                    model: model.unwrap_or_else(|| ingest::DEFAULT_REMOTE_MODEL.to_string()),
                }
            } else {
                EmbedMode::Deterministic {
                    dim: dim.unwrap_or(switchyard_vector::DEFAULT_DIMENSION),
                }
            };

            info!(root = %root.display(), namespace = %settings.namespace, "Starting ingestion");
            let report = Ingestor::new(vectors, settings).run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Route {
            task,
            payload,
            role,
            token,
            source,
        } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)
                .map_err(|e| anyhow::anyhow!("--payload is not valid JSON: {e}"))?;
            let vectors = wiring::vector_service(&config).await?;
            let fabric = wiring::fabric(&config, vectors)?;

            let mut envelope = RoutingEnvelope::new(task, payload).with_source(source);
            if let Some(role) = role {
                envelope = envelope.with_role(role);
            }
            if let Some(token) = token {
                envelope = envelope.with_token(token);
            }

            let result = fabric.route(envelope).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Agents => {
            let directory = wiring::directory(&config)?;
            println!("Agents:");
            for agent in directory.all() {
                let endpoint = agent.endpoint.as_deref().unwrap_or("-");
                let internal = if agent.internal { " (internal)" } else { "" };
                println!("  {:<12} {:<20} {endpoint}{internal}", agent.id, agent.role.as_str());
                if !agent.description.is_empty() {
                    println!("    {}", agent.description);
                }
                if !agent.capabilities.is_empty() {
                    let caps: Vec<&str> = agent.capabilities.iter().map(String::as_str).collect();
                    println!("    capabilities: {}", caps.join(", "));
                }
            }
            println!("\nTotal: {} agent(s)", directory.len());
        }
    }

    Ok(())
}
