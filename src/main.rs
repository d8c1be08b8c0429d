use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use token_ring::{
    network::{
        direct::{demo_tokens, run_direct},
        http::{HttpConfig, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT},
        service::RingService,
    },
    ring::{DEFAULT_EDGE_CAPACITY, DEFAULT_RING_SIZE},
    LogSink, RingConfig, TokenEvent,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "token-ring")]
#[command(about = "A token ring of concurrently running nodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RingArgs {
    /// Number of nodes in the ring (at least 2)
    #[arg(short = 'n', long = "nodes", default_value_t = DEFAULT_RING_SIZE as u64,
          value_parser = clap::value_parser!(u64).range(2..))]
    nodes: u64,
    /// Node that receives injected tokens first (defaults to nodes / 2)
    #[arg(short = 'i', long = "ingress")]
    ingress: Option<usize>,
    /// Tokens each edge can hold before the sender waits
    #[arg(long = "edge-capacity", default_value_t = DEFAULT_EDGE_CAPACITY)]
    edge_capacity: usize,
}

impl RingArgs {
    fn config(&self) -> RingConfig {
        RingConfig {
            size: self.nodes as usize,
            ingress: self.ingress,
            edge_capacity: self.edge_capacity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ring behind the HTTP injection endpoint until Ctrl-C
    #[command(name = "serve")]
    Serve {
        #[command(flatten)]
        ring: RingArgs,
        /// Address to listen on
        #[arg(long = "host", default_value = DEFAULT_HTTP_HOST)]
        host: String,
        /// HTTP port
        #[arg(short = 'p', long = "port", default_value_t = DEFAULT_HTTP_PORT)]
        port: u16,
    },
    /// Inject the three sample tokens directly and wait for their outcome
    #[command(name = "demo")]
    Demo {
        #[command(flatten)]
        ring: RingArgs,
        /// Seconds to wait for the tokens to resolve
        #[arg(short = 't', long = "timeout-secs", default_value_t = 10)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { ring, host, port } => {
            let http = HttpConfig { host, port };
            let mut service = RingService::new(ring.config(), http, Arc::new(LogSink))
                .map_err(|e| format!("Failed to build ring: {}", e))?;

            let addr = service
                .start()
                .await
                .map_err(|e| format!("Failed to start: {}", e))?;
            info!(
                "Token ring of {} nodes is accepting tokens on http://{}",
                service.ring().size(),
                addr
            );

            if let Err(e) = service.run().await {
                error!("Ring service error: {}", e);
                return Err(format!("Ring service error: {}", e));
            }

            info!("Token ring shut down gracefully");
            Ok(())
        }
        Commands::Demo { ring, timeout_secs } => {
            let events = run_direct(
                ring.config(),
                demo_tokens(),
                Duration::from_secs(timeout_secs),
            )
            .await
            .map_err(|e| format!("Demo failed: {}", e))?;

            let accepted = events.iter().filter(|e| e.is_accepted()).count();
            info!(
                "Demo finished: {} accepted, {} expired",
                accepted,
                events.len() - accepted
            );
            for event in &events {
                if let TokenEvent::Accepted { remaining_hops, .. } = event {
                    info!("{:?} arrived with {} hops to spare", event.payload(), remaining_hops);
                }
            }
            Ok(())
        }
    }
}
