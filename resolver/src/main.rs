use anyhow::Context;
use clap::Parser;
use dms_resolver::{Resolver, ResolverConfig, UdpTransport};
use dns_message::Type;
use std::net::Ipv4Addr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dms-resolver")]
#[command(version)]
#[command(about = "Resolve a name to an IPv4 address by walking down from a root server")]
struct Cli {
    /// Domain name to resolve
    name: String,

    /// Record type to ask for (A, NS, ... or a type number)
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: Type,

    /// Root server to start from
    #[arg(short = 'r', long)]
    root: Option<Ipv4Addr>,

    /// Port nameservers are queried on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Receive buffer size in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Maximum queries for a single name
    #[arg(long)]
    max_hops: Option<usize>,

    /// Maximum nesting of nameserver lookups
    #[arg(long)]
    max_depth: Option<usize>,

    /// Accept replies with the wrong id or without the response flag
    #[arg(long)]
    no_verify: bool,

    /// Log level (trace, debug, info, warn, error), RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::default();
        if let Some(root) = self.root {
            config.root_server = root;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(size) = self.buffer_size {
            config.recv_buffer_size = size;
        }
        if let Some(hops) = self.max_hops {
            config.max_hops = hops;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        config.verify_responses = !self.no_verify;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config();
    info!("Starting from root server {}", config.root_server);

    let transport = UdpTransport::from_config(&config);
    let mut resolver = Resolver::new(config, transport);

    let ip = resolver
        .resolve(&cli.name, cli.record_type)
        .await
        .with_context(|| format!("could not resolve {}", cli.name))?;

    println!("{}", ip);
    Ok(())
}
