//! `chord-node`: the command-line binary. Parses arguments, initializes
//! logging, builds the peer's configuration, joins an existing overlay if a
//! bootstrap peer was given, then serves forever. Everything that matters
//! lives in `chord-p2p`; this crate is the "external collaborator" layer
//! the core spec declines to re-specify in detail.

use chord_core::identifier::Identifier;
use chord_p2p::config::P2PConfig;
use chord_p2p::descriptor::Locator;
use chord_p2p::engine::{spawn_refresh_loop, PeerEngine};
use chord_p2p::server;
use clap::Parser;
use log::{error, info};
use std::process;
use std::sync::Arc;

/// A peer of a Chord distributed hash table.
#[derive(Parser, Debug)]
#[command(name = "chord-node", about = "A peer of a Chord distributed hash table")]
struct Args {
    /// Hexadecimal key for this node; picked at random if omitted.
    #[arg(long = "key")]
    key: Option<String>,

    /// Locator (host:port) of an existing DHT peer to join through.
    #[arg(long = "url")]
    url: Option<String>,

    /// Listening TCP port.
    #[arg(long = "port", default_value_t = chord_p2p::config::DEFAULT_PORT)]
    port: u16,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let key = match args.key.as_deref().map(Identifier::from_hex) {
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            error!("invalid -key argument: {}", e);
            process::exit(1);
        }
        None => None,
    };

    let mut config = P2PConfig::default();
    config.port = args.port;
    config.key = key;

    let engine = Arc::new(PeerEngine::new(config));

    if let Some(url) = args.url.as_deref() {
        let bootstrap = Locator::new(url.to_string());
        if let Err(e) = engine.connect(&bootstrap) {
            error!("failed to join overlay at {}: {}", bootstrap, e);
            process::exit(1);
        }
    }

    {
        let engine = engine.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("shutting down (peer {:x})", engine.self_id().value());
            process::exit(0);
        }) {
            error!("failed to install signal handler: {}", e);
        }
    }

    spawn_refresh_loop(engine.clone());

    info!("peer {:x} listening on port {}", engine.self_id().value(), engine.config().port);
    if let Err(e) = server::serve(engine) {
        error!("listener failed: {}", e);
        process::exit(1);
    }
}
