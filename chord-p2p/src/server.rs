//! The listener: accepts inbound connections and spawns one worker thread
//! per connection, matching the source's `ThreadingMixIn` unbounded-worker
//! model. A fixed-size pool was considered and rejected (see DESIGN.md):
//! the source places no bound on concurrent peers, and bounding it here
//! would be a behavior change beyond what the spec asks for.

use crate::engine::PeerEngine;
use crate::handler;
use log::{error, info, warn};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

/// Binds `host:port` and serves connections until the listener errors out
/// (e.g. the socket is closed). Each accepted connection is handled on its
/// own thread and carries exactly one request.
pub fn serve(engine: Arc<PeerEngine>) -> std::io::Result<()> {
    let addr = format!("{}:{}", engine.config().host, engine.config().port);
    let listener = TcpListener::bind(&addr)?;
    info!("listening on {}", addr);
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(e) => {
                warn!("failed to accept connection: {}", e);
                continue;
            }
        };
        let engine = engine.clone();
        thread::spawn(move || {
            if let Err(e) = handler::handle_connection(stream, &engine) {
                error!("request handling failed: {}", e);
            }
        });
    }
    Ok(())
}
