//! Request handler: the server-side dispatch that maps one parsed inbound
//! request to a routing or storage action on the peer engine and writes
//! back the response. Never panics on malformed input or an unknown
//! operation; those become a `BadMessage`/`Unknown` reply or the connection
//! is simply closed.

use crate::codec::{read_request, write_response, Request, Response};
use crate::descriptor::{Descriptor, Locator};
use crate::engine::PeerEngine;
use crate::error::Error;
use log::{debug, error, info};
use std::io::BufReader;
use std::net::{SocketAddr, TcpStream};

/// Handles exactly one request over `stream`, then returns: the source
/// speaks one request per connection, same as the protocol it emulates.
pub fn handle_connection(stream: TcpStream, engine: &PeerEngine) -> Result<(), Error> {
    let peer_addr = stream.peer_addr()?;
    let write_stream = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let request = match read_request(&mut reader) {
        Ok(req) => req,
        Err(_) => {
            // Protocol error: malformed framing. Reply with the "unknown
            // operation" marker rather than crashing or silently dropping
            // the connection.
            let mut writer = write_stream;
            return write_response(&mut writer, &Response::Unknown);
        }
    };
    let response = match dispatch(engine, request, peer_addr) {
        // A `put` that failed to reach the responsible peer has nothing
        // honest to report on this wire: there is no "put failed" tag, so
        // per §7 the connection is simply closed rather than sending `ok`
        // for a write that never landed anywhere.
        None => return Ok(()),
        Some(response) => response,
    };
    debug!("response: {:?}", response);
    let mut writer = write_stream;
    write_response(&mut writer, &response)
}

fn dispatch(engine: &PeerEngine, request: Request, peer_addr: SocketAddr) -> Option<Response> {
    Some(match request {
        Request::Find(key) => {
            info!("request: find {:x}", key.value());
            match engine.find_local(key) {
                Descriptor::Local => Response::Me(engine.self_id()),
                Descriptor::Remote(peer) => Response::Peer(peer.id, peer.locator),
            }
        }
        Request::Accept(new_id, port) => {
            info!("request: accept {:x}", new_id.value());
            let locator = Locator::new(format!("{}:{}", peer_addr.ip(), port));
            let chain = engine.accept(new_id, locator);
            Response::Chain(chain.into_iter().map(Some).collect())
        }
        Request::Get(key) => {
            info!("request: get {:x}", key.value());
            match engine.get(key) {
                Ok(Some(value)) => Response::Value(value),
                Ok(None) => Response::None,
                Err(e) => {
                    error!("get {:x} failed: {}", key.value(), e);
                    Response::None
                }
            }
        }
        Request::Put(key, value) => {
            info!("request: put {:x} ({} bytes)", key.value(), value.len());
            match engine.put(key, value) {
                Ok(()) => Response::Ok,
                Err(e) => {
                    error!("put {:x} failed: {}", key.value(), e);
                    return None;
                }
            }
        }
        Request::Ping(_) => {
            debug!("request: ping");
            Response::Pong
        }
    })
}
