//! Outbound peer RPCs: one TCP connection per call, matching the source's
//! connect-send-receive-close model (there is no persistent peer session).
//! Every call is bounded by a deadline so an unreachable peer cannot wedge
//! the refresh loop or an iterative lookup (§5's SHOULD).

use crate::codec::{read_response, write_request, Request, Response};
use crate::descriptor::{Locator, Peer};
use crate::error::Error;
use chord_core::Identifier;
use std::io::BufReader;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

fn dial(locator: &Locator, timeout: Duration) -> Result<TcpStream, Error> {
    let addr = locator
        .as_str()
        .to_socket_addrs()?
        .next()
        .ok_or(Error::BadMessage)?;
    let stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

/// Sends `find key` and returns the raw reply (`me` or `peer`), letting the
/// caller drive the iterative resolver loop.
pub fn find(locator: &Locator, key: Identifier, timeout: Duration) -> Result<Response, Error> {
    let mut stream = dial(locator, timeout)?;
    write_request(&mut stream, &Request::Find(key))?;
    let mut reader = BufReader::new(stream);
    read_response(&mut reader)
}

/// Sends `accept self_id` with our listening port and returns the
/// responding peer's successor chain (before it prepended us).
pub fn accept(
    locator: &Locator,
    self_id: Identifier,
    port: u16,
    timeout: Duration,
) -> Result<Vec<Option<Peer>>, Error> {
    let mut stream = dial(locator, timeout)?;
    write_request(&mut stream, &Request::Accept(self_id, port))?;
    let mut reader = BufReader::new(stream);
    match read_response(&mut reader)? {
        Response::Chain(entries) => Ok(entries),
        _ => Err(Error::BadMessage),
    }
}

pub fn get(locator: &Locator, key: Identifier, timeout: Duration) -> Result<Option<Vec<u8>>, Error> {
    let mut stream = dial(locator, timeout)?;
    write_request(&mut stream, &Request::Get(key))?;
    let mut reader = BufReader::new(stream);
    match read_response(&mut reader)? {
        Response::Value(value) => Ok(Some(value)),
        Response::None => Ok(None),
        _ => Err(Error::BadMessage),
    }
}

pub fn put(locator: &Locator, key: Identifier, value: Vec<u8>, timeout: Duration) -> Result<(), Error> {
    let mut stream = dial(locator, timeout)?;
    write_request(&mut stream, &Request::Put(key, value))?;
    let mut reader = BufReader::new(stream);
    match read_response(&mut reader)? {
        Response::Ok => Ok(()),
        _ => Err(Error::BadMessage),
    }
}

pub fn ping(locator: &Locator, key: Identifier, timeout: Duration) -> Result<(), Error> {
    let mut stream = dial(locator, timeout)?;
    write_request(&mut stream, &Request::Ping(key))?;
    let mut reader = BufReader::new(stream);
    match read_response(&mut reader)? {
        Response::Pong => Ok(()),
        _ => Err(Error::BadMessage),
    }
}
