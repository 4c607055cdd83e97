//! Line-oriented wire codec for the request/response protocol peers and
//! clients speak over a TCP stream. Every line is ASCII and terminates with
//! a single `\n`; lengths are decimal, identifiers are lowercase hex. This
//! module only knows about `Read`/`Write`, never about sockets.

use crate::descriptor::{Locator, Peer};
use crate::error::Error;
use chord_core::Identifier;
use std::io::{BufRead, Read, Write};

/// A request as sent client → peer or peer → peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Find(Identifier),
    Accept(Identifier, u16),
    Get(Identifier),
    Put(Identifier, Vec<u8>),
    Ping(Identifier),
}

/// A response as sent peer → client or peer → peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The queried peer is responsible for the key.
    Me(Identifier),
    /// A closer peer is known; the caller should continue iterating.
    Peer(Identifier, Locator),
    /// No value for this key, or no such peer.
    None,
    /// The stored value for a `get`.
    Value(Vec<u8>),
    /// The current successor chain, answering an `accept`.
    Chain(Vec<Option<Peer>>),
    /// Acknowledges a `put`.
    Ok,
    /// Answers a `ping`.
    Pong,
    /// The request's operation was not recognized.
    Unknown,
}

pub fn write_request<W: Write>(w: &mut W, req: &Request) -> Result<(), Error> {
    match req {
        Request::Find(key) => write!(w, "find {:x}\n", key.value())?,
        Request::Get(key) => write!(w, "get {:x}\n", key.value())?,
        Request::Ping(key) => write!(w, "ping {:x}\n", key.value())?,
        Request::Accept(key, port) => {
            write!(w, "accept {:x}\n", key.value())?;
            write_length_prefixed(w, port.to_string().as_bytes())?;
        }
        Request::Put(key, value) => {
            write!(w, "put {:x}\n", key.value())?;
            write_length_prefixed(w, value)?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn read_request<R: BufRead>(r: &mut R) -> Result<Request, Error> {
    let line = read_line(r)?;
    let mut parts = line.splitn(2, ' ');
    let op = parts.next().ok_or(Error::BadMessage)?;
    let key = Identifier::from_hex(parts.next().ok_or(Error::BadMessage)?)?;
    match op {
        "find" => Ok(Request::Find(key)),
        "get" => Ok(Request::Get(key)),
        "ping" => Ok(Request::Ping(key)),
        "accept" => {
            let body = read_length_prefixed(r)?;
            let port = String::from_utf8(body)
                .map_err(|_| Error::BadMessage)?
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::BadMessage)?;
            Ok(Request::Accept(key, port))
        }
        "put" => {
            let value = read_length_prefixed(r)?;
            Ok(Request::Put(key, value))
        }
        _ => Err(Error::BadMessage),
    }
}

pub fn write_response<W: Write>(w: &mut W, resp: &Response) -> Result<(), Error> {
    match resp {
        Response::Me(id) => write!(w, "me {:x}\n", id.value())?,
        Response::Peer(id, locator) => write!(w, "peer {:x} {}\n", id.value(), locator)?,
        Response::None => write!(w, "none\n")?,
        Response::Value(value) => {
            write!(w, "value {}\n", value.len())?;
            w.write_all(value)?;
        }
        Response::Chain(entries) => {
            write!(w, "chain\n")?;
            for entry in entries {
                write_chain_entry(w, entry)?;
            }
        }
        Response::Ok => write!(w, "ok\n")?,
        Response::Pong => write!(w, "pong\n")?,
        Response::Unknown => write!(w, "unknown operation\n")?,
    }
    w.flush()?;
    Ok(())
}

fn write_chain_entry<W: Write>(w: &mut W, entry: &Option<Peer>) -> Result<(), Error> {
    match entry {
        Some(peer) => write!(w, "peer {:x} {}\n", peer.id.value(), peer.locator)?,
        None => write!(w, "none\n")?,
    }
    Ok(())
}

/// Reads a non-chain response. Use [`read_chain`] once the first line has
/// been identified as `chain` (i.e. after calling this would be wrong: this
/// function already consumes and interprets that first line itself).
pub fn read_response<R: BufRead>(r: &mut R) -> Result<Response, Error> {
    let line = read_line(r)?;
    let mut parts = line.splitn(3, ' ');
    let tag = parts.next().unwrap_or("");
    match tag {
        "me" => {
            let id = Identifier::from_hex(parts.next().ok_or(Error::BadMessage)?)?;
            Ok(Response::Me(id))
        }
        "peer" => {
            let id = Identifier::from_hex(parts.next().ok_or(Error::BadMessage)?)?;
            let locator = Locator::new(parts.next().ok_or(Error::BadMessage)?.to_string());
            Ok(Response::Peer(id, locator))
        }
        "none" => Ok(Response::None),
        "value" => {
            let len: usize = parts
                .next()
                .ok_or(Error::BadMessage)?
                .parse()
                .map_err(|_| Error::BadMessage)?;
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf)?;
            Ok(Response::Value(buf))
        }
        "chain" => Ok(Response::Chain(read_chain_entries(r)?)),
        "ok" => Ok(Response::Ok),
        "pong" => Ok(Response::Pong),
        _ => Ok(Response::Unknown),
    }
}

/// Reads the body of a `chain` response: zero or more `peer ...` / `none`
/// lines, until the peer closes its end of the connection.
fn read_chain_entries<R: BufRead>(r: &mut R) -> Result<Vec<Option<Peer>>, Error> {
    let mut entries = Vec::new();
    loop {
        let mut raw = String::new();
        let n = r.read_line(&mut raw)?;
        if n == 0 {
            break;
        }
        let line = raw.trim_end_matches('\n');
        if line.is_empty() {
            continue;
        }
        if line == "none" {
            entries.push(None);
            continue;
        }
        let mut parts = line.splitn(3, ' ');
        if parts.next() != Some("peer") {
            return Err(Error::BadMessage);
        }
        let id = Identifier::from_hex(parts.next().ok_or(Error::BadMessage)?)?;
        let locator = Locator::new(parts.next().ok_or(Error::BadMessage)?.to_string());
        entries.push(Some(Peer::new(id, locator)));
    }
    Ok(entries)
}

fn write_length_prefixed<W: Write>(w: &mut W, body: &[u8]) -> Result<(), Error> {
    write!(w, "{}\n", body.len())?;
    w.write_all(body)?;
    Ok(())
}

fn read_length_prefixed<R: BufRead>(r: &mut R) -> Result<Vec<u8>, Error> {
    let line = read_line(r)?;
    let len: usize = line.parse().map_err(|_| Error::BadMessage)?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads one line, stripping the trailing `\n`. An empty read (EOF before
/// any bytes) is a protocol error: every request and non-chain response
/// begins with a complete line.
fn read_line<R: BufRead>(r: &mut R) -> Result<String, Error> {
    let mut raw = String::new();
    let n = r.read_line(&mut raw)?;
    if n == 0 {
        return Err(Error::BadMessage);
    }
    Ok(raw.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip_request(req: Request) -> Request {
        let mut buf = Vec::new();
        write_request(&mut buf, &req).unwrap();
        let mut cursor = Cursor::new(buf);
        read_request(&mut cursor).unwrap()
    }

    fn round_trip_response(resp: Response) -> Response {
        let mut buf = Vec::new();
        write_response(&mut buf, &resp).unwrap();
        let mut cursor = Cursor::new(buf);
        read_response(&mut cursor).unwrap()
    }

    #[test]
    fn find_round_trips() {
        let req = Request::Find(Identifier::new(0x2a));
        assert_eq!(round_trip_request(req.clone()), req);
    }

    #[test]
    fn put_round_trips_with_body() {
        let req = Request::Put(Identifier::new(1), b"hello".to_vec());
        assert_eq!(round_trip_request(req.clone()), req);
    }

    #[test]
    fn accept_round_trips_port_as_length_prefixed_ascii() {
        let req = Request::Accept(Identifier::new(7), 4322);
        assert_eq!(round_trip_request(req.clone()), req);
    }

    #[test]
    fn me_response_round_trips() {
        let resp = Response::Me(Identifier::new(0x1000));
        assert_eq!(round_trip_response(resp.clone()), resp);
    }

    #[test]
    fn peer_response_round_trips() {
        let resp = Response::Peer(Identifier::new(5), Locator::new("10.0.0.1:4321"));
        assert_eq!(round_trip_response(resp.clone()), resp);
    }

    #[test]
    fn value_response_round_trips() {
        let resp = Response::Value(b"hi".to_vec());
        assert_eq!(round_trip_response(resp.clone()), resp);
    }

    #[test]
    fn chain_response_round_trips_with_empty_slot() {
        let resp = Response::Chain(vec![
            Some(Peer::new(Identifier::new(9), Locator::new("host:4321"))),
            None,
        ]);
        assert_eq!(round_trip_response(resp.clone()), resp);
    }

    #[test]
    fn empty_chain_round_trips() {
        let resp = Response::Chain(vec![]);
        assert_eq!(round_trip_response(resp.clone()), resp);
    }

    #[test]
    fn unknown_operation_is_rejected_as_bad_message() {
        let mut cursor = Cursor::new(b"bogus 2a\n".to_vec());
        assert!(read_request(&mut cursor).is_err());
    }

    #[test]
    fn ping_scenario_1_bytes_match_protocol() {
        // Scenario 1: client sends `ping 0\n`, expects `pong`.
        let mut buf = Vec::new();
        write_request(&mut buf, &Request::Ping(Identifier::new(0))).unwrap();
        assert_eq!(buf, b"ping 0\n");
    }
}
