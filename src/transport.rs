//! Stream transport.
//!
//! The backend pushes JSON units over a long-lived duplex connection. Each
//! unit on the wire is length-prefixed: a u64 length in network byte order
//! followed by the body. The client is receive-only beyond the socket
//! handshake.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::anyhow;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Upper bound on a single wire unit; anything larger is a protocol error.
const MAX_MESSAGE_LEN: u64 = 64 * 1024 * 1024;

/// Events emitted by one live connection, in arrival order. The stream ends
/// with `Closed` or `Error`.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Opened,
    Message(Vec<u8>),
    Closed,
    Error(String),
}

/// Owning handle for one live connection.
pub trait TransportHandle {
    /// Best-effort close. Must not fail from the caller's point of view.
    fn shutdown(&mut self);
}

/// The seam between the connection manager and the actual transport.
/// Production uses [`TcpConnector`]; tests script their own.
pub trait Connector {
    fn open(&mut self, endpoint: &str)
        -> anyhow::Result<(Box<dyn TransportHandle>, Receiver<TransportEvent>)>;
}

/// Length-prefixed JSON over a plain TCP stream. A reader thread feeds the
/// per-connection event channel; dropping the receiver discards anything a
/// torn-down transport still produces.
pub struct TcpConnector {
    pub connect_timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

struct TcpHandle {
    stream: TcpStream,
}

impl TransportHandle for TcpHandle {
    fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Connector for TcpConnector {
    fn open(
        &mut self,
        endpoint: &str,
    ) -> anyhow::Result<(Box<dyn TransportHandle>, Receiver<TransportEvent>)> {
        let addr = endpoint
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow!("no address for endpoint {endpoint}"))?;

        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        let reader = stream.try_clone()?;

        let (tx, rx) = unbounded();
        let _ = tx.send(TransportEvent::Opened);
        thread::spawn(move || read_loop(reader, tx));

        Ok((Box::new(TcpHandle { stream }), rx))
    }
}

fn read_loop(mut stream: TcpStream, events: Sender<TransportEvent>) {
    loop {
        match read_varying_len(&mut stream) {
            Ok(Some(msg)) => {
                if events.send(TransportEvent::Message(msg)).is_err() {
                    // Receiver dropped: the subscription was torn down.
                    break;
                }
            }
            Ok(None) => {
                let _ = events.send(TransportEvent::Closed);
                break;
            }
            Err(e) => {
                let _ = events.send(TransportEvent::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Reads one length-prefixed unit. `Ok(None)` is a clean EOF at a message
/// boundary; EOF mid-unit is an error.
fn read_varying_len<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_data = [0u8; 8];
    match reader.read_exact(&mut len_data) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u64::from_be_bytes(len_data);
    if len > MAX_MESSAGE_LEN {
        return Err(io::Error::other(format!("oversized wire unit ({len} bytes)")));
    }

    let mut msg = vec![0u8; len as usize];
    reader.read_exact(&mut msg)?;

    Ok(Some(msg))
}

/// Writes one length-prefixed unit. The client itself is receive-only; this
/// exists for test harnesses standing in for the backend.
pub fn write_varying_len<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    let len = msg.len() as u64;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(msg)?;
    writer.flush()?;

    Ok(())
}
