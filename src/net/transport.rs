//! UDP network synchronizer
//!
//! One socket per process. A background receiver thread drains the socket
//! without blocking, decodes each datagram and drops it into the matching
//! single-slot mailbox: inputs on the host, state snapshots on the client.
//! The simulation thread sends directly on the shared socket and reads the
//! mailboxes once per tick.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::game::constants::net::{MAX_DATAGRAM_SIZE, RECV_IDLE_SLEEP_MS};
use crate::metrics::NetMetrics;
use crate::net::mailbox::Mailbox;
use crate::net::protocol::{decode, encode, InputMessage, NetMessage, ProtocolError, StateMessage};

/// Which end of the session this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authoritative simulation; receives inputs, sends state
    Host,
    /// Thin client; sends inputs, receives state
    Client,
}

/// Network errors. None of these end the process; the driver falls back to
/// local play.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("socket setup failed: {0}")]
    Socket(#[from] io::Error),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("could not resolve host address '{0}'")]
    Resolve(String),
    #[error("network synchronizer is disabled")]
    Disabled,
}

/// State shared with the receiver thread
struct Shared {
    running: AtomicBool,
    disabled: AtomicBool,
    /// Host only: the peer learned from the first input datagram
    client_addr: Mutex<Option<SocketAddr>>,
    inputs: Mailbox<InputMessage>,
    states: Mailbox<StateMessage>,
    metrics: Arc<NetMetrics>,
}

impl Shared {
    fn disable(&self) {
        if !self.disabled.swap(true, Ordering::AcqRel) {
            warn!("Network disabled; continuing without a peer");
        }
    }
}

/// Host or client end of a session
pub struct NetSync {
    role: Role,
    socket: Arc<UdpSocket>,
    /// Client only: where inputs go
    host_addr: Option<SocketAddr>,
    shared: Arc<Shared>,
    receiver: Option<JoinHandle<()>>,
}

impl NetSync {
    /// Bind the host socket and start receiving inputs
    pub fn host(bind_addr: SocketAddr) -> Result<Self, NetError> {
        let socket = UdpSocket::bind(bind_addr).map_err(|source| NetError::Bind {
            addr: bind_addr,
            source,
        })?;
        info!("Hosting on udp://{}", socket.local_addr()?);
        Self::start(Role::Host, socket, None)
    }

    /// Bind an ephemeral client socket that talks to `host_addr`
    pub fn client(host_addr: SocketAddr) -> Result<Self, NetError> {
        let unspecified = match host_addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let bind_addr = SocketAddr::new(unspecified, 0);
        let socket = UdpSocket::bind(bind_addr).map_err(|source| NetError::Bind {
            addr: bind_addr,
            source,
        })?;
        info!("Joining host at udp://{}", host_addr);
        Self::start(Role::Client, socket, Some(host_addr))
    }

    fn start(role: Role, socket: UdpSocket, host_addr: Option<SocketAddr>) -> Result<Self, NetError> {
        socket.set_nonblocking(true)?;
        let socket = Arc::new(socket);
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            disabled: AtomicBool::new(false),
            client_addr: Mutex::new(None),
            inputs: Mailbox::new(),
            states: Mailbox::new(),
            metrics: Arc::new(NetMetrics::new()),
        });

        let receiver = {
            let socket = socket.clone();
            let shared = shared.clone();
            thread::Builder::new()
                .name("net-rx".to_string())
                .spawn(move || receive_loop(role, &socket, &shared))?
        };

        Ok(Self {
            role,
            socket,
            host_addr,
            shared,
            receiver: Some(receiver),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    /// False once a socket-level failure has been seen
    pub fn is_enabled(&self) -> bool {
        !self.shared.disabled.load(Ordering::Acquire)
    }

    /// Host only: the client address, once an input has arrived
    pub fn client_addr(&self) -> Option<SocketAddr> {
        *self.shared.client_addr.lock()
    }

    pub fn metrics(&self) -> Arc<NetMetrics> {
        self.shared.metrics.clone()
    }

    /// Latest unread input (host), clearing the slot
    pub fn take_input(&self) -> Option<InputMessage> {
        match self.role {
            Role::Host => self.shared.inputs.take(),
            Role::Client => None,
        }
    }

    /// Latest unread snapshot (client), clearing the slot
    pub fn take_state(&self) -> Option<StateMessage> {
        match self.role {
            Role::Client => self.shared.states.take(),
            Role::Host => None,
        }
    }

    /// Client heartbeat; a no-op on the host
    pub fn send_input(&self, input: InputMessage) -> Result<(), NetError> {
        let Some(host_addr) = self.host_addr.filter(|_| self.role == Role::Client) else {
            return Ok(());
        };
        let bytes = encode(&NetMessage::Input(input))?;
        self.send_to(&bytes, host_addr)
    }

    /// Send a full snapshot to the client. Returns `Ok(false)` while no
    /// client is known yet.
    pub fn broadcast_state(&self, state: &StateMessage) -> Result<bool, NetError> {
        if self.role != Role::Host {
            return Ok(false);
        }
        let Some(client) = self.client_addr() else {
            return Ok(false);
        };
        let bytes = encode(&NetMessage::State(state.clone()))?;
        self.send_to(&bytes, client)?;
        Ok(true)
    }

    fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> Result<(), NetError> {
        if !self.is_enabled() {
            return Err(NetError::Disabled);
        }
        match self.socket.send_to(bytes, addr) {
            Ok(len) => {
                self.shared.metrics.record_sent(len);
                Ok(())
            }
            // Send buffer full: the datagram is simply lost, like any other
            Err(e) if is_transient(&e) => {
                NetMetrics::incr(&self.shared.metrics.send_failures);
                Ok(())
            }
            Err(e) => {
                NetMetrics::incr(&self.shared.metrics.send_failures);
                warn!("Send to {} failed: {}", addr, e);
                self.shared.disable();
                Err(NetError::Send(e))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_disable(&self) {
        self.shared.disable();
    }

    /// Stop the receiver thread and wait for it to exit
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                warn!("Network receiver thread panicked");
            }
        }
    }
}

impl Drop for NetSync {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

fn receive_loop(role: Role, socket: &UdpSocket, shared: &Shared) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let idle = Duration::from_millis(RECV_IDLE_SLEEP_MS);

    while shared.running.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                shared.metrics.record_received(len);
                handle_datagram(role, shared, &buf[..len], from);
            }
            Err(e) if is_transient(&e) => thread::sleep(idle),
            Err(e) => {
                warn!("Receive failed: {}", e);
                shared.disable();
                break;
            }
        }
    }
    debug!("Network receiver stopped");
}

fn handle_datagram(role: Role, shared: &Shared, data: &[u8], from: SocketAddr) {
    let message = match decode(data) {
        Ok(message) => message,
        Err(e) => {
            debug!("Dropping datagram from {}: {}", from, e);
            NetMetrics::incr(&shared.metrics.decode_failures);
            return;
        }
    };

    let evicted = match (role, message) {
        (Role::Host, NetMessage::Input(input)) => {
            {
                let mut client = shared.client_addr.lock();
                match *client {
                    None => {
                        info!("Client connected from {}", from);
                        *client = Some(from);
                    }
                    Some(known) if known != from => {
                        debug!("Ignoring input from second peer {}", from);
                        NetMetrics::incr(&shared.metrics.ignored);
                        return;
                    }
                    Some(_) => {}
                }
            }
            shared.inputs.post(input)
        }
        (Role::Client, NetMessage::State(state)) => shared.states.post(state),
        _ => {
            NetMetrics::incr(&shared.metrics.ignored);
            return;
        }
    };

    if evicted {
        NetMetrics::incr(&shared.metrics.overwritten);
    }
}

/// Resolve `ip`, `ip:port`, `host` or `host:port`, filling in `default_port`
pub fn resolve_host(addr: &str, default_port: u16) -> Result<SocketAddr, NetError> {
    let addr = addr.trim();
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Ok(sock);
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    let resolved = if addr.contains(':') {
        addr.to_socket_addrs()
    } else {
        (addr, default_port).to_socket_addrs()
    };
    resolved
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| NetError::Resolve(addr.to_string()))
}
