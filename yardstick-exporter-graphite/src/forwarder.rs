use std::{
    io::{self, Write as _},
    net::{SocketAddr, TcpStream, ToSocketAddrs as _},
    time::Duration,
};

use tracing::debug;

/// Address of a Graphite plaintext listener.
#[derive(Clone, Debug)]
pub(crate) struct RemoteAddr(Vec<SocketAddr>);

impl RemoteAddr {
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.0
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        RemoteAddr(vec![addr])
    }
}

impl<'a> TryFrom<&'a str> for RemoteAddr {
    type Error = String;

    fn try_from(addr: &'a str) -> Result<Self, Self::Error> {
        match addr.to_socket_addrs() {
            Ok(addrs) => {
                let addrs: Vec<_> = addrs.collect();
                if addrs.is_empty() {
                    Err(format!("'{}' did not resolve to any address", addr))
                } else {
                    Ok(RemoteAddr(addrs))
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Forwarder configuration.
#[derive(Clone, Debug)]
pub(crate) struct ForwarderConfiguration {
    pub remote_addr: RemoteAddr,
    pub write_timeout: Duration,
}

fn connect(config: &ForwarderConfiguration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in config.remote_addr.addrs() {
        match TcpStream::connect_timeout(addr, config.write_timeout) {
            Ok(stream) => {
                stream.set_write_timeout(Some(config.write_timeout))?;
                stream.set_nodelay(true)?;
                debug!(%addr, "Connected to Graphite.");
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no remote address")))
}

pub(crate) enum ClientState {
    // Intermediate state during send attempts.
    Inconsistent,

    // Currently disconnected.
    Disconnected(ForwarderConfiguration),

    // Connected and ready to send.
    Ready(ForwarderConfiguration, TcpStream),
}

impl ClientState {
    pub fn new(config: ForwarderConfiguration) -> Self {
        ClientState::Disconnected(config)
    }

    /// Sends the whole payload, connecting first if necessary.
    ///
    /// A failed write drops the connection, so the next send reconnects.
    pub fn try_send(&mut self, payload: &[u8]) -> io::Result<()> {
        loop {
            let old_state = std::mem::replace(self, ClientState::Inconsistent);
            match old_state {
                ClientState::Inconsistent => unreachable!("transitioned _from_ inconsistent state"),
                ClientState::Disconnected(config) => match connect(&config) {
                    Ok(stream) => *self = ClientState::Ready(config, stream),
                    Err(e) => {
                        *self = ClientState::Disconnected(config);
                        return Err(e);
                    }
                },
                ClientState::Ready(config, mut stream) => {
                    let result = stream.write_all(payload).and_then(|()| stream.flush());
                    if result.is_ok() {
                        *self = ClientState::Ready(config, stream);
                    } else {
                        *self = ClientState::Disconnected(config);
                    }

                    return result;
                }
            };
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ClientState::Ready(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_addr() {
        let addr = RemoteAddr::try_from("127.0.0.1:2003").unwrap();
        assert_eq!(addr.addrs(), &[SocketAddr::from(([127, 0, 0, 1], 2003))]);

        assert!(RemoteAddr::try_from("not an address").is_err());
        assert!(RemoteAddr::try_from("127.0.0.1").is_err());
    }
}
