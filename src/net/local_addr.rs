//! Local address selection
//!
//! The receiver is told which address the sender streams from (SDP origin
//! and request URL). The address is picked by matching the receiver's
//! dotted-quad prefix against this host's addresses, which assumes a /24
//! style network. Kept isolated so it can be replaced with proper subnet
//! matching without touching the handshake.

use std::net::{IpAddr, ToSocketAddrs, UdpSocket};

/// Pick the local address on the receiver's network
///
/// Returns the first candidate whose text starts with `host` up to (not
/// including) its last `.`. Falls back to `host` itself when nothing
/// matches or `host` has no dot.
#[must_use]
pub fn select_local_address<I>(host: &str, candidates: I) -> String
where
    I: IntoIterator<Item = IpAddr>,
{
    let Some((network, _)) = host.rsplit_once('.') else {
        return host.to_string();
    };

    candidates
        .into_iter()
        .map(|ip| ip.to_string())
        .find(|ip| ip.starts_with(network))
        .unwrap_or_else(|| host.to_string())
}

/// Addresses this machine is known by
///
/// Resolves the machine's host name, then adds the source address the OS
/// routes to `host` through.
fn local_candidates(host: &str) -> Vec<IpAddr> {
    let mut candidates = Vec::new();

    match hostname::get() {
        Ok(name) => {
            let name = name.to_string_lossy().into_owned();
            match (name.as_str(), 0).to_socket_addrs() {
                Ok(addrs) => candidates.extend(addrs.map(|a| a.ip())),
                Err(e) => tracing::debug!(%name, error = %e, "host name did not resolve"),
            }
        }
        Err(e) => tracing::debug!(error = %e, "could not read host name"),
    }

    // Connecting a UDP socket sends nothing; it only picks a route
    let routed = UdpSocket::bind(("0.0.0.0", 0))
        .and_then(|socket| {
            socket.connect((host, 9))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip());
    if let Ok(ip) = routed {
        if !candidates.contains(&ip) {
            candidates.push(ip);
        }
    }

    candidates
}

/// Detect the local address to announce to `host`
#[must_use]
pub fn detect_local_address(host: &str) -> String {
    let local = select_local_address(host, local_candidates(host));
    tracing::debug!(%host, %local, "selected local address");
    local
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_matches_same_network() {
        let candidates = vec![v4(127, 0, 0, 1), v4(10, 0, 0, 5), v4(192, 168, 1, 20)];
        assert_eq!(
            select_local_address("192.168.1.50", candidates),
            "192.168.1.20"
        );
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = vec![v4(10, 0, 0, 7), v4(10, 0, 0, 5)];
        assert_eq!(select_local_address("10.0.0.2", candidates), "10.0.0.7");
    }

    #[test]
    fn test_fallback_to_host() {
        let candidates = vec![v4(172, 16, 0, 3)];
        assert_eq!(
            select_local_address("192.168.1.50", candidates),
            "192.168.1.50"
        );
        assert_eq!(select_local_address("10.0.0.2", Vec::new()), "10.0.0.2");
    }

    #[test]
    fn test_host_without_dot() {
        assert_eq!(
            select_local_address("airport", vec![v4(10, 0, 0, 1)]),
            "airport"
        );
    }

    #[test]
    fn test_prefix_is_textual() {
        // Textual prefix match: 192.168.10.x starts with "192.168.1"
        let candidates = vec![v4(192, 168, 10, 4)];
        assert_eq!(
            select_local_address("192.168.1.50", candidates),
            "192.168.10.4"
        );
    }

    #[test]
    fn test_detect_loopback() {
        assert_eq!(detect_local_address("127.0.0.1"), "127.0.0.1");
    }
}
