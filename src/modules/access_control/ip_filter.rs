//! Network-based client filtering.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::config::AccessControlConfig;
use super::error::{AccessControlError, AccessControlResult};

/// A parsed CIDR block with a pre-computed mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cidr {
    /// IPv4 network.
    V4 {
        /// Network address as u32.
        network: u32,
        /// Subnet mask as u32.
        mask: u32,
        /// Prefix length.
        prefix: u8,
    },
    /// IPv6 network.
    V6 {
        /// Network address as u128.
        network: u128,
        /// Subnet mask as u128.
        mask: u128,
        /// Prefix length.
        prefix: u8,
    },
}

impl Cidr {
    /// Check if an address falls inside this block.
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self, normalize(ip)) {
            (Self::V4 { network, mask, .. }, IpAddr::V4(v4)) => u32::from(v4) & mask == *network,
            (Self::V6 { network, mask, .. }, IpAddr::V6(v6)) => {
                u128::from(v6) & mask == *network
            },
            _ => false,
        }
    }

    /// Get the prefix length.
    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        match self {
            Self::V4 { prefix, .. } | Self::V6 { prefix, .. } => *prefix,
        }
    }

    fn parse_prefix(addr: &str, prefix: &str, max: u8) -> AccessControlResult<u8> {
        let prefix_len: u8 = prefix.parse().map_err(|_| {
            AccessControlError::InvalidCidr(format!("invalid prefix length in '{addr}'"))
        })?;

        if prefix_len > max {
            return Err(AccessControlError::InvalidCidr(format!(
                "prefix length must be 0-{max}, got {prefix_len}"
            )));
        }

        Ok(prefix_len)
    }
}

impl FromStr for Cidr {
    type Err = AccessControlError;

    /// Parse `a.b.c.d/n`, `x::y/n`, or a bare address (full-length prefix).
    fn from_str(addr: &str) -> AccessControlResult<Self> {
        let addr = addr.trim();
        let (ip_str, prefix) = match addr.split_once('/') {
            Some((ip, prefix)) => (ip, Some(prefix)),
            None => (addr, None),
        };

        let ip: IpAddr = ip_str
            .parse()
            .map_err(|_| AccessControlError::InvalidIpAddress(ip_str.to_string()))?;

        match ip {
            IpAddr::V4(v4) => {
                let prefix = match prefix {
                    Some(p) => Self::parse_prefix(addr, p, 32)?,
                    None => 32,
                };
                let mask = if prefix == 0 {
                    0
                } else {
                    !0u32 << (32 - prefix)
                };
                Ok(Self::V4 {
                    network: u32::from(v4) & mask,
                    mask,
                    prefix,
                })
            },
            IpAddr::V6(v6) => {
                let prefix = match prefix {
                    Some(p) => Self::parse_prefix(addr, p, 128)?,
                    None => 128,
                };
                let mask = if prefix == 0 {
                    0
                } else {
                    !0u128 << (128 - prefix)
                };
                Ok(Self::V6 {
                    network: u128::from(v6) & mask,
                    mask,
                    prefix,
                })
            },
        }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 {
                network, prefix, ..
            } => write!(f, "{}/{prefix}", std::net::Ipv4Addr::from(*network)),
            Self::V6 {
                network, prefix, ..
            } => write!(f, "{}/{prefix}", std::net::Ipv6Addr::from(*network)),
        }
    }
}

fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 => v4,
    }
}

/// Decides whether a client address is inside the allowed network.
#[derive(Debug, Clone)]
pub struct IpPolicy {
    /// Allowed network.
    allowed: Cidr,

    /// Whether proxy headers are honored.
    trust_proxy_headers: bool,

    /// Peers allowed to set proxy headers.
    trusted_proxies: Vec<Cidr>,
}

impl IpPolicy {
    /// Create a policy allowing a single network.
    #[must_use]
    pub fn new(allowed: Cidr) -> Self {
        Self {
            allowed,
            trust_proxy_headers: false,
            trusted_proxies: Vec::new(),
        }
    }

    /// Build the policy from configuration.
    pub fn from_config(config: &AccessControlConfig) -> AccessControlResult<Self> {
        let allowed = config.allowed_network.parse()?;
        let trusted_proxies = config
            .trusted_proxies
            .iter()
            .map(|p| p.parse())
            .collect::<AccessControlResult<Vec<Cidr>>>()?;

        Ok(Self {
            allowed,
            trust_proxy_headers: config.trust_proxy_headers,
            trusted_proxies,
        })
    }

    /// Get the allowed network.
    #[must_use]
    pub fn allowed(&self) -> &Cidr {
        &self.allowed
    }

    /// Check if a client address is authorized.
    ///
    /// An address that does not parse is never authorized.
    #[must_use]
    pub fn matches(&self, client_ip: &str) -> bool {
        client_ip
            .trim()
            .parse::<IpAddr>()
            .is_ok_and(|ip| self.allowed.contains(ip))
    }

    /// Resolve the client address, honoring proxy headers from trusted peers.
    ///
    /// `headers` must use lowercase names. Header values that are not valid
    /// addresses are ignored. With an empty `trusted_proxies` list no peer is
    /// trusted.
    #[must_use]
    pub fn client_ip(&self, direct_ip: &str, headers: &HashMap<String, String>) -> String {
        if !self.trust_proxy_headers {
            return direct_ip.to_string();
        }

        let trusted = direct_ip
            .parse::<IpAddr>()
            .is_ok_and(|ip| self.trusted_proxies.iter().any(|p| p.contains(ip)));
        if !trusted {
            return direct_ip.to_string();
        }

        // Leftmost entry is the original client
        if let Some(client_ip) = headers
            .get("x-forwarded-for")
            .and_then(|xff| xff.split(',').next())
            .map(str::trim)
        {
            if client_ip.parse::<IpAddr>().is_ok() {
                return client_ip.to_string();
            }
        }

        if let Some(real_ip) = headers.get("x-real-ip").map(|s| s.trim()) {
            if real_ip.parse::<IpAddr>().is_ok() {
                return real_ip.to_string();
            }
        }

        direct_ip.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(cidr: &str) -> IpPolicy {
        IpPolicy::new(cidr.parse().unwrap())
    }

    #[test]
    fn test_parse_cidr() {
        let cidr: Cidr = "192.168.1.0/24".parse().unwrap();
        assert_eq!(
            cidr,
            Cidr::V4 {
                network: 0xC0A8_0100,
                mask: 0xFFFF_FF00,
                prefix: 24,
            }
        );
        assert_eq!(cidr.to_string(), "192.168.1.0/24");

        // Host bits are masked off
        let cidr: Cidr = "10.1.2.3/8".parse().unwrap();
        assert_eq!(cidr.to_string(), "10.0.0.0/8");

        let cidr: Cidr = "192.168.56.1".parse().unwrap();
        assert_eq!(cidr.to_string(), "192.168.56.1/32");
    }

    #[test]
    fn test_parse_cidr_invalid() {
        assert!(matches!(
            "192.168.1.0/33".parse::<Cidr>(),
            Err(AccessControlError::InvalidCidr(_))
        ));
        assert!(matches!(
            "192.168.1/24".parse::<Cidr>(),
            Err(AccessControlError::InvalidIpAddress(_))
        ));
        assert!("10.0.0.0/abc".parse::<Cidr>().is_err());
        assert!("fe80::/129".parse::<Cidr>().is_err());
        assert!("".parse::<Cidr>().is_err());
    }

    #[test]
    fn test_single_host() {
        let policy = policy("192.168.56.1/32");
        assert!(policy.matches("192.168.56.1"));
        assert!(!policy.matches("192.168.56.2"));
        assert!(!policy.matches("10.0.0.1"));
    }

    #[test]
    fn test_network_range() {
        let policy = policy("10.0.0.0/8");
        assert!(policy.matches("10.0.0.1"));
        assert!(policy.matches("10.255.255.255"));
        assert!(!policy.matches("11.0.0.0"));
    }

    #[test]
    fn test_zero_prefix_matches_all_v4() {
        let policy = policy("0.0.0.0/0");
        assert!(policy.matches("1.2.3.4"));
        assert!(policy.matches("255.255.255.255"));
        assert!(!policy.matches("::1"));
    }

    #[test]
    fn test_ipv6() {
        let policy = policy("2001:db8::/32");
        assert!(policy.matches("2001:db8::1"));
        assert!(policy.matches("2001:db8:ffff::1"));
        assert!(!policy.matches("2001:db9::1"));
        assert!(!policy.matches("10.0.0.1"));
    }

    #[test]
    fn test_ipv4_mapped_address() {
        let policy = policy("127.0.0.1/32");
        assert!(policy.matches("::ffff:127.0.0.1"));
    }

    #[test]
    fn test_unparsable_address_denied() {
        let policy = policy("0.0.0.0/0");
        assert!(!policy.matches(""));
        assert!(!policy.matches("not-an-ip"));
        assert!(!policy.matches("300.1.1.1"));
    }

    #[test]
    fn test_client_ip_ignores_headers_by_default() {
        let policy = policy("10.0.0.0/8");
        let mut headers = HashMap::new();
        headers.insert("x-forwarded-for".to_string(), "10.0.0.5".to_string());

        assert_eq!(policy.client_ip("192.168.1.1", &headers), "192.168.1.1");
    }

    #[test]
    fn test_client_ip_from_proxy_headers() {
        let config = AccessControlConfig::new("10.0.0.0/8")
            .with_trusted_proxies(vec!["192.168.1.0/24".to_string()]);
        let policy = IpPolicy::from_config(&config).unwrap();

        let mut headers = HashMap::new();
        headers.insert(
            "x-forwarded-for".to_string(),
            "10.0.0.5, 192.168.1.1".to_string(),
        );

        assert_eq!(policy.client_ip("192.168.1.1", &headers), "10.0.0.5");
        // Untrusted peer
        assert_eq!(policy.client_ip("172.16.0.1", &headers), "172.16.0.1");

        let mut headers = HashMap::new();
        headers.insert("x-real-ip".to_string(), "10.0.0.6".to_string());
        assert_eq!(policy.client_ip("192.168.1.1", &headers), "10.0.0.6");

        let mut headers = HashMap::new();
        headers.insert("x-forwarded-for".to_string(), "garbage".to_string());
        assert_eq!(policy.client_ip("192.168.1.1", &headers), "192.168.1.1");
    }

    #[test]
    fn test_client_ip_without_trusted_proxies() {
        let mut config = AccessControlConfig::new("10.0.0.0/8");
        config.trust_proxy_headers = true;
        let policy = IpPolicy::from_config(&config).unwrap();

        let mut headers = HashMap::new();
        headers.insert("x-forwarded-for".to_string(), "10.0.0.5".to_string());
        assert_eq!(policy.client_ip("203.0.113.9", &headers), "203.0.113.9");
    }

    #[test]
    fn test_from_config_invalid() {
        let config = AccessControlConfig::new("not-a-cidr");
        assert!(IpPolicy::from_config(&config).is_err());
    }
}
