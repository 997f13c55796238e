//! Generator Configuration

use pktforge_common::{ForgeError, ForgeResult, MAX_PACKET_ENTRY, MAX_TEMPLATE_SIZE, UDP_FRAME_OVERHEAD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Which generator builds the template set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// Ethernet/IPv4/UDP frames
    Udp(UdpConfig),
    /// Pre-encoded frames
    Raw(RawConfig),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Udp(UdpConfig::default())
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> ForgeResult<()> {
        match self {
            GeneratorConfig::Udp(udp) => udp.validate(),
            GeneratorConfig::Raw(raw) => raw.validate(),
        }
    }
}

/// Ethernet MAC address, written as `aa:bb:cc:dd:ee:ff`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0; 6]);
    /// Locally administered default source address
    pub const LOCAL: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for MacAddr {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ForgeError::ConfigError(format!("invalid MAC address '{s}'"));
        let mut octets = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddr(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = ForgeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> String {
        mac.to_string()
    }
}

/// UDP generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub ttl: u8,
    /// UDP payload bytes per frame (ignored when `imix` is set)
    pub payload_size: usize,
    /// Mixed frame sizes
    pub imix: Option<ImixConfig>,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            src_mac: MacAddr::LOCAL,
            dst_mac: MacAddr::BROADCAST,
            src_ip: Ipv4Addr::new(192, 168, 1, 1),
            dst_ip: Ipv4Addr::new(192, 168, 1, 2),
            src_port: 1234,
            dst_port: 5678,
            ttl: 64,
            payload_size: 1024,
            imix: None,
        }
    }
}

impl UdpConfig {
    /// Largest payload that keeps a frame within one template
    pub const MAX_PAYLOAD: usize = MAX_TEMPLATE_SIZE - UDP_FRAME_OVERHEAD;

    pub fn validate(&self) -> ForgeResult<()> {
        match &self.imix {
            Some(imix) => imix.validate(),
            None if self.payload_size > Self::MAX_PAYLOAD => Err(ForgeError::ConfigError(format!(
                "payload_size {} exceeds maximum of {}",
                self.payload_size,
                Self::MAX_PAYLOAD
            ))),
            None => Ok(()),
        }
    }
}

/// IMIX frame size distribution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImixConfig {
    pub patterns: Vec<ImixPattern>,
}

/// One frame size and its share of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImixPattern {
    /// Full frame size in bytes, headers included
    pub size: u16,
    pub weight: u32,
}

impl ImixConfig {
    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.patterns.iter().map(|p| u64::from(p.weight)).sum()
    }

    pub fn validate(&self) -> ForgeResult<()> {
        for pattern in &self.patterns {
            let size = pattern.size as usize;
            if !(UDP_FRAME_OVERHEAD..=MAX_TEMPLATE_SIZE).contains(&size) {
                return Err(ForgeError::ConfigError(format!(
                    "imix size {} must be between {} and {}",
                    size, UDP_FRAME_OVERHEAD, MAX_TEMPLATE_SIZE
                )));
            }
        }
        let total = self.total_weight();
        if total == 0 {
            return Err(ForgeError::ConfigError(
                "imix needs at least one pattern with non-zero weight".into(),
            ));
        }
        if total > MAX_PACKET_ENTRY as u64 {
            return Err(ForgeError::ConfigError(format!(
                "imix total weight {} exceeds table capacity {}",
                total, MAX_PACKET_ENTRY
            )));
        }
        Ok(())
    }
}

/// Raw generator settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawConfig {
    pub templates: Vec<RawTemplate>,
}

impl RawConfig {
    pub fn validate(&self) -> ForgeResult<()> {
        if self.templates.is_empty() {
            return Err(ForgeError::ConfigError("raw generator needs at least one template".into()));
        }
        if self.templates.len() > MAX_PACKET_ENTRY {
            return Err(ForgeError::ConfigError(format!(
                "{} raw templates exceed table capacity {}",
                self.templates.len(),
                MAX_PACKET_ENTRY
            )));
        }
        for (i, template) in self.templates.iter().enumerate() {
            if template.length > MAX_TEMPLATE_SIZE {
                return Err(ForgeError::ConfigError(format!(
                    "template {} length {} exceeds maximum of {}",
                    i, template.length, MAX_TEMPLATE_SIZE
                )));
            }
        }
        Ok(())
    }
}

/// How raw template data is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Hex,
    Base64,
    /// `length` zero bytes; `data` is ignored
    Zeros,
}

/// One pre-encoded frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTemplate {
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub data: String,
    /// Frame length; longer data is truncated, shorter data is an error
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse() {
        let mac: MacAddr = "02:00:5e:10:00:ff".parse().unwrap();
        assert_eq!(mac.octets(), [0x02, 0x00, 0x5e, 0x10, 0x00, 0xff]);
        assert_eq!(mac.to_string(), "02:00:5e:10:00:ff");
        assert_eq!("aa-bb-cc-dd-ee-ff".parse::<MacAddr>().unwrap().0[5], 0xff);

        assert!("02:00:5e:10:00".parse::<MacAddr>().is_err());
        assert!("02:00:5e:10:00:ff:01".parse::<MacAddr>().is_err());
        assert!("zz:00:5e:10:00:ff".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_defaults() {
        let udp = UdpConfig::default();
        assert_eq!(udp.src_ip, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(udp.dst_port, 5678);
        assert_eq!(udp.payload_size, 1024);
        assert!(udp.validate().is_ok());
        assert_eq!(GeneratorConfig::default(), GeneratorConfig::Udp(udp));
    }

    #[test]
    fn test_tagged_yaml() {
        let yaml = r#"
kind: udp
dst_mac: "aa:bb:cc:dd:ee:ff"
src_ip: 10.0.0.1
imix:
  patterns:
    - { size: 64, weight: 7 }
    - { size: 1518, weight: 1 }
"#;
        let config: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
        let GeneratorConfig::Udp(udp) = &config else {
            panic!("expected udp generator");
        };
        assert_eq!(udp.dst_mac.0[0], 0xaa);
        assert_eq!(udp.src_ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(udp.src_port, 1234);
        assert_eq!(udp.imix.as_ref().unwrap().total_weight(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_raw_json() {
        let json = r#"{"kind":"raw","templates":[
            {"encoding":"base64","data":"AAEC","length":3},
            {"encoding":"zeros","length":60}
        ]}"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        let GeneratorConfig::Raw(raw) = &config else {
            panic!("expected raw generator");
        };
        assert_eq!(raw.templates[0].encoding, Encoding::Base64);
        assert_eq!(raw.templates[1].data, "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let big = UdpConfig {
            payload_size: UdpConfig::MAX_PAYLOAD + 1,
            ..Default::default()
        };
        assert!(big.validate().is_err());

        let tiny = ImixConfig {
            patterns: vec![ImixPattern { size: 20, weight: 1 }],
        };
        assert!(tiny.validate().is_err());

        let heavy = ImixConfig {
            patterns: vec![ImixPattern { size: 64, weight: MAX_PACKET_ENTRY as u32 + 1 }],
        };
        assert!(heavy.validate().is_err());

        let idle = ImixConfig {
            patterns: vec![ImixPattern { size: 64, weight: 0 }],
        };
        assert!(idle.validate().is_err());

        assert!(RawConfig::default().validate().is_err());
    }
}
