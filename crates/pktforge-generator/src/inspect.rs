//! Frame inspection
//!
//! Decodes the L2-L4 headers of a generated frame for display and checks
//! the IPv4 and UDP checksums.

use crate::udp::{
    ipv4_checksum, udp_checksum, ETHERTYPE_IPV4, ETH_HDR_LEN, IPPROTO_UDP, IPV4_HDR_LEN,
    UDP_HDR_LEN,
};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Header summary of one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub len: usize,
    pub ethertype: Option<u16>,
    pub ipv4: Option<Ipv4Summary>,
    pub udp: Option<UdpSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv4Summary {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ttl: u8,
    pub protocol: u8,
    pub total_len: u16,
    pub checksum_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UdpSummary {
    pub src_port: u16,
    pub dst_port: u16,
    pub len: u16,
    pub checksum_ok: bool,
}

impl FrameSummary {
    /// Decode as far as the frame allows; truncated layers are `None`
    pub fn parse(data: &[u8]) -> Self {
        let mut summary = FrameSummary {
            len: data.len(),
            ethertype: None,
            ipv4: None,
            udp: None,
        };
        if data.len() < ETH_HDR_LEN {
            return summary;
        }
        let ethertype = u16::from_be_bytes([data[12], data[13]]);
        summary.ethertype = Some(ethertype);
        if ethertype != ETHERTYPE_IPV4 {
            return summary;
        }

        let ip = ETH_HDR_LEN;
        let Some(header) = data.get(ip..ip + IPV4_HDR_LEN) else {
            return summary;
        };
        let ihl = ((header[0] & 0x0F) as usize) * 4;
        let Some(full_header) = data.get(ip..ip + ihl.max(IPV4_HDR_LEN)) else {
            return summary;
        };
        let stored = u16::from_be_bytes([header[10], header[11]]);
        let src = Ipv4Addr::new(header[12], header[13], header[14], header[15]);
        let dst = Ipv4Addr::new(header[16], header[17], header[18], header[19]);
        let protocol = header[9];
        summary.ipv4 = Some(Ipv4Summary {
            src,
            dst,
            ttl: header[8],
            protocol,
            total_len: u16::from_be_bytes([header[2], header[3]]),
            checksum_ok: ipv4_checksum(full_header) == stored,
        });
        if protocol != IPPROTO_UDP {
            return summary;
        }

        let l4 = ip + full_header.len();
        let Some(udp) = data.get(l4..l4 + UDP_HDR_LEN) else {
            return summary;
        };
        let udp_len = u16::from_be_bytes([udp[4], udp[5]]);
        let stored = u16::from_be_bytes([udp[6], udp[7]]);
        let checksum_ok = match data.get(l4..l4 + udp_len as usize) {
            Some(segment) => stored == 0 || udp_checksum(src, dst, segment) == stored,
            None => false,
        };
        summary.udp = Some(UdpSummary {
            src_port: u16::from_be_bytes([udp[0], udp[1]]),
            dst_port: u16::from_be_bytes([udp[2], udp[3]]),
            len: udp_len,
            checksum_ok,
        });
        summary
    }

    /// Whether every decoded checksum matched
    pub fn checksums_ok(&self) -> bool {
        self.ipv4.as_ref().map_or(true, |ip| ip.checksum_ok)
            && self.udp.as_ref().map_or(true, |udp| udp.checksum_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UdpConfig;
    use crate::udp::{build_udp_frame, counting_payload, sample_frame, UdpHeaders};

    #[test]
    fn test_parse_generated() {
        let frame = build_udp_frame(&UdpHeaders::from(&UdpConfig::default()), &counting_payload(100))
            .unwrap();
        let summary = FrameSummary::parse(&frame);

        assert_eq!(summary.len, 142);
        assert_eq!(summary.ethertype, Some(0x0800));
        let ip = summary.ipv4.as_ref().unwrap();
        assert_eq!(ip.src, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(ip.total_len, 128);
        let udp = summary.udp.as_ref().unwrap();
        assert_eq!((udp.src_port, udp.dst_port, udp.len), (1234, 5678, 108));
        assert!(summary.checksums_ok());
    }

    #[test]
    fn test_corruption_detected() {
        let mut frame = sample_frame(200);
        frame[100] ^= 0xFF;
        let summary = FrameSummary::parse(&frame);
        assert!(summary.ipv4.as_ref().unwrap().checksum_ok);
        assert!(!summary.udp.as_ref().unwrap().checksum_ok);

        frame[22] = 1;
        assert!(!FrameSummary::parse(&frame).checksums_ok());
    }

    #[test]
    fn test_truncated_and_foreign() {
        let summary = FrameSummary::parse(&[0; 10]);
        assert_eq!(summary.ethertype, None);

        let mut arp = vec![0u8; 60];
        arp[12..14].copy_from_slice(&[0x08, 0x06]);
        let summary = FrameSummary::parse(&arp);
        assert_eq!(summary.ethertype, Some(0x0806));
        assert!(summary.ipv4.is_none());

        let frame = sample_frame(100);
        let summary = FrameSummary::parse(&frame[..30]);
        assert!(summary.ipv4.is_none());
    }
}
