//! Ethernet / IPv4 / UDP frame builder
//!
//! ```text
//! 0              14                   34          42
//! ├──────────────┼────────────────────┼───────────┼──────────────┤
//! │   Ethernet   │        IPv4        │    UDP    │   payload    │
//! └──────────────┴────────────────────┴───────────┴──────────────┘
//! ```

use crate::config::{MacAddr, UdpConfig};
use pktforge_common::{ForgeError, ForgeResult, UDP_FRAME_OVERHEAD};
use std::net::Ipv4Addr;

pub const ETH_HDR_LEN: usize = 14;
pub const IPV4_HDR_LEN: usize = 20;
pub const UDP_HDR_LEN: usize = 8;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const IPPROTO_UDP: u8 = 17;

/// Addressing for one UDP flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeaders {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub ttl: u8,
}

impl From<&UdpConfig> for UdpHeaders {
    fn from(cfg: &UdpConfig) -> Self {
        Self {
            src_mac: cfg.src_mac,
            dst_mac: cfg.dst_mac,
            src_ip: cfg.src_ip,
            dst_ip: cfg.dst_ip,
            src_port: cfg.src_port,
            dst_port: cfg.dst_port,
            ttl: cfg.ttl,
        }
    }
}

/// Payload bytes `i % 256`
pub fn counting_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

/// Build a complete frame with valid IPv4 and UDP checksums
pub fn build_udp_frame(headers: &UdpHeaders, payload: &[u8]) -> ForgeResult<Vec<u8>> {
    let udp_len = UDP_HDR_LEN + payload.len();
    let ip_len = IPV4_HDR_LEN + udp_len;
    let ip_total = u16::try_from(ip_len).map_err(|_| {
        ForgeError::InvalidTemplate(format!("UDP payload of {} bytes is too large", payload.len()))
    })?;

    let mut frame = vec![0u8; UDP_FRAME_OVERHEAD + payload.len()];

    // Ethernet
    frame[0..6].copy_from_slice(&headers.dst_mac.octets());
    frame[6..12].copy_from_slice(&headers.src_mac.octets());
    frame[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    // IPv4
    let ip = ETH_HDR_LEN;
    frame[ip] = 0x45;
    frame[ip + 2..ip + 4].copy_from_slice(&ip_total.to_be_bytes());
    frame[ip + 8] = headers.ttl;
    frame[ip + 9] = IPPROTO_UDP;
    frame[ip + 12..ip + 16].copy_from_slice(&headers.src_ip.octets());
    frame[ip + 16..ip + 20].copy_from_slice(&headers.dst_ip.octets());
    let csum = ipv4_checksum(&frame[ip..ip + IPV4_HDR_LEN]);
    frame[ip + 10..ip + 12].copy_from_slice(&csum.to_be_bytes());

    // UDP
    let udp = ip + IPV4_HDR_LEN;
    frame[udp..udp + 2].copy_from_slice(&headers.src_port.to_be_bytes());
    frame[udp + 2..udp + 4].copy_from_slice(&headers.dst_port.to_be_bytes());
    frame[udp + 4..udp + 6].copy_from_slice(&(udp_len as u16).to_be_bytes());
    frame[udp + UDP_HDR_LEN..].copy_from_slice(payload);
    let csum = udp_checksum(headers.src_ip, headers.dst_ip, &frame[udp..]);
    frame[udp + 6..udp + 8].copy_from_slice(&csum.to_be_bytes());

    Ok(frame)
}

/// Seed frame standing in for received traffic.
///
/// Loopback UDP 8080 -> 8081 padded with `'x'` to `len` bytes; all zeros
/// when `len` cannot hold the headers.
pub fn sample_frame(len: usize) -> Vec<u8> {
    if len < UDP_FRAME_OVERHEAD {
        return vec![0; len];
    }
    let headers = UdpHeaders {
        src_mac: MacAddr::LOCAL,
        dst_mac: MacAddr::ZERO,
        src_ip: Ipv4Addr::LOCALHOST,
        dst_ip: Ipv4Addr::LOCALHOST,
        src_port: 8080,
        dst_port: 8081,
        ttl: 64,
    };
    let payload = vec![b'x'; len - UDP_FRAME_OVERHEAD];
    build_udp_frame(&headers, &payload).unwrap_or_else(|_| vec![0; len])
}

/// One's complement sum of big-endian 16-bit words, odd byte padded
fn sum_words(data: &[u8], mut sum: u32) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum
}

fn fold(mut sum: u32) -> u16 {
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// IPv4 header checksum; the checksum field itself is skipped
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    let sum = sum_words(header.get(..10).unwrap_or(header), 0);
    let sum = sum_words(header.get(12..).unwrap_or(&[]), sum);
    !fold(sum)
}

/// UDP checksum over the pseudo header and `segment` (checksum field
/// skipped). A computed zero is sent as `0xFFFF`.
pub fn udp_checksum(src: Ipv4Addr, dst: Ipv4Addr, segment: &[u8]) -> u16 {
    let mut sum = sum_words(&src.octets(), 0);
    sum = sum_words(&dst.octets(), sum);
    sum += u32::from(IPPROTO_UDP);
    sum += segment.len() as u32;
    sum = sum_words(segment.get(..6).unwrap_or(segment), sum);
    sum = sum_words(segment.get(8..).unwrap_or(&[]), sum);
    match !fold(sum) {
        0 => 0xFFFF,
        csum => csum,
    }
}
