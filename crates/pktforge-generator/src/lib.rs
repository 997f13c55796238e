//! pktforge Generator
//!
//! Builds the frame sets a template table is loaded with:
//!
//! - `udp`: one Ethernet/IPv4/UDP frame, or an IMIX sequence of them
//! - `raw`: frames supplied as hex, base64 or zero fill
//!
//! Every generated frame fits in a single template.

#![warn(clippy::all)]

pub mod config;
pub mod imix;
pub mod inspect;
pub mod raw;
pub mod udp;

pub use config::{Encoding, GeneratorConfig, ImixConfig, ImixPattern, MacAddr, RawConfig, RawTemplate, UdpConfig};
pub use inspect::FrameSummary;
pub use udp::{build_udp_frame, sample_frame, UdpHeaders};

use pktforge_common::{ForgeError, ForgeResult, MAX_TEMPLATE_SIZE, UDP_FRAME_OVERHEAD};

/// Build the frame set described by `config`
pub fn generate(config: &GeneratorConfig) -> ForgeResult<Vec<Vec<u8>>> {
    config.validate()?;

    let frames = match config {
        GeneratorConfig::Udp(udp) => generate_udp(udp)?,
        GeneratorConfig::Raw(raw) => raw
            .templates
            .iter()
            .map(raw::decode)
            .collect::<ForgeResult<Vec<_>>>()?,
    };

    if let Some(frame) = frames.iter().find(|f| f.len() > MAX_TEMPLATE_SIZE) {
        return Err(ForgeError::InvalidTemplate(format!(
            "generated frame of {} bytes exceeds {}",
            frame.len(),
            MAX_TEMPLATE_SIZE
        )));
    }

    tracing::debug!(frames = frames.len(), "generated template frames");
    Ok(frames)
}

fn generate_udp(config: &UdpConfig) -> ForgeResult<Vec<Vec<u8>>> {
    let headers = UdpHeaders::from(config);
    match &config.imix {
        None => Ok(vec![build_udp_frame(&headers, &udp::counting_payload(config.payload_size))?]),
        Some(mix) => imix::schedule(mix)?
            .into_iter()
            .map(|size| {
                let payload = udp::counting_payload(size as usize - UDP_FRAME_OVERHEAD);
                build_udp_frame(&headers, &payload)
            })
            .collect(),
    }
}
