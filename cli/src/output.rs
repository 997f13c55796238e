//! Output formatting

use clap::ValueEnum;
use pktforge_generator::FrameSummary;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// One generated template as shown by `pktforge templates`
#[derive(Debug, Serialize)]
pub struct TemplateReport {
    pub index: usize,
    pub summary: FrameSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "#")]
    index: usize,
    len: usize,
    src: String,
    dst: String,
    ttl: String,
    checksums: &'static str,
}

impl From<&TemplateReport> for TemplateRow {
    fn from(report: &TemplateReport) -> Self {
        let s = &report.summary;
        let endpoint = |ip: Option<String>, port: Option<u16>| match (ip, port) {
            (Some(ip), Some(port)) => format!("{ip}:{port}"),
            (Some(ip), None) => ip,
            _ => "-".into(),
        };
        Self {
            index: report.index,
            len: s.len,
            src: endpoint(
                s.ipv4.as_ref().map(|ip| ip.src.to_string()),
                s.udp.as_ref().map(|u| u.src_port),
            ),
            dst: endpoint(
                s.ipv4.as_ref().map(|ip| ip.dst.to_string()),
                s.udp.as_ref().map(|u| u.dst_port),
            ),
            ttl: s.ipv4.as_ref().map_or_else(|| "-".into(), |ip| ip.ttl.to_string()),
            checksums: match (&s.ipv4, s.checksums_ok()) {
                (None, _) => "-",
                (Some(_), true) => "ok",
                (Some(_), false) => "BAD",
            },
        }
    }
}

impl OutputFormat {
    pub fn print_templates(&self, reports: &[TemplateReport]) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(reports)?),
            OutputFormat::Table => {
                let rows: Vec<TemplateRow> = reports.iter().map(TemplateRow::from).collect();
                println!("{}", Table::new(rows));
                for report in reports {
                    if let Some(hex) = &report.hex {
                        println!("{:>5}  {}", report.index, hex);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktforge_generator::sample_frame;

    #[test]
    fn test_row_from_udp_frame() {
        let report = TemplateReport {
            index: 3,
            summary: FrameSummary::parse(&sample_frame(100)),
            hex: None,
        };
        let row = TemplateRow::from(&report);
        assert_eq!(row.index, 3);
        assert_eq!(row.src, "127.0.0.1:8080");
        assert_eq!(row.dst, "127.0.0.1:8081");
        assert_eq!(row.checksums, "ok");
    }

    #[test]
    fn test_row_from_opaque_frame() {
        let report = TemplateReport {
            index: 0,
            summary: FrameSummary::parse(&[0u8; 8]),
            hex: Some("00".repeat(8)),
        };
        let row = TemplateRow::from(&report);
        assert_eq!(row.src, "-");
        assert_eq!(row.checksums, "-");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["len"], 8);
        assert!(json["hex"].is_string());
    }
}
