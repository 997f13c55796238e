//! Run orchestration: generate, install, replay

use crate::config::RunConfig;
use crate::output::TemplateReport;
use anyhow::Context;
use pktforge_dataplane::{DiscardSink, StatsSnapshot, Template, TemplateTable, TxEngine};
use pktforge_generator::{generate, sample_frame, FrameSummary};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a completed run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub totals: StatsSnapshot,
    pub elapsed_secs: f64,
}

/// Generate the configured frames as templates
pub fn build_templates(config: &RunConfig) -> anyhow::Result<Vec<Template>> {
    let frames = generate(&config.generator).context("failed to generate templates")?;
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            Template::from_frame(frame).with_context(|| format!("template {i} rejected"))
        })
        .collect()
}

/// Header summaries of the configured frames
pub fn describe_templates(config: &RunConfig, with_hex: bool) -> anyhow::Result<Vec<TemplateReport>> {
    let frames = generate(&config.generator).context("failed to generate templates")?;
    Ok(frames
        .iter()
        .enumerate()
        .map(|(index, frame)| TemplateReport {
            index,
            summary: FrameSummary::parse(frame),
            hex: with_hex.then(|| hex::encode(frame)),
        })
        .collect())
}

/// Replay the configured templates until the packet count is reached or
/// Ctrl-C is pressed
pub fn run(config: &RunConfig) -> anyhow::Result<RunSummary> {
    config.validate().context("invalid configuration")?;

    let templates = build_templates(config)?;
    let table = Arc::new(TemplateTable::with_default_capacity());
    let mut engine = TxEngine::new(config.engine_config(), table)?;

    let report = engine.control().install(&templates)?;
    tracing::info!(
        templates = report.distinct,
        slots = report.slots,
        "templates installed"
    );

    let shutdown = engine.shutdown_handle();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping");
        shutdown.shutdown();
    })
    .context("failed to install Ctrl-C handler")?;

    let seed = sample_frame(config.inbound_len);
    let started = Instant::now();
    engine.start(&seed, |_| DiscardSink)?;
    let totals = engine.wait();

    Ok(RunSummary {
        totals,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktforge_generator::{Encoding, GeneratorConfig, RawConfig, RawTemplate};

    #[test]
    fn test_build_templates() {
        let config = RunConfig {
            generator: GeneratorConfig::Raw(RawConfig {
                templates: vec![
                    RawTemplate { encoding: Encoding::Zeros, data: String::new(), length: 60 },
                    RawTemplate { encoding: Encoding::Hex, data: "0a0b".into(), length: 2 },
                ],
            }),
            ..Default::default()
        };
        let templates = build_templates(&config).unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].effective_len(), 60);
        assert_eq!(templates[1].frame(), &[0x0a, 0x0b]);
    }

    #[test]
    fn test_describe_templates() {
        let reports = describe_templates(&RunConfig::default(), true).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].summary.checksums_ok());
        assert_eq!(reports[0].hex.as_ref().unwrap().len(), reports[0].summary.len * 2);
    }
}
