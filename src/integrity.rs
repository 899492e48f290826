//! Post-synthesis checks that mandatory sections survived into the final plan.
//!
//! Repairs are append-only: missing insights and resource links are copied
//! verbatim from the insights document to the end of the plan. Image URLs are
//! only reported, never injected; the synthesis prompt is responsible for them.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::insights::RESOURCE_LINKS_HEADING;

pub const INSIGHTS_MARKER: &str = "TRAVELER INSIGHTS";
pub const RESOURCE_LINKS_MARKER: &str = "USEFUL RESOURCE LINKS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub has_insights: bool,
    pub has_resource_links: bool,
    pub missing_image_urls: BTreeSet<String>,
}

impl ValidationReport {
    pub fn inspect(document: &str, images: &[String]) -> Self {
        Self {
            has_insights: document.contains(INSIGHTS_MARKER),
            has_resource_links: has_resource_links(document),
            missing_image_urls: images
                .iter()
                .filter(|url| !document.contains(url.as_str()))
                .cloned()
                .collect(),
        }
    }
}

fn has_resource_links(document: &str) -> bool {
    document.contains("Useful Resource Links") || document.contains(RESOURCE_LINKS_MARKER)
}

/// Everything after the resource-links heading of an insights document.
fn resource_links_block(insights: &str) -> Option<&str> {
    let (_, rest) = insights.split_once(RESOURCE_LINKS_HEADING)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

#[derive(Debug, Clone, Default)]
pub struct DocumentIntegrityValidator;

impl DocumentIntegrityValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_and_repair(&self, document: &str, insights: &str, images: &[String]) -> String {
        let report = ValidationReport::inspect(document, images);
        let mut repaired = document.to_string();

        if !insights.trim().is_empty() && !report.has_insights {
            warn!("synthesized plan lost the traveler insights section, re-injecting");
            repaired.push_str(&format!("\n\n## {INSIGHTS_MARKER}\n\n{insights}"));
        }

        // Re-injected insights may already carry the links section.
        if !has_resource_links(&repaired) {
            if let Some(links) = resource_links_block(insights) {
                warn!("synthesized plan lost the resource links section, re-injecting");
                repaired.push_str(&format!("\n\n## {RESOURCE_LINKS_MARKER}\n\n{links}\n"));
            }
        }

        if !report.missing_image_urls.is_empty() {
            debug!(
                missing = report.missing_image_urls.len(),
                "image urls absent from synthesized plan"
            );
        }

        repaired
    }
}
