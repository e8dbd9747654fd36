//! Rendering a [`ResearchResult`] for display or transport.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::result::ResearchResult;

/// How a result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Human-readable report
    Markdown,
    /// Compact `key: value` lines
    Structured,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "structured" => Ok(Self::Structured),
            other => Err(Error::config(format!("unknown output format '{}'", other))),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Render a result in the given format.
pub fn render(result: &ResearchResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Markdown => Ok(render_markdown(result)),
        OutputFormat::Structured => Ok(render_structured(result)),
    }
}

// write! into a String cannot fail
fn render_markdown(result: &ResearchResult) -> String {
    let mut out = String::new();

    out.push_str("## Findings\n\n");
    out.push_str(result.findings_text().trim());
    out.push_str("\n\n");

    if !result.citations().is_empty() {
        out.push_str("## Sources\n\n");
        for (i, citation) in result.citations().iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, citation.text);
        }
        out.push('\n');
    }

    if !result.gaps().is_empty() {
        out.push_str("## Gaps\n\n");
        for gap in result.gaps() {
            let _ = writeln!(out, "- {}", gap);
        }
        out.push('\n');
    }

    if !result.advisories().is_empty() {
        out.push_str("## Advisories\n\n");
        for advisory in result.advisories() {
            let _ = writeln!(out, "- **{}**: {}", advisory.kind, advisory.message);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "_Tier: {} | Confidence: {:.2} | Sources: {} | Elapsed: {}ms_",
        result.tier_used(),
        result.overall_confidence(),
        result.source_count(),
        result.total_elapsed_ms()
    );

    out
}

fn render_structured(result: &ResearchResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "tier_used: {}", result.tier_used());
    let _ = writeln!(out, "confidence: {:.2}", result.overall_confidence());
    let _ = writeln!(out, "elapsed_ms: {}", result.total_elapsed_ms());
    let _ = writeln!(out, "source_count: {}", result.source_count());
    for citation in result.citations() {
        let _ = writeln!(out, "citation: {}", citation.text);
    }
    for gap in result.gaps() {
        let _ = writeln!(out, "gap: {}", gap);
    }
    for advisory in result.advisories() {
        let _ = writeln!(out, "advisory: {}: {}", advisory.kind, advisory.message);
    }
    let _ = writeln!(out, "findings: {}", result.findings_text().replace('\n', " "));

    out
}
