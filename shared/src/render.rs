//! Markdown rendering of an assembled report

use std::fmt::Write;

use crate::models::{ChartPayload, ChartSlot, ReportDocument, ReportSection};

pub const NO_RECOMMENDATIONS: &str =
    "No policy recommendations were triggered by the current conditions.";

/// Render a report as Markdown. Embedded charts become data URIs; linked
/// charts keep their path.
pub fn render_markdown(doc: &ReportDocument) -> String {
    let mut out = String::new();

    for section in &doc.sections {
        match section {
            ReportSection::Title {
                heading,
                location,
                generated_at,
            } => {
                let _ = writeln!(out, "# {}\n", heading);
                let _ = writeln!(
                    out,
                    "_{} · generated {}_\n",
                    location,
                    generated_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            ReportSection::SnapshotSummary { heading, lines } => {
                let _ = writeln!(out, "## {}\n", heading);
                for line in lines {
                    let _ = writeln!(out, "- **{}:** {}", line.label, line.value);
                }
                out.push('\n');
            }
            ReportSection::Charts { heading, slots } => {
                let _ = writeln!(out, "## {}\n", heading);
                for slot in slots {
                    render_slot(&mut out, slot);
                }
            }
            ReportSection::Recommendations { heading, groups } => {
                let _ = writeln!(out, "## {}\n", heading);
                if groups.is_empty() {
                    let _ = writeln!(out, "{}\n", NO_RECOMMENDATIONS);
                }
                for group in groups {
                    let _ = writeln!(out, "### {}\n", group.heading);
                    for rec in &group.recommendations {
                        let _ = writeln!(
                            out,
                            "- **[{}]** {} _(priority {}, rule `{}`)_",
                            rec.severity, rec.text, rec.priority, rec.rule_id
                        );
                    }
                    out.push('\n');
                }
            }
        }
    }

    let _ = writeln!(out, "---\n\n{}", doc.footer);
    out
}

fn render_slot(out: &mut String, slot: &ChartSlot) {
    match slot {
        ChartSlot::Embedded {
            title,
            format,
            payload,
        } => {
            let target = match payload {
                ChartPayload::Inline(data) => format!("data:{};base64,{}", format.mime_type(), data),
                ChartPayload::Linked(path) => path.clone(),
            };
            let _ = writeln!(out, "### {}\n\n![{}]({})\n", title, title, target);
        }
        ChartSlot::Unavailable { title, reason } => {
            let _ = writeln!(out, "### {}\n\n> Chart unavailable: {}\n", title, reason);
        }
    }
}
