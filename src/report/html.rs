//! HTML report generation using Tera templates

use crate::error::Result;
use crate::models::{RiskLevel, ScanReport};
use std::path::Path;
use tera::{Context, Tera};
use tracing::info;

/// Generates an HTML report from a scan report. A `templates/report.html`
/// next to the working directory overrides the embedded template.
pub fn generate(report: &ScanReport, output_path: &Path) -> Result<()> {
    let template_content = std::fs::read_to_string("templates/report.html")
        .unwrap_or_else(|_| default_template().to_string());

    let mut tera = Tera::default();
    tera.add_raw_template("report.html", &template_content)?;

    let mut context = Context::new();
    context.insert("target", &report.target);
    context.insert("scan_id", &report.scan_id);
    context.insert("started_at", &report.started_at.to_rfc3339());
    context.insert(
        "finished_at",
        &report
            .finished_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "N/A".to_string()),
    );
    context.insert("findings", &report.findings);
    context.insert("pages_visited", &report.pages_visited);
    context.insert("llm_calls", &report.llm_calls);
    context.insert("scanner_executed", &report.scanner_executed);
    context.insert("high_count", &report.count_by_risk(RiskLevel::High));
    context.insert("medium_count", &report.count_by_risk(RiskLevel::Medium));
    context.insert("low_count", &report.count_by_risk(RiskLevel::Low));
    context.insert("total_findings", &report.findings.len());
    context.insert("version", env!("CARGO_PKG_VERSION"));

    let rendered = tera.render("report.html", &context)?;
    std::fs::write(output_path, rendered)?;
    info!("HTML report saved to {}", output_path.display());
    Ok(())
}

fn default_template() -> &'static str {
    r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vigil - Security Report</title>
    <style>
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f1f5f9; color: #1e293b; line-height: 1.6; }
        .container { max-width: 1100px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #0f172a 0%, #1e293b 60%, #334155 100%); color: white; padding: 40px 30px; border-radius: 12px; margin-bottom: 30px; text-align: center; }
        .header h1 { font-size: 2.2em; letter-spacing: 2px; }
        .header .meta { opacity: 0.6; margin-top: 15px; font-size: 0.9em; }
        .summary { display: grid; grid-template-columns: repeat(4, 1fr); gap: 15px; margin-bottom: 30px; }
        .card { background: white; padding: 25px 15px; border-radius: 10px; text-align: center; box-shadow: 0 1px 3px rgba(0,0,0,0.1); border-top: 4px solid #e2e8f0; }
        .card .count { font-size: 2.5em; font-weight: 800; }
        .card .label { font-size: 0.85em; text-transform: uppercase; letter-spacing: 1px; margin-top: 5px; opacity: 0.7; }
        .card.high { border-top-color: #dc2626; } .card.high .count { color: #dc2626; }
        .card.medium { border-top-color: #ca8a04; } .card.medium .count { color: #ca8a04; }
        .card.low { border-top-color: #2563eb; } .card.low .count { color: #2563eb; }
        .finding { background: white; border-radius: 10px; padding: 20px 25px; margin-bottom: 15px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); border-left: 5px solid #e2e8f0; }
        .finding.high { border-left-color: #dc2626; }
        .finding.medium { border-left-color: #ca8a04; }
        .finding.low { border-left-color: #2563eb; }
        .finding h3 { margin-bottom: 6px; }
        .badge { display: inline-block; padding: 2px 10px; border-radius: 999px; font-size: 0.75em; font-weight: 700; color: white; margin-right: 6px; }
        .badge.high { background: #dc2626; } .badge.medium { background: #ca8a04; } .badge.low { background: #2563eb; }
        .badge.source { background: #64748b; }
        .finding .url { font-size: 0.85em; opacity: 0.7; word-break: break-all; }
        .finding pre { background: #0f172a; color: #e2e8f0; padding: 12px; border-radius: 8px; margin-top: 10px; overflow-x: auto; font-size: 0.85em; }
        .finding .fix { margin-top: 10px; padding: 10px 14px; background: #f0fdf4; border-radius: 8px; font-size: 0.9em; }
        .footer { text-align: center; opacity: 0.5; font-size: 0.85em; margin: 30px 0; }
    </style>
</head>
<body>
<div class="container">
    <div class="header">
        <h1>VIGIL</h1>
        <div>Autonomous Web Security Report</div>
        <div class="meta">
            Target: {{ target }} &middot; Scan: {{ scan_id }}<br>
            {{ started_at }} &rarr; {{ finished_at }} &middot;
            {{ pages_visited | length }} pages visited &middot;
            {{ llm_calls }} LLM analyses{% if scanner_executed %} &middot; ZAP scan executed{% endif %}
        </div>
    </div>

    <div class="summary">
        <div class="card high"><div class="count">{{ high_count }}</div><div class="label">High</div></div>
        <div class="card medium"><div class="count">{{ medium_count }}</div><div class="label">Medium</div></div>
        <div class="card low"><div class="count">{{ low_count }}</div><div class="label">Low</div></div>
        <div class="card"><div class="count">{{ total_findings }}</div><div class="label">Total</div></div>
    </div>

    {% for finding in findings %}
    <div class="finding {{ finding.risk }}">
        <h3>{{ finding.title }}</h3>
        <span class="badge {{ finding.risk }}">{{ finding.risk | upper }}</span>
        <span class="badge source">{{ finding.source }}</span>
        {% if finding.cwe_id %}<span class="badge source">{{ finding.cwe_id }}</span>{% endif %}
        {% if finding.owasp_category %}<span class="badge source">{{ finding.owasp_category }}</span>{% endif %}
        <p>{{ finding.description }}</p>
        <div class="url">{{ finding.url }}{% if finding.line %} (line {{ finding.line }}){% endif %}</div>
        {% if finding.evidence %}<pre>{{ finding.evidence }}</pre>{% endif %}
        {% if finding.fix %}<div class="fix"><strong>Fix:</strong> {{ finding.fix }}</div>{% endif %}
    </div>
    {% else %}
    <div class="finding"><h3>No findings at or above the configured risk threshold.</h3></div>
    {% endfor %}

    <div class="footer">Generated by Vigil v{{ version }}</div>
</div>
</body>
</html>"##
}
