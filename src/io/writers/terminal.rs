use super::OutputWriter;
use crate::core::Severity;
use crate::metrics::RiskLevel;
use crate::quality_gate::Recommendation;
use crate::report::ReportContext;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::io::Write;

/// Maximum key bugs listed in the terminal summary.
const MAX_KEY_BUGS: usize = 10;

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        self.print_header(report)?;
        self.print_summary(report)?;
        self.print_recommendation(report)?;
        self.print_defects(report)?;
        self.print_modules(report)?;
        self.print_flaky(report)?;
        self.print_key_bugs(report)?;
        self.print_warnings(report)?;
        Ok(())
    }
}

fn recommendation_label(recommendation: Recommendation) -> ColoredString {
    match recommendation {
        Recommendation::Approved => recommendation.as_str().green().bold(),
        Recommendation::Conditional => recommendation.as_str().yellow().bold(),
        Recommendation::Rejected => recommendation.as_str().red().bold(),
    }
}

fn risk_label(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::High => risk.as_str().red(),
        RiskLevel::Medium => risk.as_str().yellow(),
        RiskLevel::Low => risk.as_str().green(),
    }
}

impl<W: Write> TerminalWriter<W> {
    fn print_header(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let divider = "═".repeat(60);
        writeln!(self.writer, "{}", divider.bright_blue())?;
        writeln!(
            self.writer,
            "{} {} {}",
            "TEST SUMMARY REPORT".bold(),
            report.metadata.project,
            report.metadata.release
        )?;
        writeln!(self.writer, "{}", divider.bright_blue())?;
        writeln!(self.writer, "Report ID:   {}", report.report_id.dimmed())?;
        if !report.metadata.environment.is_empty() {
            writeln!(self.writer, "Environment: {}", report.metadata.environment)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_summary(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let s = &report.summary;
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Total", "Executed", "Passed", "Failed", "Blocked", "Skipped", "Pass %"])
            .add_row(vec![
                s.total.to_string(),
                s.executed.to_string(),
                s.passed.to_string(),
                s.failed.to_string(),
                s.blocked.to_string(),
                s.skipped.to_string(),
                format!("{:.2}", s.pass_pct),
            ]);
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_recommendation(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "Recommendation: {}  ({})",
            recommendation_label(report.recommendation),
            report.evaluation.gate_name
        )?;
        writeln!(self.writer, "  {}", report.evaluation.reason)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_defects(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Severity", "Open"]);
        for severity in Severity::ALL {
            let count = report.defects_by_severity.get(&severity).copied().unwrap_or(0);
            table.add_row(vec![severity.to_string(), count.to_string()]);
        }
        writeln!(self.writer, "{table}")?;
        if report.severity_from_priority {
            writeln!(self.writer, "{}", "(severity derived from priority)".dimmed())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_modules(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.module_coverage.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Modules".bold())?;
        for (module, coverage) in &report.module_coverage {
            let risk = report
                .density
                .get(module)
                .map(|d| risk_label(d.risk_level).to_string())
                .unwrap_or_default();
            writeln!(
                self.writer,
                "  {:<24} {:>4}/{:<4} {:>7.2}%  {}",
                module, coverage.passed, coverage.total, coverage.pass_rate, risk
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_flaky(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.flaky_tests.is_empty() {
            return Ok(());
        }
        writeln!(
            self.writer,
            "{} {}",
            "Flaky tests:".yellow(),
            report.flaky_tests.join(", ")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_key_bugs(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.key_bugs.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Key bugs".bold())?;
        for bug in report.key_bugs.iter().take(MAX_KEY_BUGS) {
            writeln!(
                self.writer,
                "  {} [{}] {} ({})",
                bug.id.red(),
                bug.severity,
                bug.module,
                bug.status
            )?;
        }
        if report.key_bugs.len() > MAX_KEY_BUGS {
            writeln!(
                self.writer,
                "  ... and {} more",
                report.key_bugs.len() - MAX_KEY_BUGS
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_warnings(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        for warning in &report.warnings {
            writeln!(self.writer, "{} {}", "warning:".yellow().bold(), warning)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::io::writers::{render_to_string, OutputFormat};
    use crate::pipeline::tests::sample_report;

    #[test]
    fn test_terminal_output_mentions_key_facts() {
        colored::control::set_override(false);
        let report = sample_report();
        let text = render_to_string(OutputFormat::Terminal, &report).unwrap();

        assert!(text.contains("TEST SUMMARY REPORT Shop R1"));
        assert!(text.contains("Recommendation: REJECTED"));
        assert!(text.contains("66.67"));
        assert!(text.contains("Flaky tests: TC1"));
        assert!(text.contains("(severity derived from priority)"));
    }
}
