use super::OutputWriter;
use crate::core::{Priority, Severity};
use crate::report::ReportContext;
use std::io::Write;

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_introduction(report)?;
        self.write_test_summary(report)?;
        self.write_modules(report)?;
        self.write_defects(report)?;
        self.write_density(report)?;
        self.write_key_bugs(report)?;
        self.write_flaky_tests(report)?;
        self.write_analysis(report)?;
        self.write_findings(report)?;
        self.write_recommendation(report)?;
        self.write_environment(report)?;
        self.write_sign_off(report)?;
        self.write_warnings(report)?;
        Ok(())
    }
}

/// Escape characters that would break a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let m = &report.metadata;
        writeln!(self.writer, "# Test Summary Report: {} {}", m.project, m.release)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- **Report ID:** {}", report.report_id)?;
        writeln!(
            self.writer,
            "- **Generated:** {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer, "- **Linked Test Plan:** {}", m.linked_plan)?;
        if !m.source_file.is_empty() {
            writeln!(self.writer, "- **Source:** `{}`", m.source_file)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_introduction(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let m = &report.metadata;
        writeln!(self.writer, "## 1. Introduction")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", report.narrative.report.introduction)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Item | Value |")?;
        writeln!(self.writer, "|------|-------|")?;
        writeln!(self.writer, "| Scope | {} |", cell(&m.scope))?;
        writeln!(self.writer, "| Objectives | {} |", cell(&m.objectives))?;
        writeln!(self.writer, "| Environment | {} |", cell(&m.environment))?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_test_summary(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let s = &report.summary;
        writeln!(self.writer, "## 2. Test Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        for (label, value) in [
            ("Total", s.total),
            ("Executed", s.executed),
            ("Passed", s.passed),
            ("Failed", s.failed),
            ("Blocked", s.blocked),
            ("Skipped", s.skipped),
        ] {
            writeln!(self.writer, "| {label} | {value} |")?;
        }
        writeln!(self.writer, "| Pass Rate | {:.2}% |", s.pass_pct)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", report.narrative.report.test_summary)?;
        writeln!(self.writer)?;

        let variances = &report.narrative.report.variances;
        if !variances.is_empty() {
            writeln!(self.writer, "### Variances")?;
            writeln!(self.writer)?;
            for variance in variances {
                writeln!(self.writer, "- {variance}")?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_modules(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.module_coverage.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## 3. Modules Covered")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Module | Total | Passed | Failed | Pass Rate |")?;
        writeln!(self.writer, "|--------|-------|--------|--------|-----------|")?;
        for (module, c) in &report.module_coverage {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {:.2}% |",
                cell(module),
                c.total,
                c.passed,
                c.failed,
                c.pass_rate
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_defects(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        writeln!(self.writer, "## 4. Defect Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Severity | Open |")?;
        writeln!(self.writer, "|----------|------|")?;
        for severity in Severity::ALL {
            let count = report.defects_by_severity.get(&severity).copied().unwrap_or(0);
            writeln!(self.writer, "| {severity} | {count} |")?;
        }
        writeln!(self.writer)?;
        if report.severity_from_priority {
            writeln!(
                self.writer,
                "_Severity was not recorded; values are derived from priority._"
            )?;
            writeln!(self.writer)?;
        }

        writeln!(self.writer, "| Priority | Open |")?;
        writeln!(self.writer, "|----------|------|")?;
        for priority in Priority::ALL {
            let count = report.defects_by_priority.get(&priority).copied().unwrap_or(0);
            writeln!(self.writer, "| {priority} | {count} |")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_density(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.density.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## 5. Defect Density")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| Module | Bugs | Tests | Density | Critical | Major | Medium | Minor | Risk |"
        )?;
        writeln!(
            self.writer,
            "|--------|------|-------|---------|----------|-------|--------|-------|------|"
        )?;
        for (module, d) in &report.density {
            writeln!(
                self.writer,
                "| {} | {} | {} | {:.1}% | {} | {} | {} | {} | {} |",
                cell(module),
                d.total,
                d.total_tests,
                d.density_percentage,
                d.critical,
                d.major,
                d.medium,
                d.minor,
                d.risk_level
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_key_bugs(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.key_bugs.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## 6. Key Bugs")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Bug ID | Module | Severity | Priority | Status | Assigned To |")?;
        writeln!(self.writer, "|--------|--------|----------|----------|--------|-------------|")?;
        for bug in &report.key_bugs {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} | {} |",
                cell(&bug.id),
                cell(&bug.module),
                bug.severity,
                bug.priority,
                bug.status,
                cell(&bug.assigned_to)
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_flaky_tests(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        writeln!(self.writer, "## 7. Flaky Tests")?;
        writeln!(self.writer)?;
        if report.flaky_tests.is_empty() {
            writeln!(self.writer, "No flaky tests detected.")?;
        } else {
            for id in &report.flaky_tests {
                writeln!(self.writer, "- {id}")?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_analysis(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let readiness = &report.narrative.readiness;
        writeln!(self.writer, "## 8. Data Readiness and Analysis")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} (input: {})",
            readiness.readiness_note, readiness.file_type
        )?;
        writeln!(self.writer)?;
        for issue in &readiness.issues {
            writeln!(self.writer, "- {issue}")?;
        }
        if !readiness.issues.is_empty() {
            writeln!(self.writer)?;
        }

        let causes = &report.narrative.analysis.likely_causes;
        if !causes.is_empty() {
            writeln!(self.writer, "### Likely Causes")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Module | Likely Cause |")?;
            writeln!(self.writer, "|--------|--------------|")?;
            for (module, cause) in causes {
                writeln!(self.writer, "| {} | {} |", cell(module), cell(cause))?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_findings(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let narrative = &report.narrative.report;
        writeln!(self.writer, "## 9. Key Findings")?;
        writeln!(self.writer)?;
        self.write_list("Stable areas", &narrative.key_findings.stable_areas)?;
        self.write_list("Risky areas", &narrative.key_findings.risky_areas)?;

        writeln!(self.writer, "## 10. Exit Criteria")?;
        writeln!(self.writer)?;
        for met in &narrative.exit_criteria.met {
            writeln!(self.writer, "- [x] {met}")?;
        }
        for not_met in &narrative.exit_criteria.not_met {
            writeln!(self.writer, "- [ ] {not_met}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_list(&mut self, title: &str, items: &[String]) -> anyhow::Result<()> {
        writeln!(self.writer, "**{title}:**")?;
        writeln!(self.writer)?;
        if items.is_empty() {
            writeln!(self.writer, "- None")?;
        }
        for item in items {
            writeln!(self.writer, "- {item}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_recommendation(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let e = &report.evaluation;
        writeln!(self.writer, "## 11. Release Recommendation")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "**{}**", report.recommendation)?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "- **Quality Gate:** {} (`{}`)",
            e.gate_name, e.quality_gate_used
        )?;
        writeln!(self.writer, "- **Reason:** {}", e.reason)?;
        if let Some(text) = &report.recommendation_text {
            writeln!(self.writer, "- **Guidance:** {text}")?;
        }
        writeln!(self.writer)?;

        let recommendations = &report.narrative.report.recommendations;
        if !recommendations.is_empty() {
            writeln!(self.writer, "### Recommendations")?;
            writeln!(self.writer)?;
            for (i, rec) in recommendations.iter().enumerate() {
                writeln!(self.writer, "{}. {rec}", i + 1)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_environment(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let env = &report.test_environment;
        writeln!(self.writer, "## 12. Test Environment")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Component | Details |")?;
        writeln!(self.writer, "|-----------|---------|")?;
        for (label, value) in [
            ("Environment", &env.environment_name),
            ("Software", &env.software_details),
            ("Version", &env.software_version),
            ("Browsers", &env.browsers),
            ("Database", &env.database_details),
            ("Deployment", &env.deployment_type),
            ("Load Balancer", &env.load_balancer),
            ("Monitoring", &env.monitoring),
            ("Logging", &env.logging),
        ] {
            writeln!(self.writer, "| {label} | {} |", cell(value))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_sign_off(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        let s = &report.sign_off;
        writeln!(self.writer, "## 13. Sign-off")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Role | Name | Date |")?;
        writeln!(self.writer, "|------|------|------|")?;
        writeln!(
            self.writer,
            "| Test Lead | {} | {} |",
            cell(&s.test_lead),
            report.sign_off_date
        )?;
        for (role, name) in [
            ("Test Engineer", &s.test_engineer),
            ("Development Lead", &s.dev_lead),
            ("Product Owner", &s.product_owner),
            ("QA Manager", &s.qa_manager),
        ] {
            writeln!(self.writer, "| {role} | {} | TBD |", cell(name))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_warnings(&mut self, report: &ReportContext) -> anyhow::Result<()> {
        if report.warnings.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## Generation Notes")?;
        writeln!(self.writer)?;
        for warning in &report.warnings {
            writeln!(self.writer, "- {warning}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}
