use anyhow::Result;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::PathBuf;

use super::load_report_config;
use crate::config::{format_threshold, validate_config, ReportConfig, ResolvedTier};
use crate::quality_gate::QualityGateEvaluator;

pub struct GatesConfig {
    pub check: bool,
    pub config: Option<PathBuf>,
}

fn tier_cell(tier: &ResolvedTier) -> String {
    format!(
        ">= {}% / <= {} crit / <= {} major",
        format_threshold(tier.min_pass_rate),
        format_threshold(tier.max_critical_defects),
        format_threshold(tier.max_major_defects)
    )
}

/// Table of every configured profile.
pub fn gates_table(config: &ReportConfig) -> Table {
    let evaluator = QualityGateEvaluator::new(config);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Id", "Name", "Approved", "Conditional"]);
    for (id, name) in evaluator.available_gates() {
        let criteria = evaluator.criteria(&id);
        table.add_row(vec![
            id,
            name,
            tier_cell(&criteria.release_thresholds.approved),
            tier_cell(&criteria.release_thresholds.conditional),
        ]);
    }
    table
}

/// List the profiles. With `check`, returns the number of configuration
/// problems found.
pub fn handle_gates(config: GatesConfig) -> Result<usize> {
    let report_config = load_report_config(config.config.as_deref())?;
    println!("{}", gates_table(&report_config));
    if let Some(gate) = &report_config.quality_gate_override {
        println!("Override in effect: {}", gate.bold());
    }

    if !config.check {
        return Ok(0);
    }
    let problems = validate_config(&report_config);
    if problems.is_empty() {
        println!("{}", "Configuration is valid".green());
    } else {
        for problem in &problems {
            println!("{} {}", "✗".red(), problem);
        }
    }
    Ok(problems.len())
}
