use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::engine::EligibilityReport;
use crate::rules::Rule;
use crate::tokens::TokenRecord;

pub fn render_report_table(report: &EligibilityReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Rule", "Condition", "Value", "Pass", "Error"]);

    for outcome in &report.results {
        let pass = if outcome.success { "YES" } else { "NO" };
        let pass_cell = if outcome.success {
            Cell::new(pass).fg(Color::Green)
        } else {
            Cell::new(pass).fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(outcome.rule.display_name.clone()),
            Cell::new(format!(
                "{} {} {}",
                outcome.rule.function_name,
                outcome.rule.operator.symbol(),
                outcome.rule.value
            )),
            Cell::new(
                outcome
                    .value
                    .map(|v| format!("{v}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            pass_cell,
            Cell::new(outcome.error.clone().unwrap_or_default()),
        ]));
    }

    let verdict = if report.success {
        "ELIGIBLE"
    } else {
        "NOT ELIGIBLE"
    };
    let mut rendered = String::new();
    rendered.push_str(&table.to_string());
    rendered.push_str(&format!(
        "\n{} for {} ({}): {} ({}/{} rules passed, {} decimals)",
        report.checked_address,
        report.token_name,
        report.token_address,
        verdict,
        report.passed_count(),
        report.results.len(),
        report.decimals,
    ));
    rendered
}

pub fn render_rules_table(rules: &[Rule]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Function", "Operator", "Threshold"]);
    for rule in rules {
        table.add_row(vec![
            rule.display_name.clone(),
            rule.function_name.clone(),
            rule.operator.symbol().to_string(),
            rule.value.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_tokens_table(tokens: &[TokenRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Address"]);
    for token in tokens {
        table.add_row(vec![
            token.id.to_string(),
            token.name.clone(),
            token.address.clone(),
        ]);
    }
    table.to_string()
}
