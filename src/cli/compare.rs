use super::ui;
use crate::core::asset::AssetKey;
use crate::core::commission::TurnoverIndex;
use crate::core::comparison::{ComparisonResult, FeeCalculator};
use crate::core::config::{AppConfig, Scenario};
use crate::core::events::{StoreEvent, Topic};
use crate::core::money::Money;
use crate::core::store::CalculatorStore;
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// An allocation that did not fit in what was left of the principal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CappedNotice {
    pub asset: AssetKey,
    pub requested: Money,
    pub max_allowed: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub principal: Money,
    pub turnover_index: TurnoverIndex,
    pub comparison: ComparisonResult,
    pub capped: Vec<CappedNotice>,
}

pub fn run(config: &AppConfig, json: bool) -> Result<()> {
    let calculator = config.fee_calculator()?;

    if config.scenarios.is_empty() {
        println!("No scenarios to compare.");
        return Ok(());
    }

    let reports: Vec<ScenarioReport> = config
        .scenarios
        .iter()
        .map(|scenario| evaluate(scenario, &calculator, config.turnover_for(scenario)))
        .collect();

    if json {
        let output =
            serde_json::to_string_pretty(&reports).context("Failed to serialize comparison")?;
        println!("{output}");
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        println!(
            "\nScenario: {}",
            ui::style_text(&report.name, ui::StyleType::Title)
        );
        println!("{}", display_report(report, &config.currency));

        if i < reports.len() - 1 {
            ui::print_separator();
        }
    }
    Ok(())
}

/// Allocates a scenario through the store, so caps apply in listing order.
pub fn evaluate(
    scenario: &Scenario,
    calculator: &FeeCalculator,
    turnover_index: TurnoverIndex,
) -> ScenarioReport {
    let mut store = CalculatorStore::new(calculator.clone(), scenario.principal, turnover_index);
    let capped = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&capped);
    store.subscribe(Topic::Allocation, move |event| {
        if let StoreEvent::AllocationCapped {
            asset,
            requested,
            max_allowed,
        } = event
        {
            sink.borrow_mut().push(CappedNotice {
                asset: asset.clone(),
                requested: *requested,
                max_allowed: *max_allowed,
            });
        }
    });

    for allocation in &scenario.allocations {
        store.select(allocation.asset.clone());
        store.set_allocation(&allocation.asset, allocation.value);
    }

    let comparison = store.comparison();
    debug!(scenario = %scenario.name, ?comparison, "Evaluated scenario");
    let capped = capped.borrow().clone();
    ScenarioReport {
        name: scenario.name.clone(),
        principal: store.state().total_principal(),
        turnover_index,
        comparison,
        capped,
    }
}

fn display_report(report: &ScenarioReport, currency: &str) -> String {
    let comparison = &report.comparison;
    let mut items = ui::new_styled_table();
    items.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Product"),
        ui::header_cell("Value"),
        ui::header_cell("Rate"),
        ui::header_cell("Annual cost"),
    ]);

    for item in &comparison.commission.per_item {
        let rate_cell = match item.effective_rate {
            Some(rate) => ui::value_cell(ui::format_percent(rate)),
            None => Cell::new("unknown").fg(comfy_table::Color::Red),
        };
        items.add_row(vec![
            Cell::new(&item.asset.category),
            Cell::new(&item.asset.product),
            ui::value_cell(ui::format_money(item.value, currency)),
            rate_cell,
            ui::value_cell(ui::format_money(item.annual_cost, currency)),
        ]);
    }

    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("Model"),
        ui::header_cell("Annual cost"),
        ui::header_cell("Share"),
    ]);
    summary.add_row(vec![
        Cell::new("Traditional"),
        ui::value_cell(ui::format_money(comparison.traditional, currency)),
        Cell::new(""),
    ]);
    summary.add_row(vec![
        Cell::new(format!("Reino ({})", comparison.tier_label)),
        ui::value_cell(ui::format_money(comparison.reino, currency)),
        Cell::new(""),
    ]);
    summary.add_row(vec![
        Cell::new("Savings").add_attribute(Attribute::Bold),
        ui::savings_cell(
            ui::format_money(comparison.savings, currency),
            comparison.savings,
        ),
        ui::savings_cell(
            ui::format_percent(comparison.savings_percent),
            comparison.savings,
        ),
    ]);

    let mut output = format!(
        "Principal: {}  Turnover index: {}\n\n",
        ui::format_money(report.principal, currency),
        report.turnover_index
    );
    if !comparison.commission.per_item.is_empty() {
        output.push_str(&format!("{items}\n"));
    }
    output.push_str(&format!("{summary}\n"));

    for notice in &report.capped {
        output.push_str(&format!(
            "{}\n",
            ui::style_text(
                &format!(
                    "{} capped: requested {}, max available {}",
                    notice.asset,
                    ui::format_money(notice.requested, currency),
                    ui::format_money(notice.max_allowed, currency)
                ),
                ui::StyleType::Error,
            )
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commission::Allocation;
    use rust_decimal_macros::dec;

    fn scenario(principal: Money, allocations: Vec<Allocation>) -> Scenario {
        Scenario {
            name: "Test".to_string(),
            principal,
            turnover_index: None,
            allocations,
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_evaluate_caps_over_allocation() {
        let scenario = scenario(
            dec!(1000000),
            vec![
                Allocation::new("Renda Fixa", "CDB", dec!(600000)),
                Allocation::new("Renda Fixa", "LCI", dec!(600000)),
            ],
        );
        let report = evaluate(&scenario, &FeeCalculator::default(), TurnoverIndex::new(1));

        assert_eq!(report.capped.len(), 1);
        assert_eq!(report.capped[0].asset, AssetKey::new("Renda Fixa", "LCI"));
        assert_eq!(report.capped[0].max_allowed, dec!(400000));
        // Both at 1% after capping: 6000 + 4000
        assert_eq!(report.comparison.traditional, dec!(10000));
        assert_eq!(report.comparison.reino, dec!(10000));
        assert_eq!(report.comparison.savings, dec!(0));
    }

    #[test]
    fn test_display_report() {
        let scenario = scenario(
            dec!(2500000),
            vec![
                Allocation::new("Renda Fixa", "CDB", dec!(2000000)),
                Allocation::new("Cripto", "Bitcoin", dec!(500000)),
            ],
        );
        let report = evaluate(&scenario, &FeeCalculator::default(), TurnoverIndex::new(2));
        let output = display_report(&report, "BRL");

        assert!(output.contains("R$ 40.000,00"));
        assert!(output.contains("R$ 25.000,00"));
        assert!(output.contains("R$ 15.000,00"));
        assert!(output.contains("37.50%"));
        assert!(output.contains("unknown"));
        assert!(output.contains("Reino (1M - 3M)"));
        assert!(!output.contains("capped"));
    }

    #[test]
    fn test_display_report_lists_capped_allocations() {
        let scenario = scenario(
            dec!(100000),
            vec![
                Allocation::new("Renda Fixa", "CDB", dec!(100000)),
                Allocation::new("Renda Fixa", "LCA", dec!(5000)),
            ],
        );
        let report = evaluate(&scenario, &FeeCalculator::default(), TurnoverIndex::new(1));
        let output = display_report(&report, "BRL");

        assert!(output.contains("Renda Fixa / LCA capped"));
        assert!(output.contains("max available R$ 0,00"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let scenario = scenario(
            dec!(500000),
            vec![Allocation::new("Renda Fixa", "CDB", dec!(500000))],
        );
        let report = evaluate(&scenario, &FeeCalculator::default(), TurnoverIndex::new(1));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["name"], "Test");
        assert_eq!(json["turnover_index"], 1);
        assert_eq!(json["comparison"]["tier_label"], "< 1M");
        assert!(json["comparison"]["commission"]["per_item"].is_array());
    }

    #[test]
    fn test_run_without_scenarios() {
        let config: AppConfig = serde_yaml::from_str("scenarios: []").unwrap();
        assert!(run(&config, false).is_ok());
        assert!(run(&config, true).is_ok());
    }
}
