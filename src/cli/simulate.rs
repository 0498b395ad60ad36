use super::ui;
use crate::core::comparison::FeeCalculator;
use crate::core::config::{AppConfig, Scenario, Step};
use crate::core::events::{StoreEvent, Topic};
use crate::core::store::CalculatorStore;
use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Replays every scenario's steps, printing each published event.
pub fn run(config: &AppConfig) -> Result<()> {
    let calculator = config.fee_calculator()?;
    let scenarios: Vec<&Scenario> = config
        .scenarios
        .iter()
        .filter(|s| !s.steps.is_empty())
        .collect();

    if scenarios.is_empty() {
        println!("No scenario steps to simulate.");
        return Ok(());
    }

    for (i, scenario) in scenarios.iter().enumerate() {
        let (store, log) = replay(scenario, &calculator, config);
        println!(
            "\nScenario: {}\n",
            ui::style_text(&scenario.name, ui::StyleType::Title)
        );
        for line in log {
            println!("  {line}");
        }
        println!("\n{}", display_state(&store, &config.currency));

        if i < scenarios.len() - 1 {
            ui::print_separator();
        }
    }
    Ok(())
}

/// Runs the steps of a scenario and returns the final store with the event log.
pub fn replay(
    scenario: &Scenario,
    calculator: &FeeCalculator,
    config: &AppConfig,
) -> (CalculatorStore, Vec<String>) {
    let mut store = CalculatorStore::new(
        calculator.clone(),
        scenario.principal,
        config.turnover_for(scenario),
    );
    let log = Rc::new(RefCell::new(Vec::new()));
    for topic in [
        Topic::Principal,
        Topic::Allocation,
        Topic::Selection,
        Topic::Turnover,
    ] {
        let log = Rc::clone(&log);
        let currency = config.currency.clone();
        store.subscribe(topic, move |event| {
            log.borrow_mut().push(describe_event(event, &currency))
        });
    }

    for step in &scenario.steps {
        debug!(?step, "Applying step");
        if !apply_step(&mut store, step) {
            warn!(?step, scenario = %scenario.name, "Step had no effect");
            log.borrow_mut().push(format!("ignored: {step:?}"));
        }
    }

    let lines = log.borrow().clone();
    (store, lines)
}

/// Applies one step. Returns false when it changed nothing.
fn apply_step(store: &mut CalculatorStore, step: &Step) -> bool {
    match step {
        Step::SetTotal(total) => {
            store.set_total_principal(*total);
            true
        }
        Step::Select(asset) => store.select(asset.clone()),
        Step::Deselect(asset) => store.deselect(asset),
        Step::Clear(asset) => store.clear(asset),
        Step::Remove(asset) => store.remove(asset),
        Step::Allocate(allocation) => store
            .set_allocation(&allocation.asset, allocation.value)
            .is_some(),
        Step::Turnover(index) => {
            store.set_turnover_index((*index).into());
            true
        }
        Step::Reset => {
            store.reset();
            true
        }
    }
}

fn describe_event(event: &StoreEvent, currency: &str) -> String {
    match event {
        StoreEvent::PrincipalChanged { previous, current } => format!(
            "principal {} -> {}",
            ui::format_money(*previous, currency),
            ui::format_money(*current, currency)
        ),
        StoreEvent::Rebalanced { ratio } => format!(
            "rebalanced allocations to {}",
            ui::format_percent(*ratio * Decimal::ONE_HUNDRED)
        ),
        StoreEvent::AllocationChanged { asset, update } => format!(
            "{asset} = {} ({})",
            ui::format_money(update.capped_value, currency),
            ui::format_percent(update.percentage_of_total)
        ),
        StoreEvent::AllocationCapped {
            asset,
            requested,
            max_allowed,
        } => format!(
            "{asset} capped: requested {}, max available {}",
            ui::format_money(*requested, currency),
            ui::format_money(*max_allowed, currency)
        ),
        StoreEvent::AssetSelected { asset } => format!("selected {asset}"),
        StoreEvent::AssetDeselected { asset } => format!("deselected {asset}"),
        StoreEvent::AssetRemoved { asset } => format!("removed {asset}"),
        StoreEvent::TurnoverChanged { previous, current } => {
            format!("turnover index {previous} -> {current}")
        }
        StoreEvent::Reset => "reset".to_string(),
    }
}

fn display_state(store: &CalculatorStore, currency: &str) -> String {
    let state = store.state();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Investment"),
        ui::header_cell("Value"),
        ui::header_cell("Allocation"),
    ]);

    for item in state.items() {
        if item.is_selected() {
            table.add_row(vec![
                Cell::new(item.asset.to_string()),
                ui::value_cell(ui::format_money(item.capped_value, currency)),
                ui::format_percentage_cell(item.percentage_of_total),
            ]);
        } else {
            table.add_row(vec![
                Cell::new(ui::style_text(&item.asset.to_string(), ui::StyleType::Subtle)),
                ui::na_cell(),
                ui::na_cell(),
            ]);
        }
    }

    let comparison = store.comparison();
    format!(
        "{table}\n\n{}: {} of {} allocated ({})\n{}: {}  {}: {}  {}: {}\n",
        ui::style_text("Portfolio", ui::StyleType::TotalLabel),
        ui::format_money(state.allocated_total(), currency),
        ui::format_money(state.total_principal(), currency),
        ui::format_percent(state.allocated_percentage()),
        ui::style_text("Traditional", ui::StyleType::TotalLabel),
        ui::format_money(comparison.traditional, currency),
        ui::style_text("Reino", ui::StyleType::TotalLabel),
        ui::format_money(comparison.reino, currency),
        ui::style_text("Savings", ui::StyleType::TotalLabel),
        ui::style_text(
            &ui::format_money(comparison.savings, currency),
            ui::StyleType::TotalValue
        ),
    )
}
