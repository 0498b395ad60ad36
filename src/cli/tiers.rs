use super::ui;
use crate::core::config::AppConfig;
use crate::core::tiers::{FeeSchedule, TierPricing};
use anyhow::Result;
use comfy_table::Cell;

/// Prints the flat-advisory schedule in use.
pub fn run(config: &AppConfig) -> Result<()> {
    let calculator = config.fee_calculator()?;
    println!(
        "\n{}\n",
        ui::style_text("Flat advisory fee schedule", ui::StyleType::Title)
    );
    println!("{}", display_schedule(&calculator.schedule, &config.currency));
    Ok(())
}

fn display_schedule(schedule: &FeeSchedule, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Tier"),
        ui::header_cell("From"),
        ui::header_cell("Up to"),
        ui::header_cell("Annual fee"),
    ]);

    for tier in schedule.tiers() {
        let fee = match tier.pricing {
            TierPricing::Flat(fee) => format!("{} flat", ui::format_money(fee, currency)),
            TierPricing::Rate(rate) => format!("{} of principal", ui::format_percent(rate)),
        };
        table.add_row(vec![
            Cell::new(&tier.label),
            ui::value_cell(ui::format_money(tier.min_inclusive, currency)),
            ui::format_optional_cell(tier.max_exclusive, |max| ui::format_money(max, currency)),
            ui::value_cell(fee),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_schedule_lists_every_tier() {
        let output = display_schedule(&FeeSchedule::default(), "BRL");
        for label in ["< 1M", "1M - 3M", "3M - 5M", "5M - 10M", "10M - 20M", "20M - 50M", "50M+"] {
            assert!(output.contains(label), "missing {label}");
        }
        assert!(output.contains("R$ 799,00 flat"));
        assert!(output.contains("1.00% of principal"));
        assert!(output.contains("N/A"));
    }
}
