use super::asset::AssetKey;
use super::commission::{Allocation, PricingMode, TurnoverIndex, default_table};
use super::comparison::FeeCalculator;
use super::money::Money;
use super::tiers::{FeeSchedule, default_schedule};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// A user edit replayed through the calculator store.
///
/// Written in YAML as a single-key map (`- select: {...}`), or a bare
/// string for `reset`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SetTotal(Money),
    Select(AssetKey),
    Deselect(AssetKey),
    Clear(AssetKey),
    Remove(AssetKey),
    Allocate(Allocation),
    Turnover(i64),
    Reset,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Scenario {
    pub name: String,
    pub principal: Money,
    #[serde(default)]
    pub turnover_index: Option<TurnoverIndex>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

fn default_currency() -> String {
    "BRL".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub pricing_mode: PricingMode,
    #[serde(default)]
    pub turnover_index: TurnoverIndex,
    #[serde(default)]
    pub fee_schedule: Option<FeeSchedule>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "reino", "reino")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Fee calculator for this configuration, validating any custom schedule.
    pub fn fee_calculator(&self) -> Result<FeeCalculator> {
        let schedule = match &self.fee_schedule {
            Some(schedule) => {
                schedule
                    .validate()
                    .context("Invalid fee_schedule in config")?;
                schedule.clone()
            }
            None => default_schedule().clone(),
        };
        Ok(FeeCalculator::new(
            schedule,
            default_table().clone(),
            self.pricing_mode,
        ))
    }

    /// Turnover index of a scenario, falling back to the global one.
    pub fn turnover_for(&self, scenario: &Scenario) -> TurnoverIndex {
        scenario.turnover_index.unwrap_or(self.turnover_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "BRL"
pricing_mode: static
turnover_index: 3
scenarios:
  - name: "Conservative"
    principal: 2000000
    allocations:
      - category: "Renda Fixa"
        product: "CDB"
        value: 1500000
      - category: "Renda Fixa"
        product: "Tesouro Direto"
        value: 500000.50
  - name: "Replay"
    principal: 1000000
    turnover_index: 1
    steps:
      - select:
          category: "Renda Fixa"
          product: "CDB"
      - allocate:
          category: "Renda Fixa"
          product: "CDB"
          value: 600000
      - set_total: 500000
      - turnover: 4
      - clear:
          category: "Renda Fixa"
          product: "CDB"
      - deselect:
          category: "Renda Fixa"
          product: "CDB"
      - remove: { category: "Renda Fixa", product: "CDB" }
      - reset
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "BRL");
        assert_eq!(config.pricing_mode, PricingMode::Static);
        assert_eq!(config.turnover_index.get(), 3);
        assert!(config.fee_schedule.is_none());
        assert_eq!(config.scenarios.len(), 2);

        let conservative = &config.scenarios[0];
        assert_eq!(conservative.principal, dec!(2000000));
        assert_eq!(conservative.allocations.len(), 2);
        assert_eq!(
            conservative.allocations[1],
            Allocation::new("Renda Fixa", "Tesouro Direto", dec!(500000.50))
        );
        assert!(conservative.steps.is_empty());
        assert_eq!(config.turnover_for(conservative).get(), 3);

        let replay = &config.scenarios[1];
        assert_eq!(config.turnover_for(replay).get(), 1);
        assert_eq!(
            replay.steps,
            vec![
                Step::Select(AssetKey::new("Renda Fixa", "CDB")),
                Step::Allocate(Allocation::new("Renda Fixa", "CDB", dec!(600000))),
                Step::SetTotal(dec!(500000)),
                Step::Turnover(4),
                Step::Clear(AssetKey::new("Renda Fixa", "CDB")),
                Step::Deselect(AssetKey::new("Renda Fixa", "CDB")),
                Step::Remove(AssetKey::new("Renda Fixa", "CDB")),
                Step::Reset,
            ]
        );
    }

    #[test]
    fn test_steps_serialize_in_the_form_they_are_read() {
        let scenario = Scenario {
            name: "Round trip".to_string(),
            principal: dec!(1000),
            turnover_index: None,
            allocations: Vec::new(),
            steps: vec![
                Step::Select(AssetKey::new("Renda Fixa", "CDB")),
                Step::SetTotal(dec!(500)),
                Step::Reset,
            ],
        };
        let yaml = serde_yaml::to_string(&scenario).unwrap();
        assert!(yaml.contains("- select:"));
        assert!(yaml.contains("- reset"));
        assert!(!yaml.contains('!'));

        let parsed: Scenario = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.steps, scenario.steps);
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("scenarios: []").expect("Failed to deserialize");
        assert_eq!(config.currency, "BRL");
        assert_eq!(config.pricing_mode, PricingMode::TurnoverAdjusted);
        assert_eq!(config.turnover_index, TurnoverIndex::default());
        assert_eq!(config.fee_calculator().unwrap(), FeeCalculator::default());
    }

    #[test]
    fn test_custom_fee_schedule() {
        let yaml_str = r#"
fee_schedule:
  - label: "small"
    min: 0
    max: 500000
    flat_fee: 500
  - label: "large"
    min: 500000
    rate: 0.9
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let calculator = config.fee_calculator().unwrap();
        assert_eq!(calculator.flat_advisory_fee(dec!(100000)).annual_fee, dec!(500));
        assert_eq!(calculator.flat_advisory_fee(dec!(1000000)).tier_label, "large");
    }

    #[test]
    fn test_invalid_fee_schedule_is_rejected() {
        let yaml_str = r#"
fee_schedule:
  - label: "small"
    min: 0
    max: 500000
    flat_fee: 500
  - label: "large"
    min: 600000
    rate: 0.9
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let err = config.fee_calculator().unwrap_err();
        assert!(format!("{err:#}").contains("Invalid fee_schedule"));
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/nonexistent/reino/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
