//! Trading bot configuration assembled from a completed draft.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::chat::{BotDraft, RiskProfile};

/// Advanced knobs derived from the chosen risk profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    /// Take-profit threshold in percent.
    pub take_profit_pct: Decimal,
    /// Stop-loss threshold in percent.
    pub stop_loss_pct: Decimal,
    /// Maximum concurrently open positions.
    pub max_open_positions: u32,
}

impl AdvancedSettings {
    /// Defaults per risk profile.
    #[must_use]
    pub fn for_risk(risk: RiskProfile) -> Self {
        match risk {
            RiskProfile::Conservative => Self {
                take_profit_pct: dec!(1.5),
                stop_loss_pct: dec!(1.0),
                max_open_positions: 1,
            },
            RiskProfile::Balanced => Self {
                take_profit_pct: dec!(3.0),
                stop_loss_pct: dec!(2.0),
                max_open_positions: 2,
            },
            RiskProfile::Aggressive => Self {
                take_profit_pct: dec!(6.0),
                stop_loss_pct: dec!(4.0),
                max_open_positions: 3,
            },
        }
    }
}

/// Full bot configuration, embedded in the final chat reply and persisted
/// on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Display name, e.g. `"ETH Momentum Bot"`.
    pub name: String,
    /// Traded base coin symbol.
    pub base_coin: String,
    /// Quote currency; the platform settles everything in USDT.
    pub quote_coin: String,
    /// Strategy keyword.
    pub strategy: String,
    /// Leverage multiplier.
    pub leverage: u32,
    /// Risk profile the advanced settings were derived from.
    pub risk_profile: RiskProfile,
    /// Derived advanced settings.
    pub advanced_settings: AdvancedSettings,
}

impl BotConfig {
    /// Builds a config from a completed draft. Returns `None` while any
    /// of coin, risk, or strategy is still missing.
    #[must_use]
    pub fn from_draft(draft: &BotDraft) -> Option<Self> {
        let base_coin = draft.base_coin.clone()?;
        let risk = draft.risk?;
        let strategy = draft.strategy.clone()?;
        let leverage = draft.leverage.unwrap_or(1);

        Some(Self {
            name: format!("{base_coin} {} Bot", title_case(&strategy)),
            base_coin,
            quote_coin: "USDT".to_string(),
            strategy,
            leverage,
            risk_profile: risk,
            advanced_settings: AdvancedSettings::for_risk(risk),
        })
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn complete_draft() -> BotDraft {
        BotDraft {
            base_coin: Some("ETH".to_string()),
            risk: Some(RiskProfile::Conservative),
            strategy: Some("momentum".to_string()),
            leverage: Some(5),
        }
    }

    #[test]
    fn config_from_complete_draft() {
        let Some(config) = BotConfig::from_draft(&complete_draft()) else {
            panic!("expected a config");
        };
        assert_eq!(config.name, "ETH Momentum Bot");
        assert_eq!(config.base_coin, "ETH");
        assert_eq!(config.quote_coin, "USDT");
        assert_eq!(config.strategy, "momentum");
        assert_eq!(config.leverage, 5);
    }

    #[test]
    fn incomplete_draft_yields_none() {
        let mut draft = complete_draft();
        draft.risk = None;
        assert!(BotConfig::from_draft(&draft).is_none());
    }

    #[test]
    fn leverage_defaults_to_one() {
        let mut draft = complete_draft();
        draft.leverage = None;
        let Some(config) = BotConfig::from_draft(&draft) else {
            panic!("expected a config");
        };
        assert_eq!(config.leverage, 1);
    }

    #[test]
    fn advanced_settings_scale_with_risk() {
        let conservative = AdvancedSettings::for_risk(RiskProfile::Conservative);
        let aggressive = AdvancedSettings::for_risk(RiskProfile::Aggressive);
        assert!(aggressive.take_profit_pct > conservative.take_profit_pct);
        assert!(aggressive.max_open_positions > conservative.max_open_positions);
    }

    #[test]
    fn multi_word_strategy_makes_a_readable_name() {
        let mut draft = complete_draft();
        draft.strategy = Some("mean reversion".to_string());
        let Some(config) = BotConfig::from_draft(&draft) else {
            panic!("expected a config");
        };
        assert_eq!(config.name, "ETH Mean Reversion Bot");
    }
}
