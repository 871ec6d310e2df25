//! Bot-builder conversation state machine.
//!
//! A chat session walks a fixed sequence of stages, each owning one
//! question and one validated extractor. The stage is persisted with the
//! session row; nothing is inferred from message counts. Extraction is
//! opportunistic, so a single message may fill several fields, but a
//! field only fills when it is still empty. A later "bitcoin" mention
//! cannot overwrite an earlier ETH choice.

use serde::{Deserialize, Serialize};

/// Stages of the bot-creation conversation, stored on the session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCreationStage {
    /// Waiting for the user to pick a base coin.
    AwaitingCoin,
    /// Waiting for a risk tolerance.
    AwaitingRisk,
    /// Waiting for a trading style / strategy.
    AwaitingStyle,
    /// All fields collected; waiting for the user to confirm creation.
    AwaitingConfirmation,
    /// Bot has been persisted; the session is closed.
    Created,
}

impl BotCreationStage {
    /// Stable string form used in the `chat_sessions.stage` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingCoin => "awaiting_coin",
            Self::AwaitingRisk => "awaiting_risk",
            Self::AwaitingStyle => "awaiting_style",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Created => "created",
        }
    }

    /// Parses the stored column value, defaulting unknown values to the
    /// first stage so a corrupted row restarts the flow instead of
    /// wedging the session.
    #[must_use]
    pub fn from_str_or_start(s: &str) -> Self {
        match s {
            "awaiting_risk" => Self::AwaitingRisk,
            "awaiting_style" => Self::AwaitingStyle,
            "awaiting_confirmation" => Self::AwaitingConfirmation,
            "created" => Self::Created,
            _ => Self::AwaitingCoin,
        }
    }
}

/// Risk tolerance options offered by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    /// Small positions, tight stops.
    Conservative,
    /// Middle of the road.
    Balanced,
    /// Larger positions, wider stops.
    Aggressive,
}

impl RiskProfile {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }
}

/// Fields collected across the conversation, persisted as session JSONB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDraft {
    /// Chosen base coin symbol (e.g. `"ETH"`).
    pub base_coin: Option<String>,
    /// Chosen risk tolerance.
    pub risk: Option<RiskProfile>,
    /// Chosen strategy keyword (e.g. `"momentum"`).
    pub strategy: Option<String>,
    /// Requested leverage, clamped to 1..=20.
    pub leverage: Option<u32>,
}

impl BotDraft {
    /// Fills still-empty fields from whatever the message mentions.
    /// Existing choices are never overwritten.
    pub fn absorb(&mut self, message: &str) {
        if self.base_coin.is_none() {
            self.base_coin = extract_coin(message).map(str::to_string);
        }
        if self.risk.is_none() {
            self.risk = extract_risk(message);
        }
        if self.strategy.is_none() {
            self.strategy = extract_strategy(message).map(str::to_string);
        }
        if self.leverage.is_none() {
            self.leverage = extract_leverage(message);
        }
    }

    /// `true` once coin, risk, and strategy are all chosen.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.base_coin.is_some() && self.risk.is_some() && self.strategy.is_some()
    }

    /// Stage implied by the first missing field.
    #[must_use]
    pub fn stage(&self) -> BotCreationStage {
        if self.base_coin.is_none() {
            BotCreationStage::AwaitingCoin
        } else if self.risk.is_none() {
            BotCreationStage::AwaitingRisk
        } else if self.strategy.is_none() {
            BotCreationStage::AwaitingStyle
        } else {
            BotCreationStage::AwaitingConfirmation
        }
    }
}

/// Outcome of feeding one user message through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// Assistant reply text (without any appended config block).
    pub reply: String,
    /// Stage the session should be persisted with.
    pub stage: BotCreationStage,
    /// `true` when the service should generate a config and signal
    /// `ready_to_create` to the client.
    pub ready_to_create: bool,
}

/// Advances the conversation with one user message.
///
/// `assistant_turns` is the number of assistant messages already
/// persisted for the session. Regardless of how much the first message
/// contains, the flow asks at least two questions before a config is
/// offered: `ready_to_create` requires a complete draft, a strategy
/// keyword or confirmation in the current message, and two prior
/// assistant turns.
#[must_use]
pub fn advance_conversation(draft: &mut BotDraft, message: &str, assistant_turns: u32) -> ChatTurn {
    draft.absorb(message);
    let stage = draft.stage();

    let triggered =
        extract_strategy(message).is_some() || is_confirmation(message);
    if stage == BotCreationStage::AwaitingConfirmation && triggered && assistant_turns >= 2 {
        return ChatTurn {
            reply: confirmation_reply(draft),
            stage,
            ready_to_create: true,
        };
    }

    ChatTurn {
        reply: question_for(stage, draft),
        stage,
        ready_to_create: false,
    }
}

fn question_for(stage: BotCreationStage, draft: &BotDraft) -> String {
    match stage {
        BotCreationStage::AwaitingCoin => {
            "Which coin should the bot trade? Popular picks are BTC, ETH and SOL.".to_string()
        }
        BotCreationStage::AwaitingRisk => format!(
            "Got it{}. What risk tolerance should I configure: conservative, balanced or aggressive?",
            draft
                .base_coin
                .as_deref()
                .map(|c| format!(", {c} it is"))
                .unwrap_or_default()
        ),
        BotCreationStage::AwaitingStyle => {
            "And what trading style do you prefer? For example momentum, grid, DCA, scalping or swing."
                .to_string()
        }
        BotCreationStage::AwaitingConfirmation => {
            "I have everything I need. Say the word and I will draft the bot configuration."
                .to_string()
        }
        BotCreationStage::Created => {
            "This bot has already been created. Start a new session to build another one."
                .to_string()
        }
    }
}

fn confirmation_reply(draft: &BotDraft) -> String {
    let coin = draft.base_coin.as_deref().unwrap_or("BTC");
    let strategy = draft.strategy.as_deref().unwrap_or("momentum");
    format!(
        "Here is your {strategy} bot for {coin}. Review the configuration below and confirm to create it."
    )
}

// ── Extractors ──────────────────────────────────────────────────────────

const COINS: &[(&str, &[&str])] = &[
    ("BTC", &["btc", "bitcoin"]),
    ("ETH", &["eth", "ethereum", "ether"]),
    ("SOL", &["sol", "solana"]),
    ("BNB", &["bnb", "binance"]),
    ("XRP", &["xrp", "ripple"]),
    ("ADA", &["ada", "cardano"]),
    ("DOGE", &["doge", "dogecoin"]),
    ("DOT", &["dot", "polkadot"]),
    ("AVAX", &["avax", "avalanche"]),
    ("LINK", &["link", "chainlink"]),
];

/// Strategy keywords that gate config generation.
pub const STRATEGY_KEYWORDS: &[&str] = &[
    "momentum",
    "grid",
    "dca",
    "scalping",
    "swing",
    "arbitrage",
    "trend",
    "breakout",
    "mean reversion",
];

fn tokens(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the first coin mentioned as a whole word, in message order.
#[must_use]
pub fn extract_coin(message: &str) -> Option<&'static str> {
    tokens(message).iter().find_map(|t| {
        COINS
            .iter()
            .find(|(_, aliases)| aliases.contains(&t.as_str()))
            .map(|(symbol, _)| *symbol)
    })
}

/// Maps risk vocabulary onto a [`RiskProfile`].
#[must_use]
pub fn extract_risk(message: &str) -> Option<RiskProfile> {
    let toks = tokens(message);
    let has = |words: &[&str]| toks.iter().any(|t| words.contains(&t.as_str()));
    if has(&["conservative", "low", "safe", "careful"]) {
        Some(RiskProfile::Conservative)
    } else if has(&["balanced", "moderate", "medium", "middle"]) {
        Some(RiskProfile::Balanced)
    } else if has(&["aggressive", "high", "risky", "bold"]) {
        Some(RiskProfile::Aggressive)
    } else {
        None
    }
}

/// Finds the first strategy keyword in the message.
#[must_use]
pub fn extract_strategy(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    let toks = tokens(message);
    STRATEGY_KEYWORDS.iter().copied().find(|kw| {
        if kw.contains(' ') {
            lower.contains(kw)
        } else {
            toks.iter().any(|t| t == kw)
        }
    })
}

/// Parses a `<n>x` leverage token (e.g. `"5x"`), clamped to 1..=20.
#[must_use]
pub fn extract_leverage(message: &str) -> Option<u32> {
    for raw in message.split_whitespace() {
        let t = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if let Some(num) = t.strip_suffix(['x', 'X'])
            && !num.is_empty()
            && let Ok(n) = num.parse::<u32>()
        {
            return Some(n.clamp(1, 20));
        }
    }
    None
}

fn is_confirmation(message: &str) -> bool {
    let toks = tokens(message);
    ["yes", "confirm", "create", "go", "ok", "sure", "ready"]
        .iter()
        .any(|w| toks.iter().any(|t| t == w))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn coin_extraction_matches_whole_words_only() {
        assert_eq!(extract_coin("I live in Canada"), None); // no "ada" inside words
        assert_eq!(extract_coin("give me an ADA bot"), Some("ADA"));
        assert_eq!(extract_coin("ethereum please"), Some("ETH"));
    }

    #[test]
    fn first_mentioned_coin_wins_within_a_message() {
        assert_eq!(extract_coin("ETH, not bitcoin"), Some("ETH"));
        assert_eq!(extract_coin("bitcoin or maybe eth"), Some("BTC"));
    }

    #[test]
    fn draft_never_overwrites_a_chosen_coin() {
        let mut draft = BotDraft::default();
        draft.absorb("a momentum bot for ETH with 5x leverage");
        assert_eq!(draft.base_coin.as_deref(), Some("ETH"));

        draft.absorb("bitcoin style sounds fine too");
        assert_eq!(draft.base_coin.as_deref(), Some("ETH"));
    }

    #[test]
    fn leverage_token_parses_and_clamps() {
        assert_eq!(extract_leverage("use 5x leverage"), Some(5));
        assert_eq!(extract_leverage("go 100x!"), Some(20));
        assert_eq!(extract_leverage("no leverage mentioned"), None);
        assert_eq!(extract_leverage("x alone is not leverage"), None);
    }

    #[test]
    fn risk_synonyms_map_to_profiles() {
        assert_eq!(extract_risk("keep it safe"), Some(RiskProfile::Conservative));
        assert_eq!(extract_risk("something moderate"), Some(RiskProfile::Balanced));
        assert_eq!(extract_risk("high risk high reward"), Some(RiskProfile::Aggressive));
        assert_eq!(extract_risk("whatever you think"), None);
    }

    #[test]
    fn strategy_phrase_and_token_match() {
        assert_eq!(extract_strategy("try mean reversion"), Some("mean reversion"));
        assert_eq!(extract_strategy("a grid bot"), Some("grid"));
        assert_eq!(extract_strategy("no hints here"), None);
    }

    #[test]
    fn stage_follows_first_missing_field() {
        let mut draft = BotDraft::default();
        assert_eq!(draft.stage(), BotCreationStage::AwaitingCoin);
        draft.base_coin = Some("ETH".to_string());
        assert_eq!(draft.stage(), BotCreationStage::AwaitingRisk);
        draft.risk = Some(RiskProfile::Balanced);
        assert_eq!(draft.stage(), BotCreationStage::AwaitingStyle);
        draft.strategy = Some("momentum".to_string());
        assert_eq!(draft.stage(), BotCreationStage::AwaitingConfirmation);
    }

    #[test]
    fn not_ready_before_two_assistant_turns_even_with_keywords() {
        // A first message that answers every question still only yields
        // a question, twice, before a config can be offered.
        for turns in [0, 1] {
            let mut draft = BotDraft::default();
            let turn = advance_conversation(
                &mut draft,
                "Create a momentum trading bot for ETH, aggressive, 5x leverage",
                turns,
            );
            assert!(draft.is_complete());
            assert!(!turn.ready_to_create);
        }
    }

    #[test]
    fn ready_after_two_turns_with_complete_draft_and_keyword() {
        let mut draft = BotDraft {
            base_coin: Some("ETH".to_string()),
            risk: Some(RiskProfile::Conservative),
            strategy: Some("momentum".to_string()),
            leverage: Some(5),
        };
        let turn = advance_conversation(&mut draft, "momentum it is, go ahead", 2);
        assert!(turn.ready_to_create);
        assert_eq!(turn.stage, BotCreationStage::AwaitingConfirmation);
    }

    #[test]
    fn incomplete_draft_is_never_ready() {
        let mut draft = BotDraft {
            base_coin: Some("ETH".to_string()),
            risk: None,
            strategy: Some("momentum".to_string()),
            leverage: None,
        };
        let turn = advance_conversation(&mut draft, "momentum please", 5);
        assert!(!turn.ready_to_create);
        assert_eq!(turn.stage, BotCreationStage::AwaitingRisk);
    }

    #[test]
    fn full_flow_keeps_the_asked_for_coin() {
        // "Create a momentum trading bot ETH 5x leverage" → ask risk
        let mut draft = BotDraft::default();
        let t1 = advance_conversation(&mut draft, "Create a momentum trading bot ETH 5x leverage", 0);
        assert!(!t1.ready_to_create);
        assert_eq!(t1.stage, BotCreationStage::AwaitingRisk);

        // answer risk → ask nothing more than confirmation
        let t2 = advance_conversation(&mut draft, "conservative please", 1);
        assert!(!t2.ready_to_create);
        assert_eq!(t2.stage, BotCreationStage::AwaitingConfirmation);

        // a bitcoin-class keyword in the trigger message must not flip the coin
        let t3 = advance_conversation(&mut draft, "yes, momentum like the bitcoin bots", 2);
        assert!(t3.ready_to_create);
        assert_eq!(draft.base_coin.as_deref(), Some("ETH"));
        assert_eq!(draft.leverage, Some(5));
    }

    #[test]
    fn stage_round_trips_through_column_form() {
        for stage in [
            BotCreationStage::AwaitingCoin,
            BotCreationStage::AwaitingRisk,
            BotCreationStage::AwaitingStyle,
            BotCreationStage::AwaitingConfirmation,
            BotCreationStage::Created,
        ] {
            assert_eq!(BotCreationStage::from_str_or_start(stage.as_str()), stage);
        }
        assert_eq!(
            BotCreationStage::from_str_or_start("garbage"),
            BotCreationStage::AwaitingCoin
        );
    }
}
