//! Agents: human players and bots.
//!
//! An [`Agent`] is either a human, who accepts every contract offered, or a
//! bot, which carries a [`BotProfile`], remembers its last report per claim,
//! and keeps a history of every action it has taken. The [`AgentRoster`]
//! holds all agents in join order.

use std::collections::BTreeMap;

use plotcoin_economy::{Claim, ContractTerms, PlotReport, RewardLottery};
use plotcoin_types::{AgentId, BotAction, ClaimId};
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use tracing::debug;

use crate::decision::{ActionHistory, DefaultPrices, decide};
use crate::error::AgentError;
use crate::negotiation::evaluate_offer;
use crate::profile::BotProfile;

/// The result of one analysis period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// The chosen action, already appended to the history.
    pub action: BotAction,
    /// The report the decision was based on.
    pub report: PlotReport,
}

/// Bot-only state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotState {
    profile: BotProfile,
    history: ActionHistory,
    /// Last report per claim; the baseline for the next deltas.
    reports: BTreeMap<ClaimId, PlotReport>,
}

impl BotState {
    /// Fresh state for a newly spawned bot.
    pub const fn new(profile: BotProfile) -> Self {
        Self {
            profile,
            history: ActionHistory::new(),
            reports: BTreeMap::new(),
        }
    }

    /// The bot's fixed parameters.
    pub const fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// Every action taken so far.
    pub const fn history(&self) -> &ActionHistory {
        &self.history
    }

    /// The most recent report for `claim`.
    pub fn last_report(&self, claim: ClaimId) -> Option<&PlotReport> {
        self.reports.get(&claim)
    }

    /// Run one analysis period for `claim`: take a report against the
    /// previous one, choose an action, and record it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Economy`] if the report cannot be computed.
    /// Nothing is recorded in that case.
    pub fn analyze(
        &mut self,
        claim: &Claim,
        prices: DefaultPrices,
        exchange_rate: Decimal,
    ) -> Result<Analysis, AgentError> {
        let params = self.profile.report_params(exchange_rate);
        let report = claim.report(self.reports.get(&claim.id()), &params)?;
        let action = decide(&report, &self.profile, prices);

        self.history.record(action);
        self.reports.insert(claim.id(), report.clone());
        debug!(
            claim = %claim.id(),
            ?action,
            cash = %report.cash,
            self_sustainable = report.self_sustainable,
            surplus = report.surplus_energy,
            "bot analysis complete"
        );
        Ok(Analysis { action, report })
    }
}

/// Human or bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentKind {
    /// A player driven by the presentation layer.
    Human,
    /// An autonomous bot.
    Bot(BotState),
}

/// One participant in the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    name: String,
    kind: AgentKind,
}

impl Agent {
    /// Create a human agent.
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            kind: AgentKind::Human,
        }
    }

    /// Create a bot agent.
    pub fn bot(name: impl Into<String>, profile: BotProfile) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            kind: AgentKind::Bot(BotState::new(profile)),
        }
    }

    /// The agent's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human or bot.
    pub const fn kind(&self) -> &AgentKind {
        &self.kind
    }

    /// Whether this agent is a bot.
    pub const fn is_bot(&self) -> bool {
        matches!(self.kind, AgentKind::Bot(_))
    }

    /// Bot state, if this is a bot.
    pub const fn bot_state(&self) -> Option<&BotState> {
        match &self.kind {
            AgentKind::Bot(state) => Some(state),
            AgentKind::Human => None,
        }
    }

    /// Mutable bot state, if this is a bot.
    pub const fn bot_state_mut(&mut self) -> Option<&mut BotState> {
        match &mut self.kind {
            AgentKind::Bot(state) => Some(state),
            AgentKind::Human => None,
        }
    }

    /// Respond to an offer to import energy into `claim`.
    ///
    /// Humans accept everything. Bots run [`evaluate_offer`] over their own
    /// analysis window.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Economy`] on arithmetic overflow.
    pub fn negotiate_contract(
        &self,
        claim: &Claim,
        terms: &ContractTerms,
        lottery: &RewardLottery,
    ) -> Result<bool, AgentError> {
        match &self.kind {
            AgentKind::Human => Ok(true),
            AgentKind::Bot(state) => evaluate_offer(claim, state.profile.window_mins, terms, lottery),
        }
    }
}

/// Every agent in join order.
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    agents: Vec<Agent>,
}

impl AgentRoster {
    /// An empty roster.
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Add an agent and return its id.
    pub fn add(&mut self, agent: Agent) -> AgentId {
        let id = agent.id();
        self.agents.push(agent);
        id
    }

    /// Number of agents.
    pub const fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the roster is empty.
    pub const fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Look up an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the id is unknown.
    pub fn get(&self, id: AgentId) -> Result<&Agent, AgentError> {
        self.agents
            .iter()
            .find(|agent| agent.id == id)
            .ok_or(AgentError::AgentNotFound(id))
    }

    /// Look up an agent mutably.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the id is unknown.
    pub fn get_mut(&mut self, id: AgentId) -> Result<&mut Agent, AgentError> {
        self.agents
            .iter_mut()
            .find(|agent| agent.id == id)
            .ok_or(AgentError::AgentNotFound(id))
    }

    /// Bot state of a bot.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] or [`AgentError::NotABot`].
    pub fn bot_mut(&mut self, id: AgentId) -> Result<&mut BotState, AgentError> {
        self.get_mut(id)?
            .bot_state_mut()
            .ok_or(AgentError::NotABot(id))
    }

    /// Agents in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// A uniformly chosen agent other than `except`.
    pub fn pick_other<R: Rng + ?Sized>(&self, except: AgentId, rng: &mut R) -> Option<AgentId> {
        let others: Vec<AgentId> = self
            .agents
            .iter()
            .map(Agent::id)
            .filter(|id| *id != except)
            .collect();
        others.choose(rng).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use plotcoin_economy::EquipmentCatalog;
    use plotcoin_types::{EquipmentKind, GridCoord};
    use plotcoin_world::ClaimFootprint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::profile::InvestmentPolicy;

    const PRICES: DefaultPrices = DefaultPrices {
        miner: dec!(2000),
        panel: dec!(250),
    };

    fn profile() -> BotProfile {
        BotProfile {
            window_mins: 5,
            cash_ratio: dec!(0.5),
            self_sustain_ratio: dec!(0.5),
            policy: InvestmentPolicy::MinersWhenSelfSustaining,
        }
    }

    fn stocked_claim(owner: AgentId) -> Claim {
        let catalog = EquipmentCatalog::default();
        let footprint = ClaimFootprint::new(ClaimId::new(), owner, GridCoord::ORIGIN, None, 1);
        let mut claim = Claim::new(footprint, dec!(5000));
        claim
            .install(catalog.default_for(EquipmentKind::Miner).build(claim.id(), GridCoord::ORIGIN))
            .unwrap();
        claim
            .install(catalog.default_for(EquipmentKind::Panel).build(claim.id(), GridCoord::new(1, 0)))
            .unwrap();
        claim
    }

    #[test]
    fn every_analysis_records_one_action() {
        let mut bot = Agent::bot("bot-1", profile());
        let claim = stocked_claim(bot.id());
        let state = bot.bot_state_mut().unwrap();
        for expected_len in 1..=4 {
            state.analyze(&claim, PRICES, dec!(23000)).unwrap();
            assert_eq!(state.history().len(), expected_len);
        }
    }

    #[test]
    fn analysis_uses_previous_report_as_baseline() {
        let mut bot = Agent::bot("bot-1", profile());
        let mut claim = stocked_claim(bot.id());
        claim.record_self_produced(2000).unwrap();
        let state = bot.bot_state_mut().unwrap();

        let first = state.analyze(&claim, PRICES, dec!(23000)).unwrap();
        assert_eq!(first.report.self_generated, 2000);
        // Cash 2750 / value 2250 > 0.5 and 2000 >= 686 -> buy a miner.
        assert_eq!(first.action, BotAction::BuyMiner);

        claim.record_self_produced(100).unwrap();
        let second = state.analyze(&claim, PRICES, dec!(23000)).unwrap();
        assert_eq!(second.report.self_generated, 100);
        assert_eq!(second.action, BotAction::BuyPanel);
        assert_eq!(state.last_report(claim.id()), Some(&second.report));
    }

    #[test]
    fn humans_accept_every_offer() {
        let human = Agent::human("player");
        let claim = stocked_claim(human.id());
        let terms = ContractTerms {
            watts_per_period: 1,
            price_per_watt: dec!(1000000),
            duration: 5,
        };
        let lottery = RewardLottery::new(dec!(6.5), dec!(23000));
        assert!(human.negotiate_contract(&claim, &terms, &lottery).unwrap());
        assert!(!human.is_bot());
        assert!(human.bot_state().is_none());
    }

    #[test]
    fn roster_lookup_and_pick_other() {
        let mut roster = AgentRoster::new();
        let a = roster.add(Agent::human("a"));
        let b = roster.add(Agent::bot("b", profile()));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(b).unwrap().name(), "b");
        assert!(matches!(roster.bot_mut(a), Err(AgentError::NotABot(_))));
        assert!(matches!(roster.get(AgentId::new()), Err(AgentError::AgentNotFound(_))));

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(roster.pick_other(a, &mut rng), Some(b));
        }
        let mut lonely = AgentRoster::new();
        let only = lonely.add(Agent::human("solo"));
        assert_eq!(lonely.pick_other(only, &mut rng), None);
    }
}
