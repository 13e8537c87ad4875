//! The simulation session: one context object that owns all shared state.
//!
//! A [`Session`] owns the spatial index, the plot allocator, the claim
//! registry, the reward lottery, the agent roster, contracts, weather, the
//! timer registry, and the seeded random source. Every component receives
//! the pieces it needs by reference; there is no process-wide state.
//!
//! # Inbound commands
//!
//! - [`Session::request_new_claim`] -- place a new claim for an agent
//! - [`Session::request_purchase`] -- buy equipment for a claim
//! - [`Session::query_occupancy`] -- is a tile taken
//! - [`Session::highlight_claim`] / [`Session::clear_highlight`]
//!
//! # Timeline
//!
//! [`Session::advance_to`] pops due timers one at a time and dispatches
//! them on a single logical thread, so every counter mutation is atomic
//! with respect to every other timer.
//!
//! # Outbound
//!
//! Presentation commands and session events accumulate in an outbox and are
//! taken with [`Session::drain_commands`] and [`Session::drain_events`].

use plotcoin_agents::{Agent, AgentError, AgentRoster, BotProfile, DefaultPrices, draft_terms};
use plotcoin_economy::{
    CatalogItem, Claim, ClaimRegistry, Contract, ContractTerms, Counterparty, EconomyError,
    Equipment, EquipmentCatalog, RegisteredMiner, RewardLottery,
};
use plotcoin_types::{
    AgentId, BotAction, ClaimId, CloudId, ContractId, DropReason, EquipmentId, EquipmentKind,
    EventDetail, GridCoord, PresentationCommand, SessionEvent,
};
use plotcoin_world::{ClaimFootprint, PlotAllocator, SpatialIndex, WeatherSystem, WorldError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SimClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::timers::{Firing, TaskKind, TimerError, TimerRegistry};

/// Errors that can occur while driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configuration cannot drive a session.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A timer operation failed.
    #[error("timer error: {source}")]
    Timer {
        /// The underlying timer error.
        #[from]
        source: TimerError,
    },

    /// A spatial operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An economic invariant was violated or a catalog lookup missed.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// An agent lookup or decision failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// No claim with this id exists.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// The agent tried to act on a claim it does not own.
    #[error("agent {agent} does not own claim {claim}")]
    NotClaimOwner {
        /// The acting agent.
        agent: AgentId,
        /// The claim.
        claim: ClaimId,
    },

    /// No contract with this id exists.
    #[error("contract not found: {0}")]
    ContractNotFound(ContractId),
}

/// Result of a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The equipment was paid for and placed.
    Purchased {
        /// The new equipment.
        equipment: EquipmentId,
        /// Where it stands.
        coord: GridCoord,
    },
    /// Nothing was bought and nothing was spent.
    Dropped {
        /// Why the placement was refused.
        reason: DropReason,
    },
}

impl PurchaseOutcome {
    /// The new equipment, if the purchase went through.
    pub const fn equipment(&self) -> Option<EquipmentId> {
        match self {
            Self::Purchased { equipment, .. } => Some(*equipment),
            Self::Dropped { .. } => None,
        }
    }
}

/// Session-wide counters for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Simulated seconds elapsed.
    pub now: u64,
    /// Agents in the roster.
    pub agents: usize,
    /// Claims on the map.
    pub claims: usize,
    /// Claim tiles on the map.
    pub tiles: usize,
    /// Miners registered with the lottery.
    pub miners: usize,
    /// Total registered hashing power.
    pub total_hash_power: u64,
    /// Blocks paid out.
    pub blocks_mined: u64,
    /// Draws nobody could win.
    pub blocks_unclaimed: u64,
    /// Contracts ever created.
    pub contracts: usize,
    /// Contracts not yet closed.
    pub active_contracts: usize,
}

/// The simulation context.
#[derive(Debug)]
pub struct Session {
    config: SimulationConfig,
    clock: SimClock,
    rng: StdRng,
    index: SpatialIndex,
    allocator: PlotAllocator,
    catalog: EquipmentCatalog,
    claims: ClaimRegistry,
    lottery: RewardLottery,
    roster: AgentRoster,
    contracts: Vec<Contract>,
    weather: WeatherSystem,
    weather_started: bool,
    timers: TimerRegistry,
    commands: Vec<PresentationCommand>,
    events: Vec<SessionEvent>,
    blocks_mined: u64,
    blocks_unclaimed: u64,
}

impl Session {
    /// Build a session from configuration and schedule the lottery.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for a zero period, bad window
    /// bounds, or a starting cash that cannot buy the starter miner and
    /// panel, and [`SessionError::Economy`] if the catalog defaults do not
    /// resolve.
    pub fn new(config: SimulationConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let catalog = config.catalog.build()?;
        let starter = catalog
            .default_for(EquipmentKind::Miner)
            .price
            .checked_add(catalog.default_for(EquipmentKind::Panel).price)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        if config.economy.starting_cash < starter {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "economy.starting_cash {} does not cover the starter miner and panel ({starter})",
                    config.economy.starting_cash
                ),
            }
            .into());
        }
        let world = &config.world;
        let seed = world.seed;
        let index = SpatialIndex::new(world.min_region_width, world.min_region_height);
        let allocator = PlotAllocator::new(
            world.default_location,
            world.proximity,
            world.max_ring_expansions,
        );
        let lottery = RewardLottery::new(config.economy.reward_btc, config.economy.exchange_rate);

        let mut timers = TimerRegistry::new();
        let block = config.economy.block_time_secs;
        timers.schedule(TaskKind::RewardDraw, block, block)?;

        info!(
            seed,
            proximity = world.proximity,
            block_time_secs = block,
            "session created"
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            clock: SimClock::new(),
            index,
            allocator,
            catalog,
            claims: ClaimRegistry::new(),
            lottery,
            roster: AgentRoster::new(),
            contracts: Vec::new(),
            weather: WeatherSystem::new(),
            weather_started: false,
            timers,
            commands: Vec::new(),
            events: Vec::new(),
            blocks_mined: 0,
            blocks_unclaimed: 0,
        })
    }

    // -------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------

    /// The configuration the session was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current simulated time in seconds.
    pub const fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The spatial index.
    pub const fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Every claim in creation order.
    pub const fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// One claim.
    pub fn claim(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.get(id)
    }

    /// The equipment catalog.
    pub const fn catalog(&self) -> &EquipmentCatalog {
        &self.catalog
    }

    /// The reward lottery.
    pub const fn lottery(&self) -> &RewardLottery {
        &self.lottery
    }

    /// Every agent.
    pub const fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Every contract in creation order.
    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    /// One contract.
    pub fn contract(&self, id: ContractId) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id() == id)
    }

    /// The claim `agent` takes part in `contract` with.
    pub fn contract_for_agent(&self, contract: ContractId, agent: AgentId) -> Option<ClaimId> {
        self.contract(contract).and_then(|c| c.claim_for_agent(agent))
    }

    /// Drifting clouds.
    pub const fn weather(&self) -> &WeatherSystem {
        &self.weather
    }

    /// Scheduled timers.
    pub const fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Counters for logging.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            now: self.clock.now(),
            agents: self.roster.len(),
            claims: self.claims.len(),
            tiles: self.index.claim_tile_count(),
            miners: self.lottery.miners().len(),
            total_hash_power: self.lottery.total_hash_power(),
            blocks_mined: self.blocks_mined,
            blocks_unclaimed: self.blocks_unclaimed,
            contracts: self.contracts.len(),
            active_contracts: self.contracts.iter().filter(|c| c.is_active()).count(),
        }
    }

    /// Take every presentation command emitted so far.
    pub fn drain_commands(&mut self) -> Vec<PresentationCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Take every session event emitted so far.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        core::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------
    // Agents
    // -------------------------------------------------------------------

    /// Add a human player and give it a first claim.
    ///
    /// # Errors
    ///
    /// See [`Session::request_new_claim`].
    pub fn spawn_human(&mut self, name: &str) -> Result<(AgentId, ClaimId), SessionError> {
        self.spawn(Agent::human(name))
    }

    /// Add a bot with a profile drawn from the configured bounds and give
    /// it a first claim.
    ///
    /// # Errors
    ///
    /// See [`Session::request_new_claim`].
    pub fn spawn_bot(&mut self, name: &str) -> Result<(AgentId, ClaimId), SessionError> {
        let profile = BotProfile::random(
            &self.config.bots.bounds(),
            self.config.bots.investment_policy,
            &mut self.rng,
        );
        self.spawn_bot_with_profile(name, profile)
    }

    /// Add a bot with an explicit profile and give it a first claim.
    ///
    /// # Errors
    ///
    /// See [`Session::request_new_claim`].
    pub fn spawn_bot_with_profile(
        &mut self,
        name: &str,
        profile: BotProfile,
    ) -> Result<(AgentId, ClaimId), SessionError> {
        self.spawn(Agent::bot(name, profile))
    }

    /// The agent joins the roster only once its first claim stands.
    fn spawn(&mut self, agent: Agent) -> Result<(AgentId, ClaimId), SessionError> {
        let id = agent.id();
        let analysis_period = agent
            .bot_state()
            .map(|bot| bot.profile().analysis_period_secs());
        let claim = self.place_claim(id, analysis_period)?;
        self.roster.add(agent);
        Ok((id, claim))
    }

    /// Tear an agent down: its timers stop firing. Its claims and
    /// equipment stay on the map. Returns how many timers were removed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Agent`] for an unknown agent.
    pub fn retire_agent(&mut self, agent: AgentId) -> Result<usize, SessionError> {
        self.roster.get(agent)?;
        let removed = self.timers.cancel_where(|kind| kind.agent() == Some(agent));
        info!(%agent, timers = removed, "agent retired");
        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Inbound commands
    // -------------------------------------------------------------------

    /// Place a new claim for `agent` and equip it with the default miner
    /// on its start tile and the default panel next to it.
    ///
    /// Bots also get an analysis timer for the new claim.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Agent`] for an unknown agent and
    /// [`SessionError::World`] when the allocator gives up. Nothing is
    /// placed in either case.
    pub fn request_new_claim(&mut self, agent: AgentId) -> Result<ClaimId, SessionError> {
        let analysis_period = self
            .roster
            .get(agent)?
            .bot_state()
            .map(|bot| bot.profile().analysis_period_secs());
        self.place_claim(agent, analysis_period)
    }

    /// Everything fallible runs before the first mutation. `Session::new`
    /// guarantees the starting cash covers both starter purchases.
    fn place_claim(
        &mut self,
        agent: AgentId,
        analysis_period: Option<u64>,
    ) -> Result<ClaimId, SessionError> {
        let placement = self
            .allocator
            .allocate(self.claims.footprints(), &self.index, &mut self.rng)?;
        let analysis_due = analysis_period
            .map(|period| self.clock.after(period).map(|due| (period, due)))
            .transpose()?;

        let id = ClaimId::new();
        let mut footprint = ClaimFootprint::new(
            id,
            agent,
            placement.coord,
            placement.reference,
            self.allocator.proximity(),
        );
        if let Some(reference) = placement.reference {
            let neighbour = self
                .claims
                .get_mut(reference)
                .ok_or(SessionError::ClaimNotFound(reference))?;
            neighbour.footprint_mut().increment_adjacency();
            footprint.increment_adjacency();
        }
        self.index.add_buffer_zone(id, footprint.region());
        self.claims
            .push(Claim::new(footprint, self.config.economy.starting_cash));

        info!(
            claim = %id,
            %agent,
            start = %placement.coord,
            reference = ?placement.reference,
            "claim created"
        );
        self.emit(EventDetail::ClaimCreated {
            claim: id,
            owner: agent,
            start: placement.coord,
            reference: placement.reference,
        });

        let miner = self.catalog.default_for(EquipmentKind::Miner).clone();
        let panel = self.catalog.default_for(EquipmentKind::Panel).clone();
        self.purchase(&miner, agent, id, Some(placement.coord))?;
        self.purchase(&panel, agent, id, None)?;

        if let Some((period, first_due)) = analysis_due {
            self.timers
                .schedule(TaskKind::BotAnalysis { agent, claim: id }, period, first_due)?;
        }
        Ok(id)
    }

    /// Buy the default model of `kind` for `claim`.
    ///
    /// With no `coord`, a random legal tile next to the claim is used. An
    /// illegal or missing location drops the purchase without spending
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ClaimNotFound`] or
    /// [`SessionError::NotClaimOwner`] for a bad claim, and
    /// [`SessionError::Economy`] with [`EconomyError::NegativeCash`] when
    /// the claim cannot pay; nothing changes in that case.
    pub fn request_purchase(
        &mut self,
        kind: EquipmentKind,
        agent: AgentId,
        claim: ClaimId,
        coord: Option<GridCoord>,
    ) -> Result<PurchaseOutcome, SessionError> {
        let item = self.catalog.default_for(kind).clone();
        self.purchase(&item, agent, claim, coord)
    }

    /// Buy a specific catalog model for `claim`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownEquipment`] for a model not in the
    /// catalog; otherwise as [`Session::request_purchase`].
    pub fn request_purchase_model(
        &mut self,
        model: &str,
        agent: AgentId,
        claim: ClaimId,
        coord: Option<GridCoord>,
    ) -> Result<PurchaseOutcome, SessionError> {
        let item = self.catalog.lookup(model)?.clone();
        self.purchase(&item, agent, claim, coord)
    }

    /// Whether a claim tile stands at `coord`.
    pub fn query_occupancy(&self, coord: GridCoord) -> bool {
        self.index.is_occupied(coord)
    }

    /// Ask the presentation layer to highlight a claim's tiles.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ClaimNotFound`] for an unknown claim.
    pub fn highlight_claim(&mut self, claim: ClaimId) -> Result<(), SessionError> {
        let coords = self.claim_tiles(claim)?;
        self.commands.push(PresentationCommand::HighlightTiles { coords });
        Ok(())
    }

    /// Remove a claim's highlight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ClaimNotFound`] for an unknown claim.
    pub fn clear_highlight(&mut self, claim: ClaimId) -> Result<(), SessionError> {
        let coords = self.claim_tiles(claim)?;
        self.commands.push(PresentationCommand::RemoveTiles { coords });
        Ok(())
    }

    /// Cancel `contract` on behalf of `agent`. Returns whether the contract
    /// is still active.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ContractNotFound`] for an unknown contract.
    pub fn cancel_contract(
        &mut self,
        contract: ContractId,
        agent: AgentId,
    ) -> Result<bool, SessionError> {
        let entry = self
            .contracts
            .iter_mut()
            .find(|c| c.id() == contract)
            .ok_or(SessionError::ContractNotFound(contract))?;
        let was_active = entry.is_active();
        let active = entry.cancel(agent);
        if was_active && !active {
            self.close_contract(contract);
        }
        Ok(active)
    }

    // -------------------------------------------------------------------
    // Timeline
    // -------------------------------------------------------------------

    /// Run every timer due up to and including `target`, then move the
    /// clock to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Clock`] if `target` is in the past. Any
    /// handler error stops the run at the failing timer.
    pub fn advance_to(&mut self, target: u64) -> Result<(), SessionError> {
        if target < self.clock.now() {
            return Err(ClockError::Backwards {
                now: self.clock.now(),
                target,
            }
            .into());
        }
        while let Some(firing) = self.timers.pop_due(target)? {
            self.clock.set(firing.due)?;
            self.dispatch(firing)?;
        }
        self.clock.set(target)?;
        Ok(())
    }

    /// Run the timeline forward by `secs` seconds.
    ///
    /// # Errors
    ///
    /// See [`Session::advance_to`].
    pub fn run_for(&mut self, secs: u64) -> Result<(), SessionError> {
        let target = self.clock.after(secs)?;
        self.advance_to(target)
    }

    fn dispatch(&mut self, firing: Firing) -> Result<(), SessionError> {
        match firing.kind {
            TaskKind::BotAnalysis { agent, claim } => self.run_bot_analysis(agent, claim),
            TaskKind::RewardDraw => self.run_reward_draw(),
            TaskKind::EnergyCollection { claim, equipment } => {
                self.run_energy_collection(claim, equipment)
            }
            TaskKind::WeatherMove { cloud } => self.run_weather_move(cloud),
            TaskKind::ContractSettlement { contract } => self.run_settlement(contract),
        }
    }

    // -------------------------------------------------------------------
    // Timer handlers
    // -------------------------------------------------------------------

    fn run_bot_analysis(&mut self, agent: AgentId, claim: ClaimId) -> Result<(), SessionError> {
        let prices = DefaultPrices {
            miner: self.catalog.default_for(EquipmentKind::Miner).price,
            panel: self.catalog.default_for(EquipmentKind::Panel).price,
        };
        let exchange_rate = self.lottery.exchange_rate();
        let target = self
            .claims
            .get(claim)
            .ok_or(SessionError::ClaimNotFound(claim))?;
        let analysis = self
            .roster
            .bot_mut(agent)?
            .analyze(target, prices, exchange_rate)?;

        self.emit(EventDetail::BotActed {
            agent,
            claim,
            action: analysis.action,
        });

        match analysis.action {
            BotAction::BuyMiner | BotAction::BuyPanel => {
                if let Some(kind) = analysis.action.purchase_kind() {
                    self.request_purchase(kind, agent, claim, None)?;
                }
            }
            BotAction::CreateContract => {
                match draft_terms(&analysis.report, &mut self.rng) {
                    Some(terms) => {
                        self.offer_contract(agent, claim, terms)?;
                    }
                    None => debug!(%agent, %claim, "surplus too small to contract"),
                }
            }
            BotAction::Save => {}
        }
        Ok(())
    }

    fn run_reward_draw(&mut self) -> Result<(), SessionError> {
        let claims = &self.claims;
        let win = self.lottery.draw(
            |entry| claims.active_hash_power(entry.claim, entry.miner),
            &mut self.rng,
        );

        let Some(win) = win else {
            self.blocks_unclaimed = self.blocks_unclaimed.saturating_add(1);
            debug!(miners = self.lottery.miners().len(), "block unclaimed");
            self.emit(EventDetail::BlockUnclaimed);
            return Ok(());
        };

        let reward_btc = self.lottery.reward_btc();
        let reward_usd = self.lottery.reward_usd()?;
        self.claims
            .get_mut(win.claim)
            .ok_or(SessionError::ClaimNotFound(win.claim))?
            .credit_block_reward(win.miner, reward_btc, reward_usd)?;
        self.blocks_mined = self.blocks_mined.saturating_add(1);

        info!(
            claim = %win.claim,
            miner = %win.miner,
            distance = win.distance,
            reward_btc = %reward_btc,
            "block mined"
        );
        self.emit(EventDetail::BlockMined {
            claim: win.claim,
            miner: win.miner,
            reward_btc,
            reward_usd,
        });
        Ok(())
    }

    fn run_energy_collection(
        &mut self,
        claim: ClaimId,
        equipment: EquipmentId,
    ) -> Result<(), SessionError> {
        let period_mins = u64::from(self.config.economy.energy_period_mins);
        let target = self
            .claims
            .get_mut(claim)
            .ok_or(SessionError::ClaimNotFound(claim))?;
        let item = target
            .equipment_by_id(equipment)
            .ok_or(EconomyError::EquipmentNotFound { claim, equipment })?;

        if let Some(panel) = item.as_panel() {
            let wh = energy_over(panel.active_output, period_mins);
            target.record_self_produced(wh)?;
            debug!(%claim, %equipment, wh, "panel output collected");
            return Ok(());
        }

        let usage = item.as_miner().map_or(0, |miner| miner.energy_usage);
        let wh = energy_over(usage, period_mins);
        let powered = target.try_debit_energy(wh);
        let changed = target.set_miner_powered(equipment, powered)?;
        debug!(%claim, %equipment, wh, powered, "miner energy drawn");
        if changed {
            self.emit(EventDetail::MinerPower { equipment, powered });
        }
        Ok(())
    }

    fn run_weather_move(&mut self, cloud: CloudId) -> Result<(), SessionError> {
        let step = self
            .weather
            .step_cloud(cloud, &mut self.index, &mut self.rng)?;
        self.commands.extend(step.commands);
        self.refresh_shading(step.from)?;
        self.refresh_shading(step.to)?;
        Ok(())
    }

    fn run_settlement(&mut self, contract: ContractId) -> Result<(), SessionError> {
        let entry = self
            .contract(contract)
            .ok_or(SessionError::ContractNotFound(contract))?;
        let (Some(party), true) = (entry.counterparty(), entry.is_active()) else {
            self.timers.cancel_where(|kind| is_settlement_of(kind, contract));
            return Ok(());
        };
        let owner_claim = entry.owner_claim();
        let terms = *entry.terms();
        let payment = terms.payment_per_period()?;

        if self.can_settle(owner_claim, party.claim, terms.watts_per_period, payment) {
            self.settle(owner_claim, party.claim, terms.watts_per_period, payment)?;
            debug!(%contract, watts = terms.watts_per_period, %payment, "contract period settled");
            self.emit(EventDetail::ContractSettled {
                contract,
                watts: terms.watts_per_period,
                payment,
            });
        } else {
            warn!(%contract, "contract period skipped: energy or cash short");
            self.emit(EventDetail::ContractSettlementSkipped { contract });
        }

        let still_active = self
            .contracts
            .iter_mut()
            .find(|c| c.id() == contract)
            .is_some_and(Contract::record_period);
        if !still_active {
            self.close_contract(contract);
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn purchase(
        &mut self,
        item: &CatalogItem,
        agent: AgentId,
        claim: ClaimId,
        coord: Option<GridCoord>,
    ) -> Result<PurchaseOutcome, SessionError> {
        let owner = self
            .claims
            .get(claim)
            .ok_or(SessionError::ClaimNotFound(claim))?
            .owner();
        if owner != agent {
            return Err(SessionError::NotClaimOwner { agent, claim });
        }

        let footprint = self
            .claims
            .get(claim)
            .ok_or(SessionError::ClaimNotFound(claim))?
            .footprint();
        let target = match coord {
            Some(coord) => Some(coord),
            None => footprint
                .free_neighbors(&self.index)
                .choose(&mut self.rng)
                .copied(),
        };
        let Some(target) = target else {
            return Ok(self.drop_purchase(claim, item.kind, DropReason::NoAdjacentTile));
        };
        if let Some(reason) = footprint.placement_violation(target, &self.index) {
            return Ok(self.drop_purchase(claim, item.kind, reason));
        }

        let equipment = item.build(claim, target);
        let id = equipment.id();
        let kind = equipment.kind();
        let price = equipment.price();
        let rated_hash_power = equipment.as_miner().map(|miner| miner.rated_hash_power);

        // Scheduled before payment; cancelled again if payment fails.
        let period = self.config.economy.energy_period_secs();
        let first_due = self.clock.after(period)?;
        let collection = self.timers.schedule(
            TaskKind::EnergyCollection {
                claim,
                equipment: id,
            },
            period,
            first_due,
        )?;

        let owner_claim = self
            .claims
            .get_mut(claim)
            .ok_or(SessionError::ClaimNotFound(claim))?;
        if let Err(err) = owner_claim.install(equipment) {
            self.timers.cancel(collection)?;
            return Err(err.into());
        }
        owner_claim.footprint_mut().add_tile(target);
        let region = *owner_claim.footprint().region();

        self.index.register_claim_tile(target, claim)?;
        self.index.add_buffer_zone(claim, &region);
        if let Some(rated_hash_power) = rated_hash_power {
            self.lottery.register(RegisteredMiner {
                claim,
                miner: id,
                rated_hash_power,
            })?;
        }

        self.commands.push(PresentationCommand::DrawClaimTile {
            coord: target,
            claim,
            owner: agent,
            kind,
        });
        self.emit(EventDetail::EquipmentPurchased {
            claim,
            equipment: id,
            kind,
            coord: target,
            price,
        });

        self.start_weather()?;
        self.confine_clouds()?;
        self.refresh_shading(target)?;
        Ok(PurchaseOutcome::Purchased {
            equipment: id,
            coord: target,
        })
    }

    fn drop_purchase(
        &mut self,
        claim: ClaimId,
        kind: EquipmentKind,
        reason: DropReason,
    ) -> PurchaseOutcome {
        debug!(%claim, %kind, ?reason, "purchase dropped");
        self.emit(EventDetail::PurchaseDropped { claim, kind, reason });
        PurchaseOutcome::Dropped { reason }
    }

    fn offer_contract(
        &mut self,
        owner: AgentId,
        owner_claim: ClaimId,
        terms: ContractTerms,
    ) -> Result<ContractId, SessionError> {
        let mut contract = Contract::new(owner, owner_claim, terms);
        let id = contract.id();

        let Some(counterparty) = self.roster.pick_other(owner, &mut self.rng) else {
            debug!(contract = %id, "no agent to offer the contract to");
            self.contracts.push(contract);
            return Ok(id);
        };
        self.emit(EventDetail::ContractOffered {
            contract: id,
            owner,
            counterparty,
        });

        let party_claim = self.claims.owned_by(counterparty).next();
        let accepted = match party_claim {
            Some(claim) => self
                .roster
                .get(counterparty)?
                .negotiate_contract(claim, &terms, &self.lottery)?,
            None => false,
        };
        let party_claim = party_claim.map(Claim::id);

        match (accepted, party_claim) {
            (true, Some(claim)) => {
                contract.attach_counterparty(Counterparty {
                    agent: counterparty,
                    claim,
                })?;
                let period = self.config.economy.block_time_secs;
                let first_due = self.clock.after(period)?;
                self.timers
                    .schedule(TaskKind::ContractSettlement { contract: id }, period, first_due)?;
                info!(
                    contract = %id,
                    %owner,
                    %counterparty,
                    watts = terms.watts_per_period,
                    duration = terms.duration,
                    "contract accepted"
                );
                self.emit(EventDetail::ContractAccepted {
                    contract: id,
                    counterparty_claim: claim,
                });
            }
            _ => {
                debug!(contract = %id, %counterparty, "contract rejected");
                self.emit(EventDetail::ContractRejected {
                    contract: id,
                    counterparty,
                });
            }
        }
        self.contracts.push(contract);
        Ok(id)
    }

    fn can_settle(&self, exporter: ClaimId, importer: ClaimId, watts: u64, payment: Decimal) -> bool {
        let has_energy = self
            .claims
            .get(exporter)
            .is_some_and(|claim| claim.energy_reserve() >= watts);
        let can_pay = self
            .claims
            .get(importer)
            .is_some_and(|claim| claim.can_afford(payment));
        has_energy && can_pay
    }

    fn settle(
        &mut self,
        exporter: ClaimId,
        importer: ClaimId,
        watts: u64,
        payment: Decimal,
    ) -> Result<(), SessionError> {
        let debit = Decimal::ZERO
            .checked_sub(payment)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let buyer = self
            .claims
            .get_mut(importer)
            .ok_or(SessionError::ClaimNotFound(importer))?;
        buyer.change_cash_reserves(debit)?;
        buyer.record_imported(watts)?;

        let seller = self
            .claims
            .get_mut(exporter)
            .ok_or(SessionError::ClaimNotFound(exporter))?;
        if !seller.try_debit_energy(watts) {
            warn!(claim = %exporter, watts, "exporter reserve changed during settlement");
        }
        seller.change_cash_reserves(payment)?;
        Ok(())
    }

    fn close_contract(&mut self, contract: ContractId) {
        self.timers.cancel_where(|kind| is_settlement_of(kind, contract));
        info!(%contract, "contract closed");
        self.emit(EventDetail::ContractClosed { contract });
    }

    /// Spawn the configured clouds once the map has a global region.
    fn start_weather(&mut self) -> Result<(), SessionError> {
        let enabled = self.config.weather.enabled;
        let clouds = self.config.weather.clouds;
        let interval = self.config.weather.move_interval_secs;
        if self.weather_started || !enabled || self.index.global_region().is_none() {
            return Ok(());
        }
        self.weather_started = true;
        for _ in 0..clouds {
            let (cloud, command) = self.weather.spawn_cloud(&mut self.index, &mut self.rng)?;
            self.commands.push(command);
            let first_due = self.clock.after(interval)?;
            self.timers
                .schedule(TaskKind::WeatherMove { cloud }, interval, first_due)?;
            let position = self
                .weather
                .clouds()
                .iter()
                .find(|c| c.id == cloud)
                .map(|c| c.position);
            if let Some(position) = position {
                self.refresh_shading(position)?;
            }
        }
        Ok(())
    }

    /// Pull clouds back inside the global region after it changed shape.
    fn confine_clouds(&mut self) -> Result<(), SessionError> {
        if !self.weather_started {
            return Ok(());
        }
        for moved in self.weather.confine(&mut self.index)? {
            self.commands.extend(moved.commands);
            self.refresh_shading(moved.from)?;
            self.refresh_shading(moved.to)?;
        }
        Ok(())
    }

    /// Shade the panel at `coord` iff weather covers it.
    fn refresh_shading(&mut self, coord: GridCoord) -> Result<(), SessionError> {
        let Some(claim) = self.index.claim_at(coord) else {
            return Ok(());
        };
        let shaded = self.index.weather_tile(coord).is_some();
        let Some(owner) = self.claims.get_mut(claim) else {
            return Ok(());
        };
        let Some(panel) = owner
            .panels()
            .find(|item| item.coord() == coord)
            .map(Equipment::id)
        else {
            return Ok(());
        };
        if owner.set_panel_shaded(panel, shaded)? {
            debug!(%claim, %panel, shaded, "panel shading changed");
            self.emit(EventDetail::PanelShading {
                equipment: panel,
                shaded,
            });
        }
        Ok(())
    }

    fn claim_tiles(&self, claim: ClaimId) -> Result<Vec<GridCoord>, SessionError> {
        self.claims
            .get(claim)
            .map(|c| c.footprint().tiles().to_vec())
            .ok_or(SessionError::ClaimNotFound(claim))
    }

    fn emit(&mut self, detail: EventDetail) {
        self.events.push(SessionEvent {
            at_secs: self.clock.now(),
            detail,
        });
    }
}

/// Minutes per hour, for converting hourly equipment ratings.
const MINUTES_PER_HOUR: u64 = 60;

/// Watt-hours produced or drawn at `per_hour` over `minutes`.
fn energy_over(per_hour: u64, minutes: u64) -> u64 {
    per_hour
        .saturating_mul(minutes)
        .checked_div(MINUTES_PER_HOUR)
        .unwrap_or(0)
}

fn is_settlement_of(kind: &TaskKind, contract: ContractId) -> bool {
    matches!(kind, TaskKind::ContractSettlement { contract: c } if *c == contract)
}
