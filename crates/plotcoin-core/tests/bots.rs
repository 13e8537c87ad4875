//! Integration tests for bot analysis timers and the actions they take.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use plotcoin_agents::{BotProfile, InvestmentPolicy};
use plotcoin_core::{Session, SimulationConfig};
use plotcoin_types::{AgentId, BotAction, EventDetail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn quiet_session() -> Session {
    let mut config = SimulationConfig::default();
    config.weather.enabled = false;
    Session::new(config).unwrap()
}

fn profile(cash_ratio: Decimal, self_sustain_ratio: Decimal, policy: InvestmentPolicy) -> BotProfile {
    BotProfile {
        window_mins: 5,
        cash_ratio,
        self_sustain_ratio,
        policy,
    }
}

fn history(session: &Session, bot: AgentId) -> Vec<BotAction> {
    session
        .roster()
        .get(bot)
        .unwrap()
        .bot_state()
        .unwrap()
        .history()
        .actions()
        .to_vec()
}

#[test]
fn five_minute_window_acts_twelve_times_an_hour() {
    let mut session = quiet_session();
    let (bot, _) = session
        .spawn_bot_with_profile(
            "saver",
            profile(dec!(1000000), Decimal::ONE, InvestmentPolicy::default()),
        )
        .unwrap();

    session.run_for(3600).unwrap();
    let actions = history(&session, bot);
    assert_eq!(actions.len(), 12);
    // Never rich enough to invest, never self-sustainable.
    assert!(actions.iter().all(|action| *action == BotAction::Save));

    let acted = session
        .drain_events()
        .iter()
        .filter(|event| matches!(event.detail, EventDetail::BotActed { agent, .. } if agent == bot))
        .count();
    assert_eq!(acted, 12);
}

#[test]
fn deficient_bot_buys_a_panel_by_default() {
    let mut session = quiet_session();
    let (bot, claim) = session
        .spawn_bot_with_profile(
            "builder",
            profile(Decimal::ZERO, Decimal::ONE, InvestmentPolicy::MinersWhenSelfSustaining),
        )
        .unwrap();

    session.run_for(300).unwrap();
    assert_eq!(history(&session, bot), vec![BotAction::BuyPanel]);
    let owned = session.claim(claim).unwrap();
    assert_eq!(owned.panels().count(), 2);
    assert_eq!(owned.miner_count(), 1);
    // 2750 - 250
    assert_eq!(owned.cash(), dec!(2500));
}

#[test]
fn deficient_bot_buys_a_miner_under_the_panel_policy() {
    let mut session = quiet_session();
    let (bot, claim) = session
        .spawn_bot_with_profile(
            "hasher",
            profile(Decimal::ZERO, Decimal::ONE, InvestmentPolicy::PanelsWhenSelfSustaining),
        )
        .unwrap();

    session.run_for(300).unwrap();
    assert_eq!(history(&session, bot), vec![BotAction::BuyMiner]);
    assert_eq!(session.claim(claim).unwrap().miner_count(), 2);
    assert_eq!(session.lottery().total_hash_power(), 28);
    assert_eq!(session.claim(claim).unwrap().cash(), dec!(750));
}

#[test]
fn bot_that_cannot_afford_saves() {
    let mut config = SimulationConfig::default();
    config.weather.enabled = false;
    config.economy.starting_cash = dec!(2300);
    let mut session = Session::new(config).unwrap();
    let (bot, claim) = session
        .spawn_bot_with_profile(
            "broke",
            profile(Decimal::ZERO, Decimal::ONE, InvestmentPolicy::PanelsWhenSelfSustaining),
        )
        .unwrap();

    session.run_for(300).unwrap();
    assert_eq!(history(&session, bot), vec![BotAction::Save]);
    assert_eq!(session.claim(claim).unwrap().cash(), dec!(50));
}

#[test]
fn random_profiles_follow_configured_bounds() {
    let mut config = SimulationConfig::default();
    config.weather.enabled = false;
    config.bots.min_window_mins = 7;
    config.bots.max_window_mins = 7;
    let mut session = Session::new(config).unwrap();
    let (bot, _) = session.spawn_bot("bounded").unwrap();

    let state = session.roster().get(bot).unwrap().bot_state().unwrap();
    assert_eq!(state.profile().window_mins, 7);
    assert!(state.profile().cash_ratio >= Decimal::ZERO);
    assert!(state.profile().cash_ratio <= Decimal::ONE);

    session.run_for(419).unwrap();
    assert!(history(&session, bot).is_empty());
    session.run_for(1).unwrap();
    assert_eq!(history(&session, bot).len(), 1);
}

#[test]
fn full_default_session_runs_to_completion() {
    let config = SimulationConfig::default();
    let duration = config.run.duration_secs;
    let mut session = Session::new(config).unwrap();
    session.spawn_human("player").unwrap();
    for n in 0..3 {
        session.spawn_bot(&format!("bot-{n}")).unwrap();
    }

    session.run_for(duration).unwrap();
    let summary = session.summary();
    assert_eq!(summary.now, duration);
    assert_eq!(summary.agents, 4);
    assert_eq!(summary.blocks_mined + summary.blocks_unclaimed, 24);
}
