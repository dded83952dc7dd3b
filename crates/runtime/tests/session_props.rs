use core_sim::{to_micros, MarketRegime, SimConfig};
use ledger::AccountStatus;
use proptest::prelude::*;
use runtime::{Allocation, SessionError, SimSession};

fn regime_strategy() -> impl Strategy<Value = MarketRegime> {
    prop_oneof![
        Just(MarketRegime::StableGrowth),
        Just(MarketRegime::Stagflation),
        Just(MarketRegime::LiquidityCrunch),
        Just(MarketRegime::GlobalShock),
        Just(MarketRegime::Custom),
    ]
}

fn session(seed: u64, regime: MarketRegime, drawdown_pct: f64, margin: bool) -> SimSession {
    let config = SimConfig::new(regime, 120, drawdown_pct, margin).unwrap();
    SimSession::with_allocation(
        config,
        seed,
        to_micros(100_000_000.0),
        &Allocation::balanced_default(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_tick_leaves_a_balanced_ledger(
        seed in any::<u64>(),
        regime in regime_strategy(),
        drawdown_pct in 1.0_f64..100.0,
        margin in any::<bool>(),
        months in 1_u64..120,
    ) {
        let mut session = session(seed, regime, drawdown_pct, margin);
        let mut insolvent_since = None;

        for _ in 0..months {
            let report = session.step_once().unwrap();
            let portfolio = session.portfolio();

            prop_assert_eq!(report.tick, session.tick());
            prop_assert_eq!(portfolio.identity_nav().unwrap(), portfolio.nav);
            prop_assert!(portfolio.current_drawdown <= 0.0);

            if let Some(tick) = insolvent_since {
                prop_assert_eq!(portfolio.status, AccountStatus::Insolvent, "left insolvency after tick {}", tick);
                prop_assert!(report.transition.is_none());
            } else if portfolio.status == AccountStatus::Insolvent {
                insolvent_since = Some(report.tick);
            }
        }
    }

    #[test]
    fn a_halted_session_never_evaluates_risk_again(
        seed in any::<u64>(),
        regime in regime_strategy(),
        clean_ticks in 0_u64..36,
        retries in 1_usize..8,
    ) {
        let mut session = session(seed, regime, 20.0, false);
        for _ in 0..clean_ticks {
            session.step_once().unwrap();
        }

        session.portfolio_mut().positions[0].asset_index = 99;
        let failed = session.step_once().unwrap_err();
        let halted_tick = clean_ticks + 1;
        let is_ledger_fault = matches!(failed, SessionError::Ledger { tick, .. } if tick == halted_tick);
        prop_assert!(is_ledger_fault);

        let frozen = session.portfolio().clone();
        for _ in 0..retries {
            prop_assert_eq!(
                session.step_once().unwrap_err(),
                SessionError::Halted { tick: halted_tick }
            );
            prop_assert_eq!(session.portfolio(), &frozen);
            prop_assert_eq!(session.tick(), halted_tick);
        }
    }
}
