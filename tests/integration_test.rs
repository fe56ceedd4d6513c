use chrono::NaiveDate;
use mockall::mock;
use pairbook::backtest::RunCounters;
use pairbook::selection::{Admission, AdmissionLimits, AdmissionOutcome, Candidate};
use pairbook::{
    run_sweep, CloseReason, DailyPrices, EngineError, PairId, PairPosition, PolicyKind, PortfolioConstructor,
    PriceBar, PriceFeed, ScoreFeed, SecurityId, SelectionPolicy, Side, SimulationConfig,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

// --- Mocks ---

mock! {
    pub Policy {}

    impl SelectionPolicy for Policy {
        fn name(&self) -> &'static str;
        fn close_triggers(&self, position: &PairPosition, score: Option<f64>) -> Vec<CloseReason>;
        fn rank(&self, candidates: &mut Vec<Candidate>);
        fn admit(
            &self,
            ranked: &[Candidate],
            counts: &HashMap<SecurityId, i64>,
            prices: &DailyPrices,
            limits: &AdmissionLimits,
        ) -> AdmissionOutcome;
        fn rebalance_enabled(&self) -> bool;
    }
}

// --- Fixtures ---

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
}

/// A: 100 -> 103 -> 106, B: 50 -> 52 -> 54
fn three_day_prices() -> PriceFeed {
    let mut feed = PriceFeed::new();
    for (d, a, b) in [(1, dec!(100), dec!(50)), (2, dec!(103), dec!(52)), (3, dec!(106), dec!(54))] {
        feed.insert(day(d), "A", PriceBar::new(a));
        feed.insert(day(d), "B", PriceBar::new(b));
    }
    feed
}

fn single_pair_config() -> SimulationConfig {
    SimulationConfig {
        book_size: dec!(100000),
        target_pairs: 1,
        max_security_exposure: 1,
        entry_threshold: 1.0,
        exit_threshold: 0.5,
        commission_per_share: dec!(0.003),
        ..Default::default()
    }
}

fn long_ab_scores(days: &[u32]) -> ScoreFeed {
    let mut scores = ScoreFeed::new();
    for d in days {
        scores.insert(day(*d), PairId::new("A", "B"), 2.5);
    }
    scores
}

// --- Tests ---

#[test]
fn test_hand_computed_pair_pl() {
    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let report = engine.run(&three_day_prices(), &long_ab_scores(&[1, 2])).unwrap();
    let rows = report.records();
    assert_eq!(rows.len(), 3);

    // Day 1: open 500 A / -1000 B, commission (500 + 1000) * 0.003
    assert_eq!(rows[0].pl, dec!(-4.5));
    assert_eq!(rows[0].turnover, dec!(100000));
    assert_eq!(rows[0].gross_exposure, dec!(100000));

    // Day 2: 3 * 500 + 2 * -1000
    assert_eq!(rows[1].pl, dec!(-500));
    assert_eq!(rows[1].gross_exposure, dec!(51500) + dec!(52000));
    assert_eq!(rows[1].turnover, Decimal::ZERO);
    assert!((rows[1].daily_return - (-0.005)).abs() < 1e-12);

    // Day 3: same move again, then liquidation at 106 / 54
    assert_eq!(rows[2].pl, dec!(-500) - dec!(4.5));
    assert_eq!(rows[2].turnover, dec!(53000) + dec!(54000));
    assert_eq!(rows[2].gross_exposure, Decimal::ZERO);

    assert_eq!(report.total_pl(), dec!(-1009));
    assert_eq!(
        *report.counters(),
        RunCounters {
            opened: 1,
            closed: 1,
            ..Default::default()
        }
    );
}

#[test]
fn test_short_side_mirrors_long() {
    let mut scores = ScoreFeed::new();
    scores.insert(day(1), PairId::new("A", "B"), -2.5);
    scores.insert(day(2), PairId::new("A", "B"), -2.5);

    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let report = engine.run(&three_day_prices(), &scores).unwrap();

    assert_eq!(report.records()[1].pl, dec!(500));
    assert_eq!(report.total_pl(), dec!(1000) - dec!(9));
}

#[test]
fn test_invalid_config_rejected_before_simulation() {
    let json = r#"{"book_size": "100000", "entry_threshold": 1.0, "exit_threshold": 1.5}"#;
    assert!(matches!(
        SimulationConfig::from_json(json),
        Err(EngineError::InvalidConfig(_))
    ));

    let zero_book = SimulationConfig {
        book_size: Decimal::ZERO,
        ..Default::default()
    };
    assert!(PortfolioConstructor::from_config(zero_book).is_err());
}

#[test]
fn test_config_from_json_selects_policy() {
    let json = r#"{"target_pairs": 5, "policy": "holding_period", "max_holding_days": 3}"#;
    let config = SimulationConfig::from_json(json).unwrap();
    assert_eq!(config.policy, PolicyKind::HoldingPeriod);
    assert_eq!(config.target_pairs, 5);
    assert_eq!(config.book_size, dec!(1000000));
}

#[test]
fn test_missing_price_forces_close_and_blocks_reopen() {
    let mut prices = PriceFeed::new();
    prices.insert(day(1), "A", PriceBar::new(dec!(100)));
    prices.insert(day(1), "B", PriceBar::new(dec!(50)));
    prices.insert(day(2), "A", PriceBar::missing());
    prices.insert(day(2), "B", PriceBar::new(dec!(60)));
    // A absent from the feed entirely on day 3
    prices.insert(day(3), "B", PriceBar::new(dec!(60)));
    prices.insert(day(4), "A", PriceBar::new(dec!(100)));
    prices.insert(day(4), "B", PriceBar::new(dec!(60)));

    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let report = engine.run(&prices, &long_ab_scores(&[1, 2, 3, 4])).unwrap();
    let rows = report.records();

    // Closed at last seen prices: no move, only the exit commission
    assert_eq!(rows[1].pl, dec!(-4.5));
    assert_eq!(rows[1].gross_exposure, Decimal::ZERO);
    assert_eq!(rows[2].gross_exposure, Decimal::ZERO);
    assert_eq!(report.counters().missing_price_closes, 1);
    assert_eq!(report.counters().opened, 1);
    assert_eq!(report.final_exposure(), Decimal::ZERO);
}

#[test]
fn test_security_cap_limits_admissions() {
    let mut prices = PriceFeed::new();
    for d in 1..=2 {
        for (s, p) in [("A", dec!(10)), ("B", dec!(20)), ("C", dec!(40))] {
            prices.insert(day(d), s, PriceBar::new(p));
        }
    }
    let mut scores = ScoreFeed::new();
    // A~B and A~C both long A: only one fits under a cap of 1
    scores.insert(day(1), PairId::new("A", "B"), 3.0);
    scores.insert(day(1), PairId::new("A", "C"), 2.0);
    // Short B~C would leave B at -2
    scores.insert(day(1), PairId::new("B", "C"), -1.5);

    let config = SimulationConfig {
        target_pairs: 3,
        ..single_pair_config()
    };
    let mut engine = PortfolioConstructor::from_config(config).unwrap();
    let report = engine.run(&prices, &scores).unwrap();

    assert_eq!(report.counters().opened, 1);
    assert_eq!(report.counters().cap_rejections, 2);
}

#[test]
fn test_unopenable_leader_does_not_cost_a_slot() {
    let mut prices = PriceFeed::new();
    for d in 1..=2 {
        for (s, p) in [
            ("X", dec!(6000)),
            ("Y", dec!(10)),
            ("A", dec!(10)),
            ("B", dec!(20)),
            ("C", dec!(25)),
            ("D", dec!(50)),
        ] {
            prices.insert(day(d), s, PriceBar::new(p));
        }
    }
    let mut scores = ScoreFeed::new();
    // Best score, but 2500 per leg buys no share of X
    scores.insert(day(1), PairId::new("X", "Y"), 3.0);
    scores.insert(day(1), PairId::new("A", "B"), 2.0);
    scores.insert(day(1), PairId::new("C", "D"), 1.5);

    let config = SimulationConfig {
        book_size: dec!(10000),
        target_pairs: 2,
        max_security_exposure: 5,
        commission_per_share: Decimal::ZERO,
        ..single_pair_config()
    };
    let mut engine = PortfolioConstructor::from_config(config).unwrap();
    let report = engine.run(&prices, &scores).unwrap();

    assert_eq!(report.counters().opened, 2);
    assert_eq!(report.counters().size_rejections, 1);
    assert_eq!(report.records()[0].gross_exposure, dec!(10000));
}

#[test]
fn test_rally_above_book_warns_and_continues() {
    let mut prices = PriceFeed::new();
    // Long A doubles while short B is flat: 150000 gross on a 100000 book
    for (d, a) in [(1, dec!(100)), (2, dec!(200)), (3, dec!(200)), (4, dec!(200))] {
        prices.insert(day(d), "A", PriceBar::new(a));
        prices.insert(day(d), "B", PriceBar::new(dec!(50)));
    }
    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let report = engine.run(&prices, &long_ab_scores(&[1, 2, 3, 4])).unwrap();
    let rows = report.records();

    assert_eq!(rows[1].gross_exposure, dec!(150000));
    assert_eq!(rows[1].pl, dec!(50000));
    assert_eq!(rows[2].gross_exposure, dec!(150000));
    assert_eq!(report.counters().exposure_warnings, 2);
    assert_eq!(report.len(), 4);
    assert_eq!(report.final_exposure(), Decimal::ZERO);
}

#[test]
fn test_holding_period_policy_closes_after_max_days() {
    let mut prices = PriceFeed::new();
    for d in 1..=6 {
        prices.insert(day(d), "A", PriceBar::new(dec!(100)));
        prices.insert(day(d), "B", PriceBar::new(dec!(50)));
    }
    let config = SimulationConfig {
        policy: PolicyKind::HoldingPeriod,
        max_holding_days: 2,
        commission_per_share: Decimal::ZERO,
        ..single_pair_config()
    };
    let mut engine = PortfolioConstructor::from_config(config).unwrap();
    // Scored only on the first day, so no reopen after the time stop
    let report = engine.run(&prices, &long_ab_scores(&[1])).unwrap();
    let exposure: Vec<Decimal> = report.records().iter().map(|r| r.gross_exposure).collect();

    assert_eq!(
        exposure,
        vec![dec!(100000), dec!(100000), dec!(100000), dec!(0), dec!(0), dec!(0)]
    );
}

#[test]
fn test_mock_policy_close_trigger_drives_exit() {
    let mut policy = MockPolicy::new();
    policy.expect_name().return_const("mock");
    policy.expect_rebalance_enabled().return_const(false);
    policy.expect_rank().returning(|_| ());
    policy
        .expect_admit()
        .returning(|ranked, _, _, limits| AdmissionOutcome {
            admitted: ranked
                .iter()
                .take(limits.slots)
                .map(|c| Admission {
                    pair: c.pair.clone(),
                    side: Side::Long,
                    gross_dollars: limits.budget,
                })
                .collect(),
            ..Default::default()
        });
    policy
        .expect_close_triggers()
        .returning(|position, _| {
            if position.holding_days() >= 1 {
                vec![CloseReason::TakeProfit]
            } else {
                Vec::new()
            }
        });

    let mut engine = PortfolioConstructor::new(single_pair_config(), Box::new(policy)).unwrap();
    let report = engine.run(&three_day_prices(), &long_ab_scores(&[1])).unwrap();

    assert_eq!(report.records()[1].gross_exposure, Decimal::ZERO);
    assert_eq!(report.counters().closed, 1);
}

#[test]
fn test_mock_policy_breaching_cap_aborts_run() {
    let mut policy = MockPolicy::new();
    policy.expect_name().return_const("mock");
    policy.expect_rebalance_enabled().return_const(false);
    policy.expect_rank().returning(|_| ());
    policy.expect_close_triggers().returning(|_, _| Vec::new());
    // Ignores the cap and admits everything
    policy.expect_admit().returning(|ranked, _, _, _| AdmissionOutcome {
        admitted: ranked
            .iter()
            .map(|c| Admission {
                pair: c.pair.clone(),
                side: Side::Long,
                gross_dollars: dec!(1000),
            })
            .collect(),
        ..Default::default()
    });

    let mut prices = PriceFeed::new();
    for d in 1..=2 {
        for s in ["A", "B", "C"] {
            prices.insert(day(d), s, PriceBar::new(dec!(10)));
        }
    }
    let mut scores = ScoreFeed::new();
    scores.insert(day(1), PairId::new("A", "B"), 2.0);
    scores.insert(day(1), PairId::new("A", "C"), 2.0);

    let config = SimulationConfig {
        target_pairs: 5,
        ..single_pair_config()
    };
    let mut engine = PortfolioConstructor::new(config, Box::new(policy)).unwrap();
    let result = engine.run(&prices, &scores);

    assert!(matches!(
        result,
        Err(EngineError::ExposureCapViolated { count: 2, cap: 1, .. })
    ));
}

#[test]
fn test_rerun_starts_from_empty_book() {
    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let prices = three_day_prices();
    let scores = long_ab_scores(&[1, 2]);
    let first = engine.run(&prices, &scores).unwrap();
    let second = engine.run(&prices, &scores).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_report_exports_dataframe() {
    let mut engine = PortfolioConstructor::from_config(single_pair_config()).unwrap();
    let report = engine.run(&three_day_prices(), &long_ab_scores(&[1, 2])).unwrap();
    let df = report.to_dataframe().unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 5);
}

#[tokio::test]
async fn test_sweep_runs_configs_independently() {
    let configs = vec![
        single_pair_config(),
        SimulationConfig {
            commission_per_share: Decimal::ZERO,
            ..single_pair_config()
        },
    ];
    let results = run_sweep(
        configs,
        Arc::new(three_day_prices()),
        Arc::new(long_ab_scores(&[1, 2])),
    )
    .await;

    let totals: Vec<Decimal> = results
        .iter()
        .map(|r| r.as_ref().unwrap().total_pl())
        .collect();
    assert_eq!(totals, vec![dec!(-1009), dec!(-1000)]);
}
