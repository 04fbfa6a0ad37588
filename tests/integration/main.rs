//! Runner and multi-account integration tests against a scripted lender.

mod mock_lender;

use autolend::engine::run_accounts;
use autolend::engine::runner::Runner;
use autolend::lenders::LenderService;
use autolend::types::*;

use mock_lender::{product, setting, MockLender, Scripted};

fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test]
async fn test_new_runner_logs_in() {
    let lender = MockLender::new(Company::Honestfund);
    let s = setting(Company::Honestfund, "hf@honestfund.kr");

    let runner = Runner::new(&s, &lender).await.unwrap();
    assert_eq!(runner.session().token(), "TOKEN#hf@honestfund.kr");
}

#[tokio::test]
async fn test_login_failure_aborts_account() {
    let lender = MockLender::new(Company::Peoplefund).failing_login("can't find SESSID");
    let s = setting(Company::Peoplefund, "pf@peoplefund.kr");

    let err = Runner::new(&s, &lender).await.err().unwrap();
    assert!(matches!(err, LendError::Auth(_)));
}

#[tokio::test]
async fn test_list_products_skips_held_titles_except_reinvestable() {
    let lender = MockLender::new(Company::Honestfund)
        .with_held(&["TITLE#1", "Second Title", "P2P", "SCF Basic"])
        .with_reinvestable_prefix("SCF")
        .with_products(vec![
            product("1", "SCF Basic"),
            product("2", "TITLE#1"),
            product("3", "P2P"),
            product("4", "Third Title"),
        ]);
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let products = runner.list_products().await.unwrap();
    assert_eq!(ids(&products), vec!["1", "4"]);
}

#[tokio::test]
async fn test_list_products_compares_normalized_titles() {
    let lender = MockLender::new(Company::Honestfund)
        .with_held(&["Series A"])
        .with_products(vec![
            product("1", "Series A 3호 1차"),
            product("2", "Series B 1호"),
        ]);
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let products = runner.list_products().await.unwrap();
    assert_eq!(ids(&products), vec!["2"]);
}

#[tokio::test]
async fn test_candidates_apply_policy() {
    let mut high_rate = product("2", "High rate");
    high_rate.rate = rust_decimal_macros::dec!(20);
    let mut personal = product("3", "Personal");
    personal.category = Category::PersonalCredit;

    let lender = MockLender::new(Company::Honestfund).with_products(vec![
        product("1", "Fits"),
        high_rate,
        personal,
        product("4", "Also fits"),
    ]);
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let candidates = runner.candidates().await.unwrap();
    assert_eq!(ids(&candidates), vec!["1", "4"]);
}

#[tokio::test]
async fn test_invest_loop_skips_duplicate_and_stops_on_balance() {
    let lender = MockLender::new(Company::Honestfund)
        .with_products(vec![
            product("A", "A"),
            product("B", "B"),
            product("C", "C"),
            product("D", "D"),
        ])
        .with_outcome("A", Scripted::Reject(InvestError::Duplicated))
        .with_outcome("C", Scripted::Reject(InvestError::InsufficientBalance));
    let attempts = lender.attempts();
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let report = runner.run(false).await.unwrap();

    assert_eq!(report.candidates, 4);
    assert_eq!(report.invested, 1);
    assert_eq!(report.total_amount, 10_000);
    assert_eq!(report.skipped_duplicated, 1);
    assert!(report.stopped_on_balance);

    let attempted: Vec<String> = attempts.lock().unwrap().iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(attempted, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_invest_loop_continues_past_capacity() {
    let lender = MockLender::new(Company::Peoplefund)
        .with_products(vec![product("A", "A"), product("B", "B"), product("C", "C")])
        .with_outcome("B", Scripted::Reject(InvestError::InsufficientCapacity));
    let attempts = lender.attempts();
    let s = setting(Company::Peoplefund, "pf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let report = runner.run(false).await.unwrap();

    assert_eq!(report.invested, 2);
    assert_eq!(report.skipped_capacity, 1);
    assert_eq!(report.total_amount, 20_000);
    assert!(!report.stopped_on_balance);
    assert!(attempts.lock().unwrap().iter().all(|(_, amount)| *amount == 10_000));
}

#[tokio::test]
async fn test_invest_loop_aborts_on_unrecognized_error() {
    let lender = MockLender::new(Company::Honestfund)
        .with_products(vec![product("A", "A"), product("B", "B"), product("C", "C")])
        .with_outcome("B", Scripted::Fail("E500".to_string()));
    let attempts = lender.attempts();
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let err = runner.run(false).await.unwrap_err();

    match err {
        LendError::Interrupted {
            invested,
            total_amount,
            source,
        } => {
            assert_eq!(invested, 1);
            assert_eq!(total_amount, 10_000);
            assert!(matches!(*source, LendError::UnrecognizedCode { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(attempts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invest_loop_abort_before_any_order_is_unwrapped() {
    let lender = MockLender::new(Company::Honestfund)
        .with_products(vec![product("A", "A"), product("B", "B")])
        .with_outcome("A", Scripted::Fail("E500".to_string()));
    let attempts = lender.attempts();
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let err = runner.run(false).await.unwrap_err();

    assert!(matches!(err, LendError::UnrecognizedCode { .. }));
    assert_eq!(attempts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dry_run_places_no_orders() {
    let lender = MockLender::new(Company::Honestfund)
        .with_products(vec![product("A", "A"), product("B", "B")]);
    let attempts = lender.attempts();
    let s = setting(Company::Honestfund, "hf");

    let runner = Runner::new(&s, &lender).await.unwrap();
    let report = runner.run(true).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.candidates, 2);
    assert_eq!(report.invested, 0);
    assert!(attempts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_account_does_not_stop_the_next() {
    let settings = vec![
        setting(Company::Peoplefund, "broken"),
        setting(Company::Honestfund, "healthy"),
    ];

    let outcomes = run_accounts(
        &settings,
        |company| -> Box<dyn LenderService> {
            match company {
                Company::Peoplefund => {
                    Box::new(MockLender::new(company).failing_login("bad credentials"))
                }
                Company::Honestfund => Box::new(
                    MockLender::new(company).with_products(vec![product("A", "A")]),
                ),
            }
        },
        false,
    )
    .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].username, "broken");
    assert!(matches!(outcomes[0].result, Err(LendError::Auth(_))));

    let report = outcomes[1].result.as_ref().unwrap();
    assert_eq!(report.company, Company::Honestfund);
    assert_eq!(report.invested, 1);
    assert_eq!(report.to_string(), "Honestfund healthy invested 1 products, total amount 10000");
}
