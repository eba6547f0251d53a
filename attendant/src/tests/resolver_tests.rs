use std::time::Duration;

use tokio::time::Instant;

use super::mock::{ElementScript, MockBrowser};
use crate::errors::AutomationError;
use crate::resolver::ElementResolver;
use crate::selector::{FallbackSet, LocatorCandidate};
use crate::session::Session;

fn fallback_set(name: &str, selectors: &[&str], wait: Duration) -> FallbackSet {
    FallbackSet::new(
        name,
        selectors
            .iter()
            .map(|s| LocatorCandidate::new(*s).with_wait(wait))
            .collect(),
    )
}

#[tokio::test(start_paused = true)]
async fn first_interactable_candidate_wins() {
    let browser = MockBrowser::new();
    browser.script("css:.primary", ElementScript::ready());
    browser.script("css:.secondary", ElementScript::ready());
    let session = Session::new(Box::new(browser.clone()));

    let set = fallback_set(
        "control",
        &["css:.primary", "css:.secondary"],
        Duration::from_millis(500),
    );
    let element = ElementResolver::new().resolve(&session, &set).await.unwrap();
    element.click().await.unwrap();

    assert_eq!(browser.clicks(), vec!["css:.primary".to_string()]);
    assert_eq!(browser.queries_for("css:.primary"), 1);
    assert_eq!(
        browser.queries_for("css:.secondary"),
        0,
        "later candidates must never be evaluated after a success"
    );
}

#[tokio::test(start_paused = true)]
async fn candidates_are_tried_in_order() {
    let browser = MockBrowser::new();
    // .first never shows up, .second does.
    browser.script("css:.second", ElementScript::ready());
    let session = Session::new(Box::new(browser.clone()));

    let set = fallback_set(
        "control",
        &["css:.first", "css:.second"],
        Duration::from_millis(400),
    );
    let element = ElementResolver::new().resolve(&session, &set).await.unwrap();
    element.click().await.unwrap();

    assert_eq!(browser.clicks(), vec!["css:.second".to_string()]);
    assert!(
        browser.queries_for("css:.first") > 1,
        "the first candidate gets its full polling budget before the next is tried"
    );
}

#[tokio::test(start_paused = true)]
async fn exhaustion_spends_every_candidate_budget() {
    super::init_tracing();
    let browser = MockBrowser::new();
    browser.script("css:.never", ElementScript::never_interactable());
    let session = Session::new(Box::new(browser.clone()));

    let set = FallbackSet::new(
        "gone",
        vec![
            LocatorCandidate::new("css:.missing").with_wait(Duration::from_millis(400)),
            LocatorCandidate::new("css:.never").with_wait(Duration::from_millis(600)),
        ],
    );

    let started = Instant::now();
    let err = ElementResolver::new()
        .resolve(&session, &set)
        .await
        .unwrap_err();
    assert!(
        started.elapsed() >= Duration::from_millis(1000),
        "exhaustion must not be reported before every candidate budget has elapsed"
    );

    match err {
        AutomationError::LocatorNotFound { set, tried, elapsed } => {
            assert_eq!(set, "gone");
            assert_eq!(
                tried,
                vec!["css:.missing".to_string(), "css:.never".to_string()]
            );
            assert!(elapsed >= Duration::from_millis(1000));
        }
        other => panic!("expected LocatorNotFound, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn waits_for_delayed_presence() {
    let browser = MockBrowser::new();
    browser.script("css:.slow", ElementScript::present_after(3));
    let session = Session::new(Box::new(browser.clone()));

    let set = fallback_set("control", &["css:.slow"], Duration::from_secs(2));
    ElementResolver::new().resolve(&session, &set).await.unwrap();

    assert_eq!(browser.queries_for("css:.slow"), 4);
}

#[tokio::test(start_paused = true)]
async fn presence_is_not_interactability() {
    let browser = MockBrowser::new();
    // Present immediately, but only interactable two polls later.
    browser.script(
        "css:.lazy",
        ElementScript {
            present_after: 0,
            interactable_after: 2,
            error_first: 0,
        },
    );
    let session = Session::new(Box::new(browser.clone()));
    let set = fallback_set("control", &["css:.lazy"], Duration::from_secs(2));

    ElementResolver::new()
        .resolve_present(&session, &set)
        .await
        .unwrap();
    assert_eq!(browser.queries_for("css:.lazy"), 1);

    ElementResolver::new().resolve(&session, &set).await.unwrap();
    // Two more polls before the interactable one.
    assert_eq!(browser.queries_for("css:.lazy"), 3);
}

#[tokio::test(start_paused = true)]
async fn channel_errors_are_absorbed_while_polling() {
    let browser = MockBrowser::new();
    browser.script("css:.flaky", ElementScript::erroring_then_ready(2));
    let session = Session::new(Box::new(browser.clone()));

    let set = fallback_set("control", &["css:.flaky"], Duration::from_secs(2));
    let element = ElementResolver::new().resolve(&session, &set).await.unwrap();
    element.click().await.unwrap();

    assert_eq!(browser.clicks(), vec!["css:.flaky".to_string()]);
}
