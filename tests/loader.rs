use async_trait::async_trait;
use investments_loader::{
    render, CategoryContentLoader, CategorySelector, FetchError, Investment, InvestmentSource,
    InvestmentsResponse, LoadState, RenderOptions, RetryPolicy, View, ViewKind,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

type Reply = (Duration, Result<InvestmentsResponse, FetchError>);

/// Replays canned replies per category, recording every request
#[derive(Default)]
struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn reply(&self, category: &str, after_ms: u64, result: Result<InvestmentsResponse, FetchError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(category.to_string())
            .or_default()
            .push_back((Duration::from_millis(after_ms), result));
    }

    fn calls_for(&self, category: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == category)
            .count()
    }
}

#[async_trait]
impl InvestmentSource for ScriptedSource {
    async fn fetch(&self, category: &CategorySelector) -> Result<InvestmentsResponse, FetchError> {
        let key = category.query_value().to_string();
        self.calls.lock().unwrap().push(key.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match next {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(FetchError::Network(format!("no reply scripted for {}", key))),
        }
    }
}

fn ok(names: &[&str]) -> Result<InvestmentsResponse, FetchError> {
    let investments: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "id": i + 1, "name": name }))
        .collect();
    Ok(serde_json::from_value(json!({ "success": true, "investments": investments })).unwrap())
}

fn network() -> Result<InvestmentsResponse, FetchError> {
    Err(FetchError::Network("connection reset".into()))
}

fn names(state: &LoadState) -> Vec<String> {
    match state {
        LoadState::Success(items) => items.iter().map(|i: &Investment| i.name.clone()).collect(),
        other => panic!("expected success, got {:?}", other),
    }
}

fn loader_with(source: &Arc<ScriptedSource>, policy: RetryPolicy) -> CategoryContentLoader {
    CategoryContentLoader::new(source.clone(), policy, RenderOptions::default())
}

#[tokio::test(start_paused = true)]
async fn fast_response_is_held_for_min_display() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("tech", 50, ok(&["Acme"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    let started = Instant::now();
    assert!(loader.select_category("tech"));
    assert_eq!(loader.view().kind(), ViewKind::Loading);

    let state = loader.settle().await.clone();
    assert!(started.elapsed() >= Duration::from_millis(650));
    assert_eq!(names(&state), ["Acme"]);

    let View::Cards(cards) = loader.view() else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "Acme");
    assert!(loader.html().contains(r#"data-opportunity-id="1""#));
}

#[tokio::test(start_paused = true)]
async fn loading_stays_up_until_display_delay_elapses() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("tech", 0, ok(&["Acme"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("tech");
    let state = loader.step().await.clone();
    assert!(matches!(state, LoadState::Loading { attempt: 0, .. }));
    let response_at = Instant::now();

    let early = tokio::time::timeout(Duration::from_millis(599), loader.step()).await;
    assert!(early.is_err(), "rendered before the display delay");
    assert!(matches!(loader.state(), LoadState::Loading { .. }));

    let state = loader.step().await.clone();
    assert!(response_at.elapsed() >= Duration::from_millis(600));
    assert_eq!(names(&state), ["Acme"]);
}

/// Never answers; only the loader's own timeout can end the request
struct HangingSource {
    calls: Mutex<usize>,
}

#[async_trait]
impl InvestmentSource for HangingSource {
    async fn fetch(&self, _category: &CategorySelector) -> Result<InvestmentsResponse, FetchError> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(FetchError::Network("unreachable".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn policy_timeout_ends_hanging_request() {
    let source = Arc::new(HangingSource {
        calls: Mutex::new(0),
    });
    let policy = RetryPolicy {
        timeout: Duration::from_millis(100),
        ..RetryPolicy::default()
    };
    let mut loader = CategoryContentLoader::new(source.clone(), policy, RenderOptions::default());

    let started = Instant::now();
    loader.select_category("tech");
    let state = tokio::time::timeout(Duration::from_secs(60), loader.settle())
        .await
        .expect("loader never settled")
        .clone();

    assert_eq!(
        state,
        LoadState::Error {
            attempt: 0,
            max_attempts: 3,
            failure: FetchError::Timeout(Duration::from_millis(100)),
        }
    );
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(*source.calls.lock().unwrap(), 1);
    assert_eq!(loader.view(), View::Failure);
}

#[tokio::test(start_paused = true)]
async fn repeated_network_failures_exhaust_retries() {
    let source = Arc::new(ScriptedSource::default());
    for _ in 0..4 {
        source.reply("energy", 0, network());
    }
    let mut loader = loader_with(&source, RetryPolicy::default());

    let started = Instant::now();
    loader.select_category("energy");

    let mut notices = Vec::new();
    while !loader.state().is_settled() {
        let state = loader.step().await.clone();
        if let LoadState::Retrying { .. } = state {
            notices.push(render(&state, &RenderOptions::default()).to_html(&RenderOptions::default()));
        }
    }

    assert_eq!(notices.len(), 3);
    assert!(notices[0].contains("Attempt 1 of 3"));
    assert!(notices[1].contains("Attempt 2 of 3"));
    assert!(notices[2].contains("Attempt 3 of 3"));

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(9000));
    assert!(elapsed < Duration::from_millis(9100));

    assert!(matches!(
        loader.state(),
        LoadState::Error {
            attempt: 3,
            max_attempts: 3,
            failure: FetchError::Network(_),
        }
    ));
    assert_eq!(loader.view(), View::Failure);
    assert!(loader.html().contains("Try Again"));
    assert_eq!(source.calls_for("energy"), 4);
}

#[tokio::test(start_paused = true)]
async fn timeout_skips_automatic_retry() {
    let source = Arc::new(ScriptedSource::default());
    source.reply(
        "energy",
        15000,
        Err(FetchError::Timeout(Duration::from_millis(15000))),
    );
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("energy");
    let state = loader.settle().await.clone();

    assert!(matches!(
        state,
        LoadState::Error {
            attempt: 0,
            failure: FetchError::Timeout(_),
            ..
        }
    ));
    assert_eq!(source.calls_for("energy"), 1);
}

#[tokio::test(start_paused = true)]
async fn unsuccessful_envelope_counts_against_budget() {
    let source = Arc::new(ScriptedSource::default());
    source.reply(
        "tech",
        0,
        Ok(serde_json::from_value(json!({ "success": false })).unwrap()),
    );
    source.reply("tech", 0, ok(&["Acme"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("tech");
    let mut saw_retry = false;
    while !loader.state().is_settled() {
        if let LoadState::Retrying { attempt: 1, .. } = loader.step().await {
            saw_retry = true;
        }
    }

    assert!(saw_retry);
    assert_eq!(names(loader.state()), ["Acme"]);
}

#[tokio::test(start_paused = true)]
async fn empty_list_renders_empty_state() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("all", 10, ok(&[]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category(CategorySelector::All);
    loader.settle().await;

    assert_eq!(loader.view(), View::Empty);
    assert!(loader.html().contains("View All Investments"));
}

#[tokio::test(start_paused = true)]
async fn last_selected_category_wins() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("tech", 1000, ok(&["Old"]));
    source.reply("energy", 50, ok(&["New"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("tech");
    tokio::time::sleep(Duration::from_millis(200)).await;
    loader.select_category("energy");

    loader.settle().await;
    assert_eq!(names(loader.state()), ["New"]);

    // Well past the point where the superseded reply would have landed
    tokio::time::sleep(Duration::from_secs(5)).await;
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(1), loader.next_event()).await
    {
        assert!(!loader.handle(event));
    }
    assert_eq!(names(loader.state()), ["New"]);
    assert_eq!(loader.active_category(), Some(&CategorySelector::Id("energy".into())));
}

#[tokio::test(start_paused = true)]
async fn rapid_switching_renders_only_final_selection() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("a", 300, ok(&["A"]));
    source.reply("b", 200, ok(&["B"]));
    source.reply("c", 100, ok(&["C"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("a");
    loader.select_category("b");
    loader.select_category("c");

    let mut rendered = Vec::new();
    while !loader.state().is_settled() {
        if let LoadState::Success(_) = loader.step().await {
            rendered.push(names(loader.state()));
        }
    }
    assert_eq!(rendered, vec![vec!["C".to_string()]]);
}

#[tokio::test(start_paused = true)]
async fn selecting_during_retry_delay_cancels_pending_retry() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("energy", 0, network());
    source.reply("tech", 0, ok(&["Acme"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    loader.select_category("energy");
    let state = loader.step().await.clone();
    assert!(matches!(state, LoadState::Retrying { attempt: 1, .. }));

    loader.select_category("tech");
    loader.settle().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(source.calls_for("energy"), 1);
    assert_eq!(names(loader.state()), ["Acme"]);
}

#[tokio::test(start_paused = true)]
async fn reselecting_active_category_does_not_refetch() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("tech", 10, ok(&["Acme"]));
    let mut loader = loader_with(&source, RetryPolicy::default());

    assert!(loader.select_category("tech"));
    assert!(!loader.select_category("tech"));
    loader.settle().await;
    assert!(!loader.select_category(" tech "));

    assert_eq!(source.calls_for("tech"), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_retry_resets_attempts() {
    let source = Arc::new(ScriptedSource::default());
    source.reply("energy", 0, network());
    source.reply("energy", 0, network());
    let policy = RetryPolicy {
        max_retries: 1,
        retry_delay: Duration::from_millis(100),
        ..RetryPolicy::default()
    };
    let mut loader = loader_with(&source, policy);

    loader.select_category("energy");
    loader.settle().await;
    assert!(matches!(loader.state(), LoadState::Error { attempt: 1, .. }));

    source.reply("energy", 0, network());
    source.reply("energy", 0, ok(&["Recovered"]));
    assert!(loader.retry());
    assert_eq!(
        loader.state(),
        &LoadState::Loading {
            attempt: 0,
            max_attempts: 1
        }
    );

    loader.settle().await;
    assert_eq!(names(loader.state()), ["Recovered"]);
    assert_eq!(source.calls_for("energy"), 4);
}

#[tokio::test(start_paused = true)]
async fn retry_before_any_selection_is_ignored() {
    let source = Arc::new(ScriptedSource::default());
    let mut loader = loader_with(&source, RetryPolicy::default());

    assert!(!loader.retry());
    assert_eq!(loader.state(), &LoadState::Idle);
    assert_eq!(loader.view().kind(), ViewKind::Idle);
    assert!(loader.html().is_empty());
}
