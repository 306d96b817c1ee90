mod common;

use bookpedia_core::controller::{MessageKey, SearchAction, SearchController, SearchState, UiText};
use bookpedia_core::{ControllerConfig, RemoteError};
use common::{book, FakeBookRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn controller(repository: &Arc<FakeBookRepository>) -> SearchController {
    SearchController::new(
        Arc::clone(repository) as _,
        ControllerConfig::default(),
        Handle::current(),
    )
}

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[tokio::test(start_paused = true)]
async fn debounced_search_publishes_results() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(400).await;
    assert!(repository.search_calls().is_empty());

    advance(200).await;
    let state = controller.snapshot();
    assert_eq!(repository.search_calls(), vec!["dune".to_string()]);
    assert_eq!(state.search_results.len(), 1);
    assert_eq!(state.search_results[0].id, "OL1W");
    assert_eq!(state.search_results[0].title, "Dune");
    assert_eq!(state.error_message, None);
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn typing_burst_issues_one_search_for_last_query() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let _observer = controller.state();

    for query in ["du", "dun", "dune", "dune m", "dune messiah"] {
        controller.on_action(SearchAction::OnSearchQueryChange(query.to_string()));
        advance(300).await;
    }
    assert!(repository.search_calls().is_empty());

    advance(1_000).await;
    assert_eq!(repository.search_calls(), vec!["dune messiah".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn other_state_changes_do_not_reset_debounce() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(300).await;
    controller.on_action(SearchAction::OnTabSelected(1));
    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(250).await;

    assert_eq!(repository.search_calls(), vec!["dune".to_string()]);
    assert_eq!(controller.snapshot().selected_tab_index, 1);
}

#[tokio::test(start_paused = true)]
async fn single_character_query_only_stores_the_query() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("d".to_string()));
    advance(2_000).await;

    assert!(repository.search_calls().is_empty());
    assert_eq!(
        controller.snapshot(),
        SearchState {
            search_query: "d".to_string(),
            ..SearchState::default()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn blank_query_restores_last_non_empty_results_without_network() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    repository.respond_to_search("zzzz", Ok(Vec::new()));
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(600).await;
    controller.on_action(SearchAction::OnSearchQueryChange("zzzz".to_string()));
    advance(600).await;
    assert!(controller.snapshot().search_results.is_empty());

    controller.on_action(SearchAction::OnSearchQueryChange("   ".to_string()));
    advance(600).await;

    let state = controller.snapshot();
    assert_eq!(repository.search_calls().len(), 2);
    assert_eq!(state.search_results, vec![book("OL1W", "Dune")]);
    assert_eq!(state.error_message, None);
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn failed_search_clears_results_and_reports_message() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    repository.respond_to_search("dune messiah", Err(RemoteError::RequestTimeout));
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(600).await;
    controller.on_action(SearchAction::OnSearchQueryChange("dune messiah".to_string()));
    advance(600).await;

    let state = controller.snapshot();
    assert!(state.search_results.is_empty());
    assert!(!state.is_loading);
    assert_eq!(
        state.error_message,
        Some(UiText::Resource(MessageKey::ErrorRequestTimeout))
    );
    assert_eq!(
        state.error_message.as_ref().map(UiText::as_str),
        Some("The request timed out")
    );
}

#[tokio::test(start_paused = true)]
async fn loading_flag_is_set_while_search_is_in_flight() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.delay_search("dune", Duration::from_secs(1));
    let controller = controller(&repository);
    let mut observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    let loading = observer.wait_for(|state| state.is_loading).await.unwrap();
    assert_eq!(loading.search_query, "dune");

    let settled = observer.wait_for(|state| !state.is_loading).await.unwrap();
    assert_eq!(settled.error_message, None);
}

#[tokio::test(start_paused = true)]
async fn superseded_search_never_overwrites_newer_results() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    repository.delay_search("dune", Duration::from_secs(2));
    repository.respond_to_search("dune messiah", Ok(vec![book("OL2W", "Dune Messiah")]));
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(700).await;
    controller.on_action(SearchAction::OnSearchQueryChange("dune messiah".to_string()));
    advance(5_000).await;

    assert_eq!(
        repository.search_calls(),
        vec!["dune".to_string(), "dune messiah".to_string()]
    );
    assert_eq!(
        controller.snapshot().search_results,
        vec![book("OL2W", "Dune Messiah")]
    );
}

#[tokio::test(start_paused = true)]
async fn blank_query_cancels_in_flight_search() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    repository.delay_search("dune", Duration::from_secs(2));
    let controller = controller(&repository);
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(700).await;
    assert!(controller.snapshot().is_loading);
    controller.on_action(SearchAction::OnSearchQueryChange(String::new()));
    advance(5_000).await;

    let state = controller.snapshot();
    assert!(!state.is_loading);
    assert!(state.search_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn favorites_are_mirrored_into_state() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let mut observer = controller.state();

    repository.emit_favorites(vec![book("OL1W", "Dune")]);
    let state = observer
        .wait_for(|state| !state.favorite_books.is_empty())
        .await
        .unwrap();
    assert_eq!(state.favorite_books, vec![book("OL1W", "Dune")]);

    repository.emit_favorites(Vec::new());
    let state = observer
        .wait_for(|state| state.favorite_books.is_empty())
        .await
        .unwrap();
    assert!(state.search_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reactivation_within_grace_window_keeps_existing_subscriptions() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);

    drop(controller.state());
    advance(2_000).await;
    let _observer = controller.state();
    advance(10).await;

    assert_eq!(
        repository
            .favorite_subscriptions
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
    assert_eq!(repository.favorite_receivers(), 1);
}

#[tokio::test(start_paused = true)]
async fn reactivation_after_grace_window_replaces_the_mirror() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);

    drop(controller.state());
    advance(6_000).await;
    let _observer = controller.state();
    advance(10).await;

    assert_eq!(
        repository
            .favorite_subscriptions
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
    assert_eq!(repository.favorite_receivers(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_stops_its_subscriptions() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let observer = controller.state();
    advance(10).await;
    assert_eq!(repository.favorite_receivers(), 1);

    drop(observer);
    drop(controller);
    advance(10).await;
    assert_eq!(repository.favorite_receivers(), 0);
}

#[tokio::test(start_paused = true)]
async fn book_click_does_not_touch_state() {
    let repository = Arc::new(FakeBookRepository::default());
    let controller = controller(&repository);
    let _observer = controller.state();
    advance(600).await;
    let before = controller.snapshot();

    controller.on_action(SearchAction::OnBookClick(book("OL1W", "Dune")));
    advance(600).await;

    assert_eq!(controller.snapshot(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blank_query_restore_is_not_overwritten_by_a_finishing_search() {
    let repository = Arc::new(FakeBookRepository::default());
    repository.respond_to_search("dune", Ok(vec![book("OL1W", "Dune")]));
    repository.respond_to_search("zzzz", Err(RemoteError::Server));
    repository.delay_search("zzzz", Duration::from_millis(40));
    let controller = SearchController::new(
        Arc::clone(&repository) as _,
        ControllerConfig {
            search_debounce: Duration::from_millis(20),
            ..ControllerConfig::default()
        },
        Handle::current(),
    );
    let _observer = controller.state();

    controller.on_action(SearchAction::OnSearchQueryChange("dune".to_string()));
    advance(150).await;
    controller.on_action(SearchAction::OnSearchQueryChange("zzzz".to_string()));
    advance(30).await;
    controller.on_action(SearchAction::OnSearchQueryChange(String::new()));
    advance(200).await;

    let state = controller.snapshot();
    assert_eq!(state.search_results, vec![book("OL1W", "Dune")]);
    assert_eq!(state.error_message, None);
    assert!(!state.is_loading);
}
