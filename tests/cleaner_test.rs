mod common;

use std::sync::{Arc, atomic::Ordering};

use common::{FakeTokens, RecordingSleeper, ScriptedApi, ids, page, record, user};
use spotify_cleaner::{
    Error,
    error::{ApiError, AuthError},
    management::{FilterOptions, PlaylistCleaner},
    retry::RetryPolicy,
    types::MutationStatus,
};

fn cleaner(api: &Arc<ScriptedApi>, tokens: &Arc<FakeTokens>) -> PlaylistCleaner {
    PlaylistCleaner::new(
        api.clone(),
        tokens.clone(),
        Arc::new(RecordingSleeper::new()),
        RetryPolicy::default(),
    )
}

fn tokens_used(api: &ScriptedApi) -> Vec<String> {
    api.page_calls
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.0.clone())
        .collect()
}

#[tokio::test]
async fn test_list_recovers_from_unauthorized_and_restarts() {
    let api = Arc::new(ScriptedApi::new());
    api.push_page(Err(ApiError::Unauthorized))
        .push_page(Ok(page(vec![record("a", "A", "me")], false, 1)));
    let tokens = Arc::new(FakeTokens::new(&["t1", "t2"]));

    let playlists = cleaner(&api, &tokens)
        .list_playlists(&Default::default())
        .await
        .unwrap();

    assert_eq!(playlists.len(), 1);
    assert_eq!(tokens.recoveries(), 1);
    assert_eq!(tokens_used(&api), vec!["t1", "t2"]);
    assert_eq!(api.offsets(), vec![0, 0]);
}

#[tokio::test]
async fn test_second_unauthorized_is_returned() {
    let api = Arc::new(ScriptedApi::new());
    api.push_page(Err(ApiError::Unauthorized))
        .push_page(Err(ApiError::Unauthorized));
    let tokens = Arc::new(FakeTokens::new(&["t1", "t2"]));

    let err = cleaner(&api, &tokens)
        .list_playlists(&Default::default())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(tokens.recoveries(), 1);
}

#[tokio::test]
async fn test_failed_recovery_is_returned() {
    let api = Arc::new(ScriptedApi::new());
    api.push_page(Err(ApiError::Unauthorized));
    let tokens = Arc::new(
        FakeTokens::new(&["t1"]).fail_recover(AuthError::CallbackTimeout(120)),
    );

    let err = cleaner(&api, &tokens)
        .list_playlists(&Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::CallbackTimeout(120))));
}

#[tokio::test]
async fn test_owner_filter_resolves_current_user_once() {
    let api = Arc::new(ScriptedApi::new());
    api.push_user(Ok(user("alice")))
        .push_page(Ok(page(
            vec![record("a", "A", "alice"), record("b", "B", "bob")],
            false,
            2,
        )));
    let tokens = Arc::new(FakeTokens::new(&["t"]));
    let criteria = FilterOptions {
        owner: Some("me".to_string()),
        ..Default::default()
    }
    .compile()
    .unwrap();
    let cleaner = cleaner(&api, &tokens);

    let mine = cleaner.list_playlists(&criteria).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, "a");

    api.push_page(Ok(page(vec![record("b", "B", "bob")], false, 1)));
    let preview = cleaner.preview_unfollow(&criteria).await.unwrap();
    assert!(preview.is_empty());

    assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_filters_without_owner_keyword_skip_profile_lookup() {
    let api = Arc::new(ScriptedApi::new());
    let mut empty = record("e", "Empty", "bob");
    empty.track_count = 0;
    api.push_page(Ok(page(vec![record("a", "A", "bob"), empty], false, 2)));
    let tokens = Arc::new(FakeTokens::new(&["t"]));
    let criteria = FilterOptions {
        empty: true,
        ..Default::default()
    }
    .compile()
    .unwrap();

    let matched = cleaner(&api, &tokens).list_playlists(&criteria).await.unwrap();

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, "e");
    assert_eq!(api.user_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_list_page_requests_one_window() {
    let api = Arc::new(ScriptedApi::new());
    api.push_page(Ok(page(vec![record("x", "X", "me")], true, 31)));
    let tokens = Arc::new(FakeTokens::new(&["t"]));

    let result = cleaner(&api, &tokens).list_page(3, 10).await.unwrap();

    assert_eq!(result.total, 31);
    assert_eq!(
        api.page_calls.lock().unwrap().clone(),
        vec![("t".to_string(), 20, 10)]
    );
}

#[tokio::test]
async fn test_unfollow_resumes_after_unauthorized() {
    let api = Arc::new(ScriptedApi::new());
    api.push_unfollow("b", Err(ApiError::Unauthorized));
    let tokens = Arc::new(FakeTokens::new(&["t1", "t2"]));

    let outcomes = cleaner(&api, &tokens)
        .execute_unfollow(&ids(&["a", "b", "c"]), false)
        .await
        .unwrap();

    let done: Vec<(&str, MutationStatus)> = outcomes
        .iter()
        .map(|o| (o.playlist_id.as_str(), o.status))
        .collect();
    assert_eq!(
        done,
        vec![
            ("a", MutationStatus::Success),
            ("b", MutationStatus::Success),
            ("c", MutationStatus::Success)
        ]
    );
    assert_eq!(
        api.unfollow_calls.lock().unwrap().clone(),
        vec![
            ("t1".to_string(), "a".to_string()),
            ("t1".to_string(), "b".to_string()),
            ("t2".to_string(), "b".to_string()),
            ("t2".to_string(), "c".to_string()),
        ]
    );
    assert_eq!(tokens.recoveries(), 1);
}

#[tokio::test]
async fn test_unfollow_reports_progress_when_recovery_fails() {
    let api = Arc::new(ScriptedApi::new());
    api.push_unfollow("b", Err(ApiError::Unauthorized));
    let tokens = Arc::new(
        FakeTokens::new(&["t1"]).fail_recover(AuthError::AuthorizationDenied(
            "access_denied".to_string(),
        )),
    );

    let err = cleaner(&api, &tokens)
        .execute_unfollow(&ids(&["a", "b", "c"]), false)
        .await
        .unwrap_err();

    let Error::Interrupted(interrupted) = err else {
        panic!("expected an interrupted batch");
    };
    assert_eq!(interrupted.completed.len(), 1);
    assert_eq!(interrupted.completed[0].playlist_id, "a");
    assert_eq!(interrupted.remaining, vec!["b", "c"]);
    assert!(matches!(
        *interrupted.source,
        Error::Auth(AuthError::AuthorizationDenied(_))
    ));
}

#[tokio::test]
async fn test_unfollow_resumes_only_once() {
    let api = Arc::new(ScriptedApi::new());
    api.push_unfollow("b", Err(ApiError::Unauthorized))
        .push_unfollow("b", Err(ApiError::Unauthorized));
    let tokens = Arc::new(FakeTokens::new(&["t1", "t2", "t3"]));

    let err = cleaner(&api, &tokens)
        .execute_unfollow(&ids(&["a", "b", "c"]), false)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    let Error::Interrupted(interrupted) = err else {
        panic!("expected an interrupted batch");
    };
    assert_eq!(interrupted.completed.len(), 1);
    assert_eq!(interrupted.remaining, vec!["b", "c"]);
    assert_eq!(tokens.recoveries(), 1);
}

#[tokio::test]
async fn test_dry_run_unfollow_sends_nothing() {
    let api = Arc::new(ScriptedApi::new());
    let tokens = Arc::new(FakeTokens::new(&["t"]));

    let outcomes = cleaner(&api, &tokens)
        .execute_unfollow(&ids(&["a", "b"]), true)
        .await
        .unwrap();

    assert!(outcomes.iter().all(|o| o.status == MutationStatus::Simulated));
    assert!(api.unfollow_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_auth_check_returns_profile() {
    let api = Arc::new(ScriptedApi::new());
    api.push_user(Err(ApiError::Unauthorized))
        .push_user(Ok(user("alice")));
    let tokens = Arc::new(FakeTokens::new(&["t1", "t2"]));

    let profile = cleaner(&api, &tokens).test_auth().await.unwrap();

    assert_eq!(profile.id, "alice");
    assert_eq!(tokens.recoveries(), 1);
}
