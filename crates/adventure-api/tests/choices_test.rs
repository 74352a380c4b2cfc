//! Integration tests for resolving choices.

mod common;

use std::collections::HashSet;

use axum::http::StatusCode;

#[tokio::test]
async fn test_global_player_walks_into_death_and_restarts() {
    // Arrange
    let app = common::build_test_app().await;

    // Act
    let (_, first) = common::post(app.clone(), "/api/v1/choices/a").await;
    let (_, second) = common::post(app.clone(), "/api/v1/choices/b").await;
    let (_, third) = common::post(app.clone(), "/api/v1/choices/b").await;
    let (status, fatal) = common::post(app.clone(), "/api/v1/choices/a").await;
    let (_, stats) = common::get_json(app, "/api/v1/stats").await;

    // Assert
    assert_eq!(first["player"]["health"], 90);
    assert_eq!(first["scene"]["id"], "dark_path");
    assert_eq!(second["player"]["health"], 80);
    assert_eq!(third["player"]["health"], 70);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fatal["died"], true);
    assert_eq!(fatal["scene"]["id"], "start");
    assert_eq!(fatal["player"]["health"], 100);
    assert_eq!(fatal["player"]["gold"], 0);
    assert_eq!(fatal["player"]["xp"], 0);
    assert_eq!(fatal["player"]["items"], serde_json::json!([]));
    assert_eq!(fatal["player"]["deaths"], 1);
    assert_eq!(stats["deaths"], 1);
    assert_eq!(stats["totalChoices"], 4);
    assert_eq!(stats["totalPlayers"], 1);
    assert_eq!(stats["recentChoiceHistory"][0]["died"], true);
}

#[tokio::test]
async fn test_generated_edge_is_stable_across_players() {
    // Arrange
    let app = common::build_test_app().await;
    let (_, alice) = common::post(app.clone(), "/api/v1/players").await;
    let (_, bob) = common::post(app.clone(), "/api/v1/players").await;
    let alice = alice["playerId"].as_str().unwrap().to_owned();
    let bob = bob["playerId"].as_str().unwrap().to_owned();

    // Act
    let mut reached = HashSet::new();
    for player in [&alice, &bob] {
        for choice in ["b", "a", "a"] {
            let (status, json) = common::post(
                app.clone(),
                &format!("/api/v1/players/{player}/choices/{choice}"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            if choice == "a" && json["scene"]["id"] != "magic_river" {
                reached.insert(json["scene"]["id"].as_str().unwrap().to_owned());
            }
        }
    }

    // Assert
    assert_eq!(reached.len(), 1);
    assert!(reached.iter().all(|id| id.starts_with("gen-")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_all_counted() {
    // Arrange
    let app = common::build_test_app().await;
    let mut players = Vec::new();
    for _ in 0..8 {
        let (_, json) = common::post(app.clone(), "/api/v1/players").await;
        players.push(json["playerId"].as_str().unwrap().to_owned());
    }

    // Act
    let handles: Vec<_> = players
        .iter()
        .map(|player| {
            let app = app.clone();
            let uri = format!("/api/v1/players/{player}/choices/a");
            tokio::spawn(async move { common::post(app, &uri).await })
        })
        .collect();
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    // Assert
    let (_, stats) = common::get_json(app, "/api/v1/stats").await;
    assert_eq!(stats["totalChoices"], 8);
    assert_eq!(stats["totalPlayers"], 8);
    assert_eq!(stats["visitCounts"]["dark_path"], 8);
}

#[tokio::test]
async fn test_invalid_choice_returns_400_and_changes_nothing() {
    let app = common::build_test_app().await;

    let (status, json) = common::post(app.clone(), "/api/v1/choices/left").await;
    let (_, stats) = common::get_json(app, "/api/v1/stats").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_choice");
    assert_eq!(stats["totalChoices"], 0);
}
