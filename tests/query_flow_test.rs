use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ragline::api::BackendClient;
use ragline::app::{App, MessageKind};

/// Pump backend and typing events until the current exchange has fully
/// concluded (no request in flight, no reveal running).
async fn settle(app: &mut App) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.loading || app.typing {
        app.process_backend_events();
        app.process_typing_events();
        assert!(Instant::now() < deadline, "exchange did not settle in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn successful_query_appends_user_then_bot_with_exact_answer() {
    let server = MockServer::start().await;
    let answer = "The library is open from 8am to 10pm on weekdays.";

    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("question", "when is the library open?"))
        .and(query_param("mode", "hybrid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": answer,
            "error": null,
            "mode": "hybrid",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = App::new(BackendClient::new(server.uri()));
    app.mode_selected("hybrid");
    app.question_changed("when is the library open?");
    app.submit_question();

    // The user message is visible before the response resolves.
    assert_eq!(app.messages.len(), 1);
    assert_eq!(app.messages[0].kind, MessageKind::User);
    assert!(app.loading);

    settle(&mut app).await;

    assert_eq!(app.messages.len(), 2);
    assert_eq!(app.messages[0].kind, MessageKind::User);
    assert_eq!(app.messages[0].text, "when is the library open?");
    assert_eq!(app.messages[1].kind, MessageKind::Bot);
    assert_eq!(app.messages[1].text, answer);
    assert_eq!(app.messages[1].mode.as_deref(), Some("hybrid"));
    assert!(!app.messages[1].error);
    assert!(!app.loading);
    assert!(!app.typing);
}

#[tokio::test]
async fn reveal_partials_are_prefixes_of_the_final_answer() {
    let server = MockServer::start().await;
    let answer = "Hybrid mode combines local and global context analysis for retrieval.";

    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": answer,
            "error": null,
            "mode": "naive",
        })))
        .mount(&server)
        .await;

    let mut app = App::new(BackendClient::new(server.uri()));
    app.question_changed("what does hybrid mode do?");
    app.submit_question();

    // Sample the bot message while the reveal runs. Draining can skip
    // intermediate snapshots, but every sample must still be a prefix of
    // the next and lengths must never shrink.
    let mut samples: Vec<String> = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.loading || app.typing {
        app.process_backend_events();
        app.process_typing_events();
        if let Some(bot) = app.messages.get(1) {
            if samples.last().map_or(true, |s| s != &bot.text) {
                samples.push(bot.text.clone());
            }
        }
        assert!(Instant::now() < deadline, "reveal did not finish in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(samples.len() > 1, "expected to observe intermediate partials");
    assert_eq!(samples.last().unwrap(), answer);
    for pair in samples.windows(2) {
        assert!(pair[1].len() >= pair[0].len());
        assert!(pair[1].starts_with(pair[0].as_str()));
    }
}

#[tokio::test]
async fn submission_is_rejected_while_a_reveal_is_running() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": "a fairly long answer that takes several reveal steps to type out",
            "error": null,
            "mode": "naive",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = App::new(BackendClient::new(server.uri()));
    app.question_changed("first question");
    app.submit_question();

    // Wait for the placeholder to appear and the reveal to start.
    let deadline = Instant::now() + Duration::from_secs(10);
    while !app.typing {
        app.process_backend_events();
        app.process_typing_events();
        assert!(Instant::now() < deadline, "reveal never started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    app.question_changed("second question");
    app.submit_question();
    assert_eq!(app.messages.len(), 2, "no message may be appended mid-reveal");

    settle(&mut app).await;
    assert_eq!(app.messages.len(), 2);
}

#[tokio::test]
async fn transport_error_yields_one_error_message_and_clears_loading() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = App::new(BackendClient::new(server.uri()));
    app.question_changed("anything");
    app.submit_question();
    settle(&mut app).await;

    assert_eq!(app.messages.len(), 2);
    assert_eq!(app.messages[1].kind, MessageKind::Bot);
    assert!(app.messages[1].error);
    assert!(app.messages[1].text.contains("500"));
    assert!(app.messages[1].mode.is_none());
    assert!(!app.loading);
    assert!(!app.typing);
}

#[tokio::test]
async fn application_error_payload_becomes_the_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "response": null,
            "error": "no documents found",
            "mode": "naive",
        })))
        .mount(&server)
        .await;

    let mut app = App::new(BackendClient::new(server.uri()));
    app.question_changed("an unanswerable question");
    app.submit_question();
    settle(&mut app).await;

    assert_eq!(app.messages.len(), 2);
    assert_eq!(app.messages[1].text, "no documents found");
    assert!(app.messages[1].error);
    assert!(!app.loading);
}

#[tokio::test]
async fn unreachable_backend_yields_one_error_message() {
    let mut app = App::new(BackendClient::new("http://127.0.0.1:1"));
    app.question_changed("is anyone there?");
    app.submit_question();
    settle(&mut app).await;

    assert_eq!(app.messages.len(), 2);
    assert!(app.messages[1].error);
    assert!(!app.messages[1].text.is_empty());
}

#[tokio::test]
async fn health_probe_reports_backend_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let client = BackendClient::new(server.uri());
    assert_eq!(client.health().await.unwrap(), "healthy");
}
