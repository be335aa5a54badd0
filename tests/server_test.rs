//! Integration tests for the local realtime collector

#[cfg(feature = "server")]
mod server_tests {
    use sleepy_sensor::config::Config;
    use sleepy_sensor::reporter::{ReportError, Reporter};
    use sleepy_sensor::sensor::{Reading, SleepPhase};
    use sleepy_sensor::server::{run, ServerConfig};
    use std::net::SocketAddr;

    fn reporter_for(addr: SocketAddr, token: &str, user_id: &str) -> Reporter {
        Reporter::new(&Config {
            endpoint_url: Some(format!("http://{addr}/webhook/realtime")),
            token: token.to_string(),
            user_id: user_id.to_string(),
            ..Config::default()
        })
    }

    fn rem_reading() -> Reading {
        Reading {
            is_sleeping: true,
            phase: SleepPhase::Rem,
            heart_rate: 66,
            respiration_rate: 15,
            movement_count: 2,
            elapsed_minutes: 250,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, None))
            .await
            .expect("Failed to start collector");

        let response = reqwest::get(format!("http://{addr}/health"))
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_reporter_round_trip_through_collector() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, None))
            .await
            .expect("Failed to start collector");

        let reporter = reporter_for(addr, "any-token", "alice");
        let ack = reporter.report(&rem_reading()).await.expect("Report failed");
        assert_eq!(
            ack.message.as_deref(),
            Some("Realtime data updated successfully")
        );

        let client = reqwest::Client::new();
        let body: serde_json::Value = client
            .get(format!("http://{addr}/realtime"))
            .header("X-User-Id", "alice")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let data = &body["realtimeData"];
        assert_eq!(data["isAsleep"], true);
        assert_eq!(data["currentPhase"], "rem");
        assert_eq!(data["heartRate"], 66);
        assert_eq!(data["movements"], 2);
        assert_eq!(data["elapsedTime"], 250);
        assert_eq!(data["estimatedCycles"], 2);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_unknown_user_gets_idle_record() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, None))
            .await
            .expect("Failed to start collector");

        let body: serde_json::Value = reqwest::Client::new()
            .get(format!("http://{addr}/realtime"))
            .header("X-User-Id", "nobody")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["realtimeData"]["isAsleep"], false);
        assert_eq!(body["realtimeData"]["currentPhase"], "awake");
        assert_eq!(body["realtimeData"]["heartRate"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, Some("expected".to_string())))
            .await
            .expect("Failed to start collector");

        let reporter = reporter_for(addr, "wrong", "alice");
        let err = reporter.report(&rem_reading()).await.unwrap_err();
        match err {
            ReportError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("UNAUTHORIZED"));
            }
            other => panic!("Unexpected error: {other:?}"),
        }

        let reporter = reporter_for(addr, "expected", "alice");
        assert!(reporter.report(&rem_reading()).await.is_ok());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_token_is_checked_before_body() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, Some("expected".to_string())))
            .await
            .expect("Failed to start collector");

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/webhook/realtime");

        // No content type and not JSON
        let response = client
            .post(&url)
            .header("Authorization", "Bearer wrong")
            .body("not json at all")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "UNAUTHORIZED");

        // Well-formed JSON with a phase this sensor never sends
        let response = client
            .post(&url)
            .json(&serde_json::json!({ "sleep_phase": "REM" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, Some("expected".to_string())))
            .await
            .expect("Failed to start collector");

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/webhook/realtime"))
            .header("Authorization", "Bearer expected")
            .header("Content-Type", "application/json")
            .body("{ not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_BODY");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_unrecognised_phase_is_stored() {
        let (addr, shutdown_tx) = run(ServerConfig::new(0, None))
            .await
            .expect("Failed to start collector");

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/webhook/realtime"))
            .header("X-User-Id", "bob")
            .json(&serde_json::json!({
                "is_sleeping": true,
                "sleep_phase": "REM",
                "heart_rate": 63,
                "elapsed_minutes": 95
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = client
            .get(format!("http://{addr}/realtime"))
            .header("X-User-Id", "bob")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let data = &body["realtimeData"];
        assert_eq!(data["currentPhase"], "REM");
        assert_eq!(data["heartRate"], 63);
        assert_eq!(data["estimatedCycles"], 1);

        let _ = shutdown_tx.send(());
    }
}
