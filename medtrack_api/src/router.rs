//! HTTP routing table.
//!
//! | Method                  | Path                              |
//! |-------------------------|-----------------------------------|
//! | GET, POST               | /medications                      |
//! | GET, PUT, PATCH, DELETE | /medications/{id}                 |
//! | GET                     | /medications/{id}/info            |
//! | GET                     | /medications/{id}/expected-doses  |
//! | GET                     | /medications/{id}/adherence       |
//! | GET, POST               | /logs                             |
//! | GET                     | /logs/filter                      |
//! | GET, PUT, PATCH, DELETE | /logs/{id}                        |
//! | GET, POST               | /notes                            |
//! | GET, DELETE             | /notes/{id} (PUT, PATCH → 405)    |

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::endpoints::{logs, medications, notes};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/medications",
            get(medications::list).post(medications::create),
        )
        .route(
            "/medications/{id}",
            get(medications::retrieve)
                .put(medications::update)
                .patch(medications::partial_update)
                .delete(medications::destroy),
        )
        .route("/medications/{id}/info", get(medications::info))
        .route(
            "/medications/{id}/expected-doses",
            get(medications::expected_doses),
        )
        .route("/medications/{id}/adherence", get(medications::adherence))
        .route("/logs", get(logs::list).post(logs::create))
        .route("/logs/filter", get(logs::filter))
        .route(
            "/logs/{id}",
            get(logs::retrieve)
                .put(logs::update)
                .patch(logs::partial_update)
                .delete(logs::destroy),
        )
        .route("/notes", get(notes::list).post(notes::create))
        .route(
            "/notes/{id}",
            get(notes::retrieve)
                .delete(notes::destroy)
                .put(notes::reject_update)
                .patch(notes::reject_update),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use medtrack_core::{
        DoseLogDraft, DrugInfo, DrugInfoSource, Error, JsonStore, MedicationDraft, RecordStore,
        Result,
    };

    use crate::query::{DATES_INVALID, DAYS_INVALID, DAYS_REQUIRED};

    /// Drug source that answers from a fixed function, never the network.
    struct StubSource(fn(&str) -> Result<DrugInfo>);

    #[async_trait]
    impl DrugInfoSource for StubSource {
        async fn get_drug_info(&self, name: &str) -> Result<DrugInfo> {
            (self.0)(name)
        }
    }

    fn found(name: &str) -> Result<DrugInfo> {
        Ok(DrugInfo {
            name: Some(name.to_uppercase()),
            manufacturer: "Bayer".into(),
            warnings: vec!["Reye's syndrome".into()],
            purpose: vec!["Pain reliever".into()],
        })
    }

    fn med(name: &str, dosage_mg: i64, prescribed_per_day: i64) -> MedicationDraft {
        MedicationDraft {
            name: name.into(),
            dosage_mg,
            prescribed_per_day,
        }
    }

    fn state_with(store: JsonStore, source: fn(&str) -> Result<DrugInfo>) -> AppState {
        AppState::new(store, Arc::new(StubSource(source)))
    }

    /// Two Aspirin records, mirroring a freshly seeded database.
    fn seeded() -> AppState {
        let mut store = JsonStore::in_memory();
        store.create_medication(med("Aspirin", 100, 2)).unwrap();
        store.create_medication(med("Aspirin", 100, 2)).unwrap();
        state_with(store, found)
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    // ── Medications ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn list_medications() {
        let state = seeded();
        let (status, json) = send(&state, "GET", "/medications", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["name"], "Aspirin");
        assert_eq!(json[0]["dosage_mg"], 100);
    }

    #[tokio::test]
    async fn create_medication() {
        let state = seeded();
        let (status, json) = send(
            &state,
            "POST",
            "/medications",
            Some(json!({"name": "Ibuprofen", "dosage_mg": 200, "prescribed_per_day": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["name"], "Ibuprofen");
        assert_eq!(json["id"], 3);
        assert_eq!(state.read_store().unwrap().medications().len(), 3);
    }

    #[tokio::test]
    async fn create_medication_missing_field() {
        let state = seeded();
        let (status, json) = send(
            &state,
            "POST",
            "/medications",
            Some(json!({"dosage_mg": 50, "prescribed_per_day": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("name").is_some());
    }

    #[tokio::test]
    async fn create_medication_malformed_json() {
        let state = seeded();
        let request = Request::builder()
            .method("POST")
            .uri("/medications")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retrieve_medication() {
        let state = seeded();
        let (status, json) = send(&state, "GET", "/medications/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Aspirin");

        let (status, _) = send(&state, "GET", "/medications/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_medication() {
        let state = seeded();
        let (status, json) =
            send(&state, "PATCH", "/medications/2", Some(json!({"dosage_mg": 81}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["dosage_mg"], 81);
        assert_eq!(state.read_store().unwrap().medication(2).unwrap().dosage_mg, 81);
    }

    #[tokio::test]
    async fn put_medication_requires_all_fields() {
        let state = seeded();
        let (status, json) =
            send(&state, "PUT", "/medications/2", Some(json!({"dosage_mg": 81}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("name").is_some());

        let (status, json) = send(
            &state,
            "PUT",
            "/medications/2",
            Some(json!({"name": "Aspirin EC", "dosage_mg": 81, "prescribed_per_day": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Aspirin EC");
    }

    #[tokio::test]
    async fn delete_medication() {
        let state = seeded();
        let (status, _) = send(&state, "DELETE", "/medications/2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.read_store().unwrap().medications().len(), 1);

        let (status, _) = send(&state, "DELETE", "/medications/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── External info ────────────────────────────────────────────────────

    #[tokio::test]
    async fn external_info_success() {
        let state = seeded();
        let (status, json) = send(&state, "GET", "/medications/1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "ASPIRIN");
        assert_eq!(json["manufacturer"], "Bayer");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn external_info_upstream_failure_is_bad_gateway() {
        let mut store = JsonStore::in_memory();
        store.create_medication(med("Aspirin", 100, 2)).unwrap();
        let state = state_with(store, |_| Err(Error::UpstreamStatus(500)));

        let (status, json) = send(&state, "GET", "/medications/1/info", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "OpenFDA API error: 500");
    }

    #[tokio::test]
    async fn external_info_unknown_medication() {
        let state = seeded();
        let (status, _) = send(&state, "GET", "/medications/999/info", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── Expected doses ───────────────────────────────────────────────────

    fn antibiotics() -> AppState {
        let mut store = JsonStore::in_memory();
        store.create_medication(med("Antibiotics", 500, 3)).unwrap();
        store.create_medication(med("BadConfigMed", 100, 0)).unwrap();
        state_with(store, found)
    }

    #[tokio::test]
    async fn expected_doses_valid_request() {
        let state = antibiotics();
        let (status, json) =
            send(&state, "GET", "/medications/1/expected-doses?days=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"medication_id": 1, "days": 10, "expected_doses": 30})
        );
    }

    #[tokio::test]
    async fn expected_doses_bad_parameter() {
        let state = antibiotics();

        let (status, json) = send(&state, "GET", "/medications/1/expected-doses", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], DAYS_REQUIRED);

        for days in ["ten", "-5", "0"] {
            let uri = format!("/medications/1/expected-doses?days={}", days);
            let (status, json) = send(&state, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "days={}", days);
            assert_eq!(json["error"], DAYS_INVALID);
        }
    }

    #[tokio::test]
    async fn expected_doses_misconfigured_medication() {
        let state = antibiotics();
        let (status, json) =
            send(&state, "GET", "/medications/2/expected-doses?days=5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("prescribed_per_day"));
    }

    #[tokio::test]
    async fn expected_doses_overflow_is_bad_request() {
        let mut store = JsonStore::in_memory();
        store
            .create_medication(med("Megadose", 1, 9_000_000_000_000_000_000))
            .unwrap();
        let state = state_with(store, found);

        let (status, json) =
            send(&state, "GET", "/medications/1/expected-doses?days=2", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("overflows"));

        let (status, _) = send(
            &state,
            "GET",
            "/medications/1/adherence?start=2025-01-01&end=2025-01-02",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn expected_doses_checks_days_before_lookup() {
        let state = antibiotics();
        let (status, _) = send(&state, "GET", "/medications/999/expected-doses", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&state, "GET", "/medications/999/expected-doses?days=2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── Adherence ────────────────────────────────────────────────────────

    fn with_doses() -> AppState {
        let mut store = JsonStore::in_memory();
        let aspirin = store.create_medication(med("Aspirin", 100, 2)).unwrap();
        let midnight_24 = Utc.with_ymd_and_hms(2025, 11, 24, 0, 0, 0).unwrap();
        for (offset, was_taken) in [(-30, true), (23, true), (30, false)] {
            store
                .create_log(DoseLogDraft {
                    medication: aspirin.id,
                    taken_at: midnight_24 + Duration::hours(offset),
                    was_taken,
                })
                .unwrap();
        }
        state_with(store, found)
    }

    #[tokio::test]
    async fn adherence_over_logged_events() {
        let state = with_doses();
        let (status, json) = send(&state, "GET", "/medications/1/adherence", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["medication_id"], 1);
        assert_eq!(json["adherence_rate"], 66.67);
        assert!(json.get("start").is_none());
    }

    #[tokio::test]
    async fn adherence_over_period() {
        let state = with_doses();
        let (status, json) = send(
            &state,
            "GET",
            "/medications/1/adherence?start=2025-11-24&end=2025-11-26",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["adherence_rate"], 16.67);
        assert_eq!(json["start"], "2025-11-24");
    }

    #[tokio::test]
    async fn adherence_rejects_bad_ranges() {
        let state = with_doses();
        let (status, _) = send(
            &state,
            "GET",
            "/medications/1/adherence?start=2020-05-15&end=2020-01-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            send(&state, "GET", "/medications/1/adherence?start=2020-05-15", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], DATES_INVALID);
    }

    // ── Dose logs ────────────────────────────────────────────────────────

    /// One placebo with doses a day before `now`, at `now` and a day after.
    fn placebo_logs(now: DateTime<Utc>) -> (AppState, [u64; 3]) {
        let mut store = JsonStore::in_memory();
        let placebo = store.create_medication(med("Placebo", 0, 1)).unwrap();
        let ids = [now - Duration::days(1), now, now + Duration::days(1)].map(|taken_at| {
            store
                .create_log(DoseLogDraft {
                    medication: placebo.id,
                    taken_at,
                    was_taken: true,
                })
                .unwrap()
                .id
        });
        (state_with(store, found), ids)
    }

    #[tokio::test]
    async fn create_dose_log() {
        let (state, _) = placebo_logs(Utc::now());
        let (status, json) = send(
            &state,
            "POST",
            "/logs",
            Some(json!({"medication": 1, "taken_at": "2025-11-20T10:00:00Z", "was_taken": false})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["was_taken"], false);
        assert_eq!(state.read_store().unwrap().logs().len(), 4);
    }

    #[tokio::test]
    async fn create_dose_log_defaults() {
        let (state, _) = placebo_logs(Utc::now());
        let before = Utc::now();
        let (status, json) = send(&state, "POST", "/logs", Some(json!({"medication": 1}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["was_taken"], true);

        let id = json["id"].as_u64().unwrap();
        let log = state.read_store().unwrap().log(id).unwrap();
        assert!(log.taken_at >= before);
    }

    #[tokio::test]
    async fn create_dose_log_unknown_medication() {
        let (state, _) = placebo_logs(Utc::now());
        let (status, json) = send(
            &state,
            "POST",
            "/logs",
            Some(json!({"medication": 9999, "taken_at": "2025-11-20T10:00:00Z", "was_taken": true})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("medication").is_some());
    }

    #[tokio::test]
    async fn filter_logs_by_date() {
        let now = Utc::now();
        let (state, [yesterday, today, tomorrow]) = placebo_logs(now);
        let start = (now - Duration::days(1)).format("%Y-%m-%d");
        let end = now.format("%Y-%m-%d");

        let uri = format!("/logs/filter?start={}&end={}", start, end);
        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|log| log["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![yesterday, today]);
        assert!(!ids.contains(&tomorrow));
    }

    #[tokio::test]
    async fn filter_logs_invalid_date() {
        let (state, _) = placebo_logs(Utc::now());
        let (status, json) = send(
            &state,
            "GET",
            "/logs/filter?start=2025/11/01&end=2025-11-07",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], DATES_INVALID);

        let (status, _) = send(&state, "GET", "/logs/filter", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_delete_dose_log() {
        let (state, [_, today, _]) = placebo_logs(Utc::now());
        let uri = format!("/logs/{}", today);

        let (status, json) = send(&state, "PATCH", &uri, Some(json!({"was_taken": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["was_taken"], false);

        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── Notes ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn notes_create_read_delete() {
        let state = seeded();
        let (status, json) = send(
            &state,
            "POST",
            "/notes",
            Some(json!({"medication": 1, "text": "Take with food", "date": "2025-11-20"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["text"], "Take with food");

        let (status, json) = send(&state, "GET", "/notes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, _) = send(&state, "DELETE", "/notes/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "GET", "/notes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notes_refuse_updates() {
        let state = seeded();
        send(
            &state,
            "POST",
            "/notes",
            Some(json!({"medication": 1, "text": "Take with food"})),
        )
        .await;

        for method in ["PUT", "PATCH"] {
            for uri in ["/notes/1", "/notes/999"] {
                let (status, _) =
                    send(&state, method, uri, Some(json!({"text": "changed"}))).await;
                assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
            }
        }
        assert_eq!(
            state.read_store().unwrap().note(1).unwrap().text,
            "Take with food"
        );
    }
}
