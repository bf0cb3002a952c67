use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};

use crate::{error::AppError, models::trip::Trip, state::AppState, view::TripRow};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trip_list))
        .route("/trips.json", get(trip_snapshot))
        .route("/trips/:id/complete", post(complete_trip))
        .route("/refresh", post(refresh))
}

#[derive(Template)]
#[template(path = "trips/list.html")]
struct TripListTemplate {
    api_base: String,
    rows: Vec<TripRow>,
}

async fn trip_list(State(state): State<AppState>) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(TripListTemplate {
        api_base: state.config.api_base.to_string(),
        rows: state.trips.rows(),
    })
}

async fn trip_snapshot(State(state): State<AppState>) -> Json<Vec<Trip>> {
    Json(state.trips.snapshot())
}

async fn complete_trip(
    State(state): State<AppState>,
    Path(trip_key): Path<String>,
) -> Result<Redirect, AppError> {
    state.trips.complete(&trip_key).await?;
    Ok(Redirect::to("/"))
}

async fn refresh(State(state): State<AppState>) -> Redirect {
    state.trips.mount();
    state.trips.settled().await;
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    use crate::{
        config::{parse_api_base, AppConfig},
        models::trip::Identifier,
        routes::create_router,
        services::trip_api::TripApi,
        view::TripListView,
    };

    use super::*;

    #[derive(Clone, Copy)]
    enum UpdateOutcome {
        Accepted,
        Internal,
        MalformedJson,
        Unreachable,
    }

    struct StaticApi {
        trips: Value,
        fetches: AtomicUsize,
        outcome: UpdateOutcome,
    }

    #[async_trait]
    impl TripApi for StaticApi {
        async fn fetch_trips(&self) -> Result<Vec<Trip>, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(self.trips.clone())?)
        }

        async fn update_trip_status(
            &self,
            _trip_id: &Identifier,
            _status: &str,
        ) -> Result<Option<Value>, AppError> {
            match self.outcome {
                UpdateOutcome::Accepted => Ok(None),
                UpdateOutcome::Internal => Err(AppError::Other(anyhow!("upstream unavailable"))),
                UpdateOutcome::MalformedJson => {
                    Ok(Some(serde_json::from_str::<Value>("{\"todo\": ")?))
                }
                UpdateOutcome::Unreachable => {
                    // Bind and drop a listener so nothing answers on that port.
                    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
                    reqwest::get(format!("http://{addr}/trips/1/status")).await?;
                    Ok(None)
                }
            }
        }
    }

    async fn app(trips: Value, outcome: UpdateOutcome) -> (Router, Arc<StaticApi>) {
        let api = Arc::new(StaticApi {
            trips,
            fetches: AtomicUsize::new(0),
            outcome,
        });
        let view = TripListView::new(api.clone());
        view.mount();
        view.settled().await;
        let config = AppConfig {
            api_base: parse_api_base("http://localhost:8000").unwrap(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            static_root: PathBuf::from("static"),
        };
        (create_router(AppState::new(config, view)), api)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn list_page_shows_each_trip() {
        let (app, _) = app(
            json!([
                {"id": 1, "passenger_id": "p1", "driver_id": null, "status": "pending"},
                {"id": 2, "passenger_id": "p2", "driver_id": "d9", "status": "completed"}
            ]),
            UpdateOutcome::Accepted,
        )
        .await;

        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;

        assert!(html.contains(
            r#"<strong>p1</strong> → unassigned (<em class="status">pending</em>)"#
        ));
        assert!(html.contains(r#"<strong>p2</strong> → d9 (<em class="status">completed</em>)"#));
        assert_eq!(html.matches("/complete").count(), 1);
        assert!(html.contains(r#"action="/trips/1/complete""#));
    }

    #[tokio::test]
    async fn completing_redirects_back_to_the_patched_list() {
        let (app, _) = app(
            json!([{"id": 1, "passenger_id": "p1", "driver_id": null, "status": "pending"}]),
            UpdateOutcome::Accepted,
        )
        .await;

        let response = app.clone().oneshot(post_request("/trips/1/complete")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let html = body_text(app.oneshot(get_request("/")).await.unwrap()).await;
        assert!(html.contains(
            r#"<strong>p1</strong> → unassigned (<em class="status">completed</em>)"#
        ));
        assert!(!html.contains("/complete"));
    }

    #[tokio::test]
    async fn failed_completion_is_reported_and_state_kept() {
        let (app, _) = app(
            json!([{"id": 1, "passenger_id": "p1", "status": "pending"}]),
            UpdateOutcome::Internal,
        )
        .await;

        let response = app.clone().oneshot(post_request("/trips/1/complete")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let snapshot = body_text(app.oneshot(get_request("/trips.json")).await.unwrap()).await;
        let trips: Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(trips[0]["status"], "pending");
    }

    async fn completion_status(outcome: UpdateOutcome) -> (StatusCode, String) {
        let (app, _) = app(
            json!([{"id": 1, "passenger_id": "p1", "status": "pending"}]),
            outcome,
        )
        .await;

        let response = app.clone().oneshot(post_request("/trips/1/complete")).await.unwrap();
        let status = response.status();

        let snapshot = body_text(app.oneshot(get_request("/trips.json")).await.unwrap()).await;
        let trips: Value = serde_json::from_str(&snapshot).unwrap();
        (status, trips[0]["status"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn unreachable_trip_api_is_a_bad_gateway() {
        let (status, trip_status) = completion_status(UpdateOutcome::Unreachable).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(trip_status, "pending");
    }

    #[tokio::test]
    async fn malformed_update_response_is_a_bad_gateway() {
        let (status, trip_status) = completion_status(UpdateOutcome::MalformedJson).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(trip_status, "pending");
    }

    #[tokio::test]
    async fn completing_an_unknown_trip_is_not_found() {
        let (app, _) = app(json!([]), UpdateOutcome::Accepted).await;

        let response = app.oneshot(post_request("/trips/7/complete")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_remounts_with_a_single_fetch() {
        let (app, api) = app(
            json!([{"id": "a", "passenger_id": "p1", "status": "pending"}]),
            UpdateOutcome::Accepted,
        )
        .await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);

        let response = app.oneshot(post_request("/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    }
}
