// End-to-end tests for the simulation endpoint, driven in-process

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use fault_sim::{AppState, SimSettings, router};

fn app() -> Router {
    router(Arc::new(AppState::new(SimSettings::default())))
}

async fn get(app: &Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().uri(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header<'a>(res: &'a Response, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn ok_mode_echoes_supplied_request_id() {
    let app = app();
    let res = get(&app, "/api/sim?mode=ok", &[("x-request-id", "health-1")]).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(&res, "x-request-id"), Some("health-1"));

    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["id"], "health-1");
    assert_eq!(body["mode"], "ok");
}

#[tokio::test]
async fn missing_and_unknown_modes_behave_like_ok() {
    let app = app();
    for uri in ["/api/sim", "/api/sim?mode=meltdown"] {
        let res = get(&app, uri, &[]).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(header(&res, "x-request-id").is_some_and(|id| !id.is_empty()));
    }
}

#[tokio::test]
async fn unknown_mode_body_reports_mode_as_sent() {
    let app = app();
    let res = get(&app, "/api/sim?mode=meltdown", &[]).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["mode"], "meltdown");
}

#[tokio::test]
async fn non_ascii_request_id_is_echoed_unchanged() {
    let app = app();
    let req = Request::builder()
        .uri("/api/sim?mode=ok")
        .header("x-request-id", axum::http::HeaderValue::from_bytes("id-é".as_bytes()).unwrap())
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.headers()["x-request-id"].as_bytes(), "id-é".as_bytes());
}

#[tokio::test(start_paused = true)]
async fn negative_delay_is_treated_as_zero() {
    let app = app();
    let started = tokio::time::Instant::now();
    let res = get(&app, "/api/sim?mode=slow&delayMs=-5", &[]).await;

    assert!(started.elapsed() < Duration::from_millis(100));
    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["delayMs"], 0);
}

#[tokio::test(start_paused = true)]
async fn slow_mode_arrives_after_delay() {
    let app = app();
    let started = tokio::time::Instant::now();
    let res = get(&app, "/api/sim?mode=slow&delayMs=500", &[]).await;

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn delayed_requests_do_not_block_each_other() {
    let app = app();
    let started = tokio::time::Instant::now();

    let (slow, fast) = tokio::join!(
        get(&app, "/api/sim?mode=slow&delayMs=5000", &[]),
        async {
            let res = get(&app, "/api/sim?mode=ok", &[]).await;
            (res, started.elapsed())
        },
    );

    assert_eq!(slow.status(), StatusCode::OK);
    assert_eq!(fast.0.status(), StatusCode::OK);
    assert!(fast.1 < Duration::from_secs(5));
}

#[tokio::test]
async fn error500_uses_status_param() {
    let app = app();
    let res = get(&app, "/api/sim?mode=error500&status=418", &[]).await;

    assert_eq!(res.status().as_u16(), 418);
    assert!(header(&res, "x-request-id").is_some());
    assert_eq!(body_text(res).await, "Simulated error (418)");
}

#[tokio::test]
async fn error503_ignores_status_param() {
    let app = app();
    let res = get(&app, "/api/sim?mode=error503&status=418", &[]).await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(res).await, "Simulated error (503)");
}

#[tokio::test]
async fn corrupt_json_is_labelled_json_but_unparseable() {
    let app = app();
    let res = get(&app, "/api/sim?mode=corruptJson", &[]).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(&res, "content-type"), Some("application/json"));
    let text = body_text(res).await;
    assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
}

#[tokio::test]
async fn reset_mode_surfaces_as_server_error_without_request_id() {
    let app = app();
    let res = get(&app, "/api/sim?mode=reset", &[("x-request-id", "boom")]).await;

    assert!(res.status().is_server_error());
    assert!(header(&res, "x-request-id").is_none());
}

#[tokio::test]
async fn ratelimit_allows_then_denies_same_client() {
    let app = app();
    let uri = "/api/sim?mode=ratelimit&limit=2&windowMs=60000";
    let client = [("x-forwarded-for", "198.51.100.4")];

    let first = get(&app, uri, &client).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-ratelimit-limit"), Some("2"));
    assert_eq!(header(&first, "x-ratelimit-remaining"), Some("1"));
    assert!(header(&first, "retry-after").is_none());

    let second = get(&app, uri, &client).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-ratelimit-remaining"), Some("0"));

    let third = get(&app, uri, &client).await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry: i64 = header(&third, "retry-after").unwrap().parse().unwrap();
    assert!(retry > 0 && retry <= 60);
    let reset: i64 = header(&third, "x-ratelimit-reset").unwrap().parse().unwrap();
    assert!(reset >= chrono::Utc::now().timestamp());
    assert_eq!(body_text(third).await, "Too Many Requests");

    // a different client has its own window
    let other = get(&app, uri, &[("x-real-ip", "198.51.100.5")]).await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ratelimit_calls_are_each_counted_once() {
    const N: usize = 20;
    let app = app();
    let uri = format!("/api/sim?mode=ratelimit&limit={N}&windowMs=60000");

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                let res = get(&app, &uri, &[("x-forwarded-for", "192.0.2.1")]).await;
                assert_eq!(res.status(), StatusCode::OK);
                header(&res, "x-ratelimit-remaining")
                    .unwrap()
                    .parse::<usize>()
                    .unwrap()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        assert!(seen.insert(handle.await.unwrap()));
    }
    assert_eq!(seen, (0..N).collect::<HashSet<_>>());
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = app();
    get(&app, "/api/sim?mode=ok", &[]).await;

    let health = get(&app, "/health", &[]).await;
    assert_eq!(health.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(health).await).unwrap();
    assert_eq!(body["status"], "healthy");

    let metrics = get(&app, "/metrics", &[]).await;
    assert_eq!(metrics.status(), StatusCode::OK);
    assert!(body_text(metrics).await.contains("sim_requests_total"));
}
