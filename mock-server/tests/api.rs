use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Capture};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.to_string())
        .unwrap()
}

// --- redirect ---

#[tokio::test]
async fn redirect_answers_requested_status_and_location() {
    let resp = app()
        .oneshot(request("GET", "/redirect?status=301&location=/echo", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers()[http::header::LOCATION], "/echo");
}

#[tokio::test]
async fn redirect_accepts_post_with_body() {
    let resp = app()
        .oneshot(request("POST", "/redirect?status=307&location=/echo", "abc"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn redirect_without_location_omits_header() {
    let resp = app()
        .oneshot(request("GET", "/redirect?status=302", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(resp.headers().get(http::header::LOCATION).is_none());
}

#[tokio::test]
async fn redirect_with_absolute_encoded_location() {
    let resp = app()
        .oneshot(request(
            "GET",
            "/redirect?status=308&location=http%3A%2F%2Fanotherhost.com%3A8080%2Fb",
            "",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(
        resp.headers()[http::header::LOCATION],
        "http://anotherhost.com:8080/b"
    );
}

#[tokio::test]
async fn redirect_missing_status_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/redirect?location=/echo", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- loop ---

#[tokio::test]
async fn loop_points_a_and_b_at_each_other() {
    let resp = app().oneshot(request("GET", "/loop/a", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers()[http::header::LOCATION], "/loop/b");

    let resp = app().oneshot(request("GET", "/loop/b", "")).await.unwrap();
    assert_eq!(resp.headers()[http::header::LOCATION], "/loop/a");
}

// --- echo / get-only ---

#[tokio::test]
async fn echo_returns_what_it_received() {
    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .header("Authorization", "the-key")
        .header("content-length", "3")
        .body("abc".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let capture: Capture = body_json(resp).await;
    assert_eq!(capture.method, "POST");
    assert_eq!(capture.path, "/echo");
    assert_eq!(capture.body, "abc");
    assert_eq!(capture.header("authorization"), Some("the-key"));
}

#[tokio::test]
async fn get_only_serves_def() {
    let resp = app().oneshot(request("GET", "/get-only", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "def");
}

#[tokio::test]
async fn get_only_rejects_post() {
    let resp = app()
        .oneshot(request("POST", "/get-only", "abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- captures ---

#[tokio::test]
async fn capture_not_found() {
    let resp = app()
        .oneshot(request(
            "GET",
            "/captures/00000000-0000-0000-0000-000000000000",
            "",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capture_bad_uuid_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/captures/not-a-uuid", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn captures_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // redirect hop, then the echo target
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("POST", "/redirect?status=307&location=/echo", "abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("POST", "/echo", "abc"))
        .await
        .unwrap();
    let echoed: Capture = body_json(resp).await;

    // list in arrival order
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/captures", ""))
        .await
        .unwrap();
    let captures: Vec<Capture> = body_json(resp).await;
    assert_eq!(captures.len(), 2);
    assert_eq!(captures[0].path, "/redirect");
    assert_eq!(captures[1].id, echoed.id);

    // fetch by id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/captures/{}", echoed.id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Capture = body_json(resp).await;
    assert_eq!(fetched.body, "abc");

    // clear
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", "/captures", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/captures", ""))
        .await
        .unwrap();
    let captures: Vec<Capture> = body_json(resp).await;
    assert!(captures.is_empty());
}
