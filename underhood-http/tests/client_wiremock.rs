use reqwest::StatusCode;
use serde_json::{Value, json};
use underhood_http::{HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&format!("{}/api/", server.uri())).expect("mock base url")
}

#[tokio::test]
async fn post_json_sends_bearer_and_decodes_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pages"))
        .and(header("authorization", "Bearer secret"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .post_json(
            "pages",
            &json!({"title": "@alice"}),
            RequestOpts {
                bearer: Some("secret"),
                ..Default::default()
            },
        )
        .await
        .expect("post succeeds");

    assert_eq!(got["id"], "p1");
}

#[tokio::test]
async fn server_errors_are_retried_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/script"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/script"))
        .respond_with(ResponseTemplate::new(200).set_body_string("const map = {};"))
        .mount(&server)
        .await;

    let text = client_for(&server)
        .with_retries(1)
        .get_text("script", RequestOpts::default())
        .await
        .expect("second attempt succeeds");

    assert_eq!(text, "const map = {};");
}

#[tokio::test]
async fn exhausted_retries_surface_a_transient_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/script"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"message": "upstream down"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_text(
            "script",
            RequestOpts {
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
        .expect_err("502 is an error");

    match &err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(*status, StatusCode::BAD_GATEWAY);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn client_errors_are_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("pages", RequestOpts::default())
        .await
        .expect_err("403 is an error");

    assert!(!err.is_transient());
}

#[tokio::test]
async fn put_text_sends_raw_body_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/script"))
        .and(header("content-type", "application/javascript"))
        .and(body_string("const map = {'a':'b'};"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .put_text(
            "script",
            "application/javascript",
            "const map = {'a':'b'};",
            RequestOpts::default(),
        )
        .await
        .expect("put succeeds");
}

#[tokio::test]
async fn undecodable_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("pages", RequestOpts::default())
        .await
        .expect_err("html is not json");

    assert!(matches!(err, HttpError::Decode(..)));
}

#[tokio::test]
async fn post_json_discard_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pages/p1/blocks"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .post_json_discard(
            "pages/p1/blocks",
            &json!({"index": 0, "block": {"type": "divider"}}),
            RequestOpts::default(),
        )
        .await
        .expect("204 is success");
}

#[tokio::test]
async fn paths_join_onto_the_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pages/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.base().path(), "/api/");
    let got: Value = client
        .get_json("pages/p1", RequestOpts::default())
        .await
        .expect("joined path is served");

    assert_eq!(got["id"], "p1");
}

#[tokio::test]
async fn no_authorization_without_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/script"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    client_for(&server)
        .get_text("script", RequestOpts::default())
        .await
        .expect("get succeeds");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
}
