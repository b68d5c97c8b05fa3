//! Integration tests for GET / POST / PUT against a mocked JSSResource API.
//!
//! These tests verify that the client builds requests the JSS accepts
//! (paths, Accept and Content-Type headers, basic auth, XML bodies) and
//! that responses are classified into documents or typed errors.

use jss_client::classify::{Outcome, RequestOptions};
use jss_client::client::JssClient;
use jss_client::config::ClientConfig;
use jss_client::extract::StreamingScannerExtractor;
use jss_client::{JssError, Value};
use wiremock::matchers::{any, basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: creates a client with credentials pointed at the wiremock server.
fn mock_client(server: &MockServer) -> JssClient {
    let config = ClientConfig::new("mock").with_credentials("api", "s3cret");
    JssClient::with_base_url(&config, &format!("{}/JSSResource", server.uri())).unwrap()
}

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml;charset=UTF-8")
}

fn status_page(status: u16, title: &str, detail: &str) -> ResponseTemplate {
    let html = format!(
        "<html>\n<head>\n   <title>Status page</title>\n</head>\n<body>\n\
         <p style=\"font-size: 1.2em;font-weight: bold;\">{title}</p>\n\
         <p>{detail}</p>\n\
         <p>You can get technical details <a href=\"http://www.w3.org/\">here</a>.<br>\n\
         Please continue your visit at our <a href=\"/\">home page</a>.\n</p>\n\
         </body>\n</html>\n"
    );
    ResponseTemplate::new(status).set_body_raw(html, "text/html;charset=UTF-8")
}

fn policy(name: &str) -> Value {
    [(
        "policy",
        [("general", [("name", Value::from(name))].into_iter().collect::<Value>())]
            .into_iter()
            .collect::<Value>(),
    )]
    .into_iter()
    .collect()
}

// ── GET ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_decodes_xml_document() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/policies/id/1"))
        .and(header("accept", "application/xml"))
        .and(basic_auth("api", "s3cret"))
        .respond_with(xml(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <policy><general><id>1</id><name>Firefox</name><enabled>true</enabled></general>\
             <scope><computers><computer><id>7</id></computer><computer><id>9</id></computer></computers></scope>\
             </policy>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .get("policies/id/1", &RequestOptions::default())
        .await
        .unwrap()
        .into_document()
        .expect("GET 200 should decode a document");

    assert_eq!(
        doc.pointer(["policy", "general", "name"]),
        Some(&Value::from("Firefox"))
    );
    assert_eq!(
        doc.pointer(["policy", "general", "enabled"]),
        Some(&Value::from("true")),
        "scalars are never coerced"
    );
    let computers = doc
        .pointer(["policy", "scope", "computers", "computer"])
        .and_then(Value::as_sequence)
        .expect("two computers collapse into a sequence");
    assert_eq!(computers.len(), 2);
}

#[tokio::test]
async fn get_single_child_is_not_a_sequence() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/categories"))
        .respond_with(xml(
            "<categories><size>1</size><category><id>3</id><name>Apps</name></category></categories>",
        ))
        .mount(&server)
        .await;

    let doc = client.get_document("categories").await.unwrap();
    let category = doc.pointer(["categories", "category"]).unwrap();
    assert!(category.as_mapping().is_some(), "single child stays a mapping");
    assert_eq!(category.as_list().len(), 1);
}

#[tokio::test]
async fn get_json_sends_accept_header_and_skips_xml_decoder() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/computers/id/7"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "computer": {"general": {"id": 7, "name": "lab-01"}}
        })))
        .mount(&server)
        .await;

    let json = client
        .get("computers/id/7", &RequestOptions::json())
        .await
        .unwrap()
        .into_json()
        .expect("JSON format should yield Outcome::Json");
    assert_eq!(json["computer"]["general"]["id"], 7);
}

#[tokio::test]
async fn get_404_returns_error_record() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/policies/id/999"))
        .respond_with(status_page(
            404,
            "Not Found",
            "The server has not found anything matching the request URI",
        ))
        .mount(&server)
        .await;

    let err = client
        .get("policies/id/999", &RequestOptions::default())
        .await
        .unwrap_err();
    let record = err.record().expect("404 should produce an ErrorRecord");
    assert_eq!(record.status_code, 404);
    assert_eq!(record.request_method, "GET");
    assert_eq!(
        record.request_url,
        format!("{}/JSSResource/policies/id/999", server.uri())
    );
    assert_eq!(
        record.message,
        "Not Found: The server has not found anything matching the request URI"
    );
    assert_eq!(
        err.to_string(),
        format!(
            "404 GET - {}/JSSResource/policies/id/999: Not Found: \
             The server has not found anything matching the request URI",
            server.uri()
        )
    );
}

#[tokio::test]
async fn scanner_extractor_builds_same_message() {
    let server = MockServer::start().await;
    let client = mock_client(&server).with_extractor(Box::new(StreamingScannerExtractor));

    Mock::given(method("GET"))
        .and(path("/JSSResource/accounts"))
        .respond_with(status_page(
            401,
            "Unauthorized",
            "The request requires user authentication",
        ))
        .mount(&server)
        .await;

    let err = client
        .get("accounts", &RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.record().map(|r| r.message.as_str()),
        Some("Unauthorized: The request requires user authentication")
    );
}

#[tokio::test]
async fn get_raw_returns_failed_response_untouched() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/policies/id/999"))
        .respond_with(status_page(404, "Not Found", "nothing here"))
        .mount(&server)
        .await;

    let response = client
        .get("policies/id/999", &RequestOptions::raw())
        .await
        .expect("raw mode must not raise on 404")
        .into_raw()
        .expect("raw mode should return the response");
    assert_eq!(response.status, 404);
    assert_eq!(response.method, "GET");
    assert!(response.body.contains("<p>nothing here</p>"));
    assert_eq!(
        response.content_type.as_deref(),
        Some("text/html;charset=UTF-8")
    );
}

#[tokio::test]
async fn get_malformed_success_body_is_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/JSSResource/packages"))
        .respond_with(xml("<packages><package><id>1</id></packages>"))
        .mount(&server)
        .await;

    let err = client.get_document("packages").await.unwrap_err();
    assert!(matches!(err, JssError::MalformedDocument(_)), "{err}");
}

// ── POST / PUT ─────────────────────────────────────────────────────────

#[tokio::test]
async fn post_sends_encoded_xml_and_decodes_201() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/JSSResource/policies/id/0"))
        .and(header("content-type", "application/xml"))
        .and(body_string("<policy><general><name>R&amp;D Tools</name></general></policy>"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_raw("<policy><id>42</id></policy>", "text/xml"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .post("policies/id/0", &policy("R&D Tools"), &RequestOptions::default())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    assert_eq!(created.pointer(["policy", "id"]), Some(&Value::from("42")));
}

#[tokio::test]
async fn post_200_is_not_success() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/JSSResource/policies/id/0"))
        .respond_with(xml("<policy><id>42</id></policy>"))
        .mount(&server)
        .await;

    let err = client
        .post("policies/id/0", &policy("x"), &RequestOptions::default())
        .await
        .unwrap_err();
    let record = err.record().unwrap();
    assert_eq!(record.status_code, 200);
    assert_eq!(record.request_method, "POST");
    assert_eq!(record.message, "failed");
}

#[tokio::test]
async fn put_conflict_carries_page_message() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("PUT"))
        .and(path("/JSSResource/policies/id/5"))
        .respond_with(status_page(409, "Conflict", "Error: Duplicate name"))
        .mount(&server)
        .await;

    let err = client
        .put("policies/id/5", &policy("Chrome"), &RequestOptions::default())
        .await
        .unwrap_err();
    let record = err.record().unwrap();
    assert_eq!(record.status_code, 409);
    assert_eq!(record.request_method, "PUT");
    assert_eq!(record.message, "Conflict: Error: Duplicate name");
}

#[tokio::test]
async fn put_raw_returns_response_without_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("PUT"))
        .and(path("/JSSResource/policies/id/5"))
        .respond_with(status_page(409, "Conflict", "Error: Duplicate name"))
        .mount(&server)
        .await;

    let out = client
        .put("policies/id/5", &policy("Chrome"), &RequestOptions::raw())
        .await
        .unwrap();
    let response = match out {
        Outcome::Raw(response) => response,
        other => panic!("expected raw outcome, got {other:?}"),
    };
    assert_eq!(response.status, 409);
    assert_eq!(response.method, "PUT");
}

#[tokio::test]
async fn unsupported_shape_sends_nothing() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let bare = Value::Sequence(vec!["a".into(), "b".into()]);
    let err = client
        .post("policies/id/0", &bare, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::UnsupportedShape(_)), "{err}");
}

// ── Transport ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // Port 1 is reserved and nothing listens there.
    let client = JssClient::with_base_url(&ClientConfig::new("x"), "http://127.0.0.1:1/JSSResource")
        .unwrap();
    let err = client
        .get("policies", &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::Network(_)), "{err}");
}
