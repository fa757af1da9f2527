use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, MockConfig, DEFAULT_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn form_request(uri: &str, params: &[(&str, &str)]) -> Request<String> {
    let body = serde_urlencoded::to_string(params).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::HOST, "mock.test")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .unwrap()
}

/// POST with the default token prepended.
async fn call(app: &Router, uri: &str, params: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut all = vec![("api_token", DEFAULT_TOKEN)];
    all.extend_from_slice(params);
    let resp = app.clone().oneshot(form_request(uri, &all)).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

async fn call_ok(app: &Router, uri: &str, params: &[(&str, &str)]) -> Value {
    let (status, body) = call(app, uri, params).await;
    assert_eq!(status, StatusCode::OK, "{uri}: {body}");
    assert_eq!(body["response"]["status"], "success", "{uri}: {body}");
    body
}

async fn project_with_language(app: &Router) -> String {
    let body = call_ok(app, "/projects/add", &[("name", "Website")]).await;
    let id = body["result"]["project"]["id"].to_string();
    call_ok(app, "/languages/add", &[("id", &id), ("language", "fr")]).await;
    id
}

// --- auth ---

#[tokio::test]
async fn invalid_token_fails_inside_200() {
    let app = app();
    let resp = app
        .oneshot(form_request("/projects/list", &[("api_token", "wrong")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["response"]["status"], "fail");
    assert_eq!(body["response"]["code"], "4011");
    assert_eq!(body["response"]["message"], "Invalid API Token");
}

#[tokio::test]
async fn read_only_token_cannot_write() {
    let app = app_with(MockConfig {
        api_token: "rw".to_string(),
        read_only_token: Some("ro".to_string()),
    });
    let resp = app
        .clone()
        .oneshot(form_request("/projects/list", &[("api_token", "ro")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(form_request("/projects/add", &[("api_token", "ro"), ("name", "X")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["response"]["code"], "4030");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app()
        .oneshot(form_request("/projects/frobnicate", &[("api_token", DEFAULT_TOKEN)]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- projects ---

#[tokio::test]
async fn list_projects_empty() {
    let app = app();
    let body = call_ok(&app, "/projects/list", &[]).await;
    assert_eq!(body["result"]["projects"], serde_json::json!([]));
}

#[tokio::test]
async fn create_then_view_project() {
    let app = app();
    let created = call_ok(
        &app,
        "/projects/add",
        &[("name", "Website"), ("description", "Marketing site")],
    )
    .await;
    let project = &created["result"]["project"];
    assert_eq!(project["name"], "Website");
    assert_eq!(project["public"], 0);
    let id = project["id"].to_string();

    let viewed = call_ok(&app, "/projects/view", &[("id", &id)]).await;
    assert_eq!(viewed["result"]["project"]["description"], "Marketing site");
    assert_eq!(viewed["result"]["project"]["terms"], 0);
}

#[tokio::test]
async fn form_values_with_reserved_characters_survive() {
    let app = app();
    let created = call_ok(&app, "/projects/add", &[("name", "R&D = fun+games")]).await;
    assert_eq!(created["result"]["project"]["name"], "R&D = fun+games");
}

#[tokio::test]
async fn view_unknown_project_fails() {
    let (status, body) = call(&app(), "/projects/view", &[("id", "42")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["status"], "fail");
    assert_eq!(body["response"]["code"], "4012");
}

#[tokio::test]
async fn reference_language_must_be_in_project() {
    let app = app();
    let id = project_with_language(&app).await;
    let (_, body) = call(&app, "/projects/update", &[("id", &id), ("reference_language", "de")]).await;
    assert_eq!(body["response"]["status"], "fail");

    let body = call_ok(&app, "/projects/update", &[("id", &id), ("reference_language", "fr")]).await;
    assert_eq!(body["result"]["project"]["reference_language"], "fr");
}

// --- languages ---

#[tokio::test]
async fn language_percentage_follows_translations() {
    let app = app();
    let id = project_with_language(&app).await;
    call_ok(
        &app,
        "/terms/add",
        &[("id", &id), ("data", r#"[{"term":"Hello"},{"term":"Bye"}]"#)],
    )
    .await;
    let data = r#"[{"term":"Hello","context":"","translation":{"content":"Bonjour","fuzzy":0}}]"#;
    let body = call_ok(&app, "/languages/update", &[("id", &id), ("language", "fr"), ("data", data)]).await;
    assert_eq!(body["result"]["translations"]["added"], 1);

    let body = call_ok(&app, "/languages/list", &[("id", &id)]).await;
    let fr = &body["result"]["languages"][0];
    assert_eq!(fr["code"], "fr");
    assert_eq!(fr["name"], "French");
    assert_eq!(fr["translations"], 1);
    assert_eq!(fr["percentage"], 50.0);
}

#[tokio::test]
async fn adding_unknown_language_fails() {
    let app = app();
    let id = project_with_language(&app).await;
    let (_, body) = call(&app, "/languages/add", &[("id", &id), ("language", "xx")]).await;
    assert_eq!(body["response"]["code"], "4013");
}

// --- terms ---

#[tokio::test]
async fn terms_lifecycle() {
    let app = app();
    let id = project_with_language(&app).await;

    let data = r#"[{"term":"Add","context":"button","tags":["ui"]},{"term":"Add","context":"button"}]"#;
    let body = call_ok(&app, "/terms/add", &[("id", &id), ("data", data)]).await;
    assert_eq!(body["result"]["terms"]["parsed"], 2);
    assert_eq!(body["result"]["terms"]["added"], 1);

    let data = r#"[{"term":"Add","context":"button","new_term":"Add item"}]"#;
    let body = call_ok(&app, "/terms/update", &[("id", &id), ("data", data)]).await;
    assert_eq!(body["result"]["terms"]["updated"], 1);

    let data = r#"[{"term":"Add item","context":"button","comment":"Shown on the cart"}]"#;
    let body = call_ok(&app, "/terms/add_comment", &[("id", &id), ("data", data)]).await;
    assert_eq!(body["result"]["terms"]["with_added_comment"], 1);

    let body = call_ok(&app, "/terms/list", &[("id", &id), ("language", "fr")]).await;
    let term = &body["result"]["terms"][0];
    assert_eq!(term["term"], "Add item");
    assert_eq!(term["comment"], "Shown on the cart");
    assert_eq!(term["tags"], serde_json::json!(["ui"]));
    assert_eq!(term["translation"]["content"], "");

    let data = r#"[{"term":"Add item","context":"button"}]"#;
    let body = call_ok(&app, "/terms/delete", &[("id", &id), ("data", data)]).await;
    assert_eq!(body["result"]["terms"]["deleted"], 1);
}

#[tokio::test]
async fn sync_with_empty_list_deletes_everything() {
    let app = app();
    let id = project_with_language(&app).await;
    call_ok(&app, "/terms/add", &[("id", &id), ("data", r#"[{"term":"a"},{"term":"b"}]"#)]).await;
    let body = call_ok(&app, "/projects/sync", &[("id", &id), ("data", "[]")]).await;
    assert_eq!(body["result"]["terms"]["deleted"], 2);
}

// --- export / upload ---

#[tokio::test]
async fn export_serves_a_download() {
    let app = app();
    let id = project_with_language(&app).await;
    call_ok(&app, "/terms/add", &[("id", &id), ("data", r#"[{"term":"Hello"}]"#)]).await;

    let body = call_ok(&app, "/projects/export", &[("id", &id), ("language", "fr"), ("type", "po")]).await;
    let url = body["result"]["url"].as_str().unwrap().to_string();
    let path = url.strip_prefix("http://mock.test").unwrap();
    assert!(path.starts_with("/download/file/"));

    let resp = app
        .oneshot(Request::builder().uri(path).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("msgid \"Hello\""));
}

#[tokio::test]
async fn export_rejects_unsupported_format() {
    let app = app();
    let id = project_with_language(&app).await;
    let (_, body) = call(&app, "/projects/export", &[("id", &id), ("language", "fr"), ("type", "xlsx")]).await;
    assert_eq!(body["response"]["code"], "4040");
}

#[tokio::test]
async fn unknown_download_is_404() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/download/file/00000000-0000-0000-0000-000000000000")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_adds_terms_and_translations() {
    let app = app();
    let id = project_with_language(&app).await;

    let boundary = "XBOUNDARYX";
    let mut body = String::new();
    for (name, value) in [
        ("api_token", DEFAULT_TOKEN),
        ("id", id.as_str()),
        ("updating", "terms_translations"),
        ("language", "fr"),
        ("overwrite", "0"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"fr.po\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         msgid \"Hello\"\nmsgstr \"Bonjour\"\n\nmsgid \"Bye\"\nmsgstr \"\"\n\r\n--{boundary}--\r\n"
    ));
    let request = Request::builder()
        .method("POST")
        .uri("/projects/upload")
        .header(http::header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(body)
        .unwrap();

    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["response"]["status"], "success", "{body}");
    assert_eq!(body["result"]["terms"]["parsed"], 2);
    assert_eq!(body["result"]["terms"]["added"], 2);
    assert_eq!(body["result"]["translations"]["added"], 1);

    let body = call_ok(&app, "/languages/list", &[("id", &id)]).await;
    assert_eq!(body["result"]["languages"][0]["percentage"], 50.0);
}

// --- contributors ---

#[tokio::test]
async fn contributors_lifecycle() {
    let app = app();
    let id = project_with_language(&app).await;

    call_ok(
        &app,
        "/contributors/add",
        &[("id", &id), ("name", "Peter"), ("email", "peter@example.org"), ("language", "fr")],
    )
    .await;
    call_ok(
        &app,
        "/contributors/add",
        &[("id", &id), ("name", "John"), ("email", "john@example.org"), ("admin", "1")],
    )
    .await;

    let body = call_ok(&app, "/contributors/list", &[("id", &id)]).await;
    let contributors = body["result"]["contributors"].as_array().unwrap();
    assert_eq!(contributors.len(), 2);
    assert_eq!(contributors[0]["permissions"][0]["type"], "contributor");
    assert_eq!(contributors[0]["permissions"][0]["languages"], serde_json::json!(["fr"]));
    assert_eq!(contributors[1]["permissions"][0]["type"], "administrator");

    call_ok(&app, "/contributors/remove", &[("id", &id), ("email", "peter@example.org")]).await;
    let body = call_ok(&app, "/contributors/list", &[("id", &id)]).await;
    assert_eq!(body["result"]["contributors"].as_array().unwrap().len(), 1);
}
