mod common;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;

use activaciones_api::config::Visibility;

fn photo(name: &str, bytes: Vec<u8>, mime: &str) -> Part {
    Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("valid mime")
}

fn png(name: &str) -> Part {
    photo(name, common::PNG.to_vec(), "image/png")
}

async fn upload(server: &common::TestServer, token: &str, form: Form) -> Result<(StatusCode, Value)> {
    let res = server
        .client
        .post(server.url("/upload"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn returns_one_url_per_file_in_order() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let form = Form::new()
        .text("note", "ignored")
        .part("photos", png("front.png"))
        .part("photos", png("my photo!@#.png"))
        .part("photos", photo("back.jpg", common::PNG.to_vec(), "image/jpeg"));

    let (status, body) = upload(&server, &token, form).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let files: Vec<&str> = body["files"]
        .as_array()
        .expect("files")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("-front.png"));
    assert!(files[1].ends_with("-my_photo.png"));
    assert!(files[2].ends_with("-back.jpg"));
    assert!(files
        .iter()
        .all(|url| url.starts_with(&format!("memory://{}/uploads/", common::BUCKET))));
    assert_eq!(server.storage.object_count().await?, 3);

    // Declared as JPEG, stored with the sniffed type
    let key = files[2].trim_start_matches(&format!("memory://{}/", common::BUCKET));
    let (_, content_type) = server.storage.object(key).await?;
    assert_eq!(content_type.as_deref(), Some("image/png"));
    Ok(())
}

#[tokio::test]
async fn one_disallowed_file_rejects_the_batch() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let form = Form::new()
        .part("photos", png("ok.png"))
        .part("photos", photo("notes.txt", b"hello".to_vec(), "text/plain"));

    let (status, body) = upload(&server, &token, form).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("files").is_none());
    assert_eq!(server.storage.object_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn document_disguised_as_png_is_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let form = Form::new().part(
        "photos",
        photo("x.png", b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n".to_vec(), "image/png"),
    );

    let (status, body) = upload(&server, &token, form).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("application/pdf"));
    assert_eq!(server.storage.object_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn oversize_file_rejects_the_batch() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let mut big = common::PNG.to_vec();
    big.resize(5 * 1024 * 1024 + 1, 0);
    let form = Form::new()
        .part("photos", png("ok.png"))
        .part("photos", photo("big.png", big, "image/png"));

    let (status, _) = upload(&server, &token, form).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(server.storage.object_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn more_than_four_files_is_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let form = (0..5).fold(Form::new(), |form, i| form.part("photos", png(&format!("{i}.png"))));

    let (status, body) = upload(&server, &token, form).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("at most 4"));
    assert_eq!(server.storage.object_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn empty_batch_and_wrong_field_are_bad_requests() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let (status, _) = upload(&server, &token, Form::new().text("note", "no files")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(&server, &token, Form::new().part("avatar", png("a.png"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let res = server
        .client
        .post(server.url("/upload"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn upload_requires_a_token() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/upload"))
        .multipart(Form::new().part("photos", png("a.png")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.storage.object_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn storage_outage_is_a_generic_500() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;
    server.storage.set_unavailable(true);

    let (status, body) = upload(&server, &token, Form::new().part("photos", png("a.png"))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal error while uploading files");
    Ok(())
}

#[tokio::test]
async fn private_visibility_returns_signed_urls() -> Result<()> {
    let server = common::TestServer::spawn_with(Visibility::Private).await?;
    let token = server.login_as("agent@example.com").await?;

    let (status, body) = upload(&server, &token, Form::new().part("photos", png("a.png"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let url = body["files"][0].as_str().expect("url");
    assert!(url.contains("?expires=3600"));
    Ok(())
}
