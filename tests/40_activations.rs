mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_list_and_fetch_own_activations() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let res = server
        .client
        .post(server.url("/activaciones"))
        .bearer_auth(&token)
        .json(&common::activation_body())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let activation = &created["activacion"];
    assert_eq!(activation["tipo"], "premium");
    assert_eq!(activation["se_descargo_app"], true);
    assert_eq!(activation["p2p"], false);
    assert_eq!(activation["fotos"], json!([]));
    let id = activation["id"].as_str().expect("id").to_string();

    let listed: Value = server
        .client
        .get(server.url("/activaciones"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed["activaciones"].as_array().map(Vec::len), Some(1));

    let res = server
        .client
        .get(server.url(&format!("/activaciones/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Another account cannot see it
    let stranger = server.login_as("other@example.com").await?;
    let res = server
        .client
        .get(server.url(&format!("/activaciones/{}", id)))
        .bearer_auth(&stranger)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn usuario_id_comes_from_the_token() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let mut body = common::activation_body();
    body["usuario_id"] = json!(uuid::Uuid::new_v4());

    let created: Value = server
        .client
        .post(server.url("/activaciones"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await?
        .json()
        .await?;

    let login: Value = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "agent@example.com", "password": "correct-horse" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(created["activacion"]["usuario_id"], login["user"]["id"]);
    Ok(())
}

#[tokio::test]
async fn non_numeric_cedula_is_rejected_before_write() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let mut body = common::activation_body();
    body["cedula_identidad"] = json!("01-0203-04");
    let res = server
        .client
        .post(server.url("/activaciones"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = res.json().await?;
    assert!(error["field_errors"]["cedula_identidad"].is_string());

    let listed: Value = server
        .client
        .get(server.url("/activaciones"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed["activaciones"], json!([]));
    Ok(())
}

#[tokio::test]
async fn duplicate_natural_key_conflicts() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let first = server
        .client
        .post(server.url("/activaciones"))
        .bearer_auth(&token)
        .json(&common::activation_body())
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let mut again = common::activation_body();
    again["nombre"] = json!("Otra");
    let res = server
        .client
        .post(server.url("/activaciones"))
        .bearer_auth(&token)
        .json(&again)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invalid_type_email_and_missing_fields() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login_as("agent@example.com").await?;

    let cases = [
        ("tipo", json!("gold")),
        ("correo", json!("not-an-email")),
        ("fecha", json!("yesterday")),
        ("telefono", json!("   ")),
    ];
    for (field, value) in cases {
        let mut body = common::activation_body();
        body[field] = value;
        let res = server
            .client
            .post(server.url("/activaciones"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{field}");
        let error: Value = res.json().await?;
        assert!(error["field_errors"][field].is_string(), "{field}");
    }
    Ok(())
}
