mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn product_is_publicly_readable() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.product_url("")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["id"], server.product.id.to_string());
    assert_eq!(body["data"]["price"], "10.00");
    assert_eq!(body["data"]["reviews_num"], 0);
    assert!(body["data"]["reviews"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_product_is_404() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url(&format!("/api/products/{}", uuid::Uuid::new_v4())))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NOT_FOUND");
    Ok(())
}
