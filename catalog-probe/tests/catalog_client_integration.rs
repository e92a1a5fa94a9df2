//! HTTP catalog client against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use catalog_probe::analyzers::SampleValue;
use catalog_probe::catalog::{
    AssetRef, CatalogClient, CatalogError, CatalogProvider, RelationalQuery, StaticToken,
};
use catalog_probe::config::ProbeConfig;
use catalog_probe::error::ProbeError;
use catalog_probe::tools::{CatalogService, ColumnSource};
use mockito::{Matcher, Server, ServerGuard};

const METADATA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="default" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="ORDERSType">
        <Key><PropertyRef Name="ORDER_ID"/></Key>
        <Property Name="ORDER_ID" Type="Edm.Int64" Nullable="false"/>
        <Property Name="STATUS" Type="Edm.String" MaxLength="20"/>
        <Property Name="AMOUNT" Type="Edm.Decimal" Precision="15" Scale="2"/>
      </EntityType>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

fn client_for(server: &ServerGuard) -> CatalogClient {
    CatalogClient::with_token_source(
        server.url(),
        Duration::from_secs(5),
        Arc::new(StaticToken::new("test-token")),
    )
    .expect("client should build")
}

fn service_for(server: &ServerGuard) -> CatalogService {
    let config = ProbeConfig::default().with_tenant_url(server.url());
    CatalogService::new(Arc::new(client_for(server)), config)
}

fn order_rows(count: usize) -> String {
    let rows: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "@odata.etag": format!("W/\"{i}\""),
                "ORDER_ID": i,
                "STATUS": if i % 2 == 0 { "OPEN" } else { "CLOSED" },
                "AMOUNT": i as f64 * 10.5,
            })
        })
        .collect();
    serde_json::json!({ "value": rows }).to_string()
}

#[tokio::test]
async fn test_list_spaces_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/dwc/catalog/spaces")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"value":[
                {"name":"SALES","businessName":"Sales Analytics"},
                {"spaceId":"HR"},
                {"description":"entry without identifier"}
            ]}"#,
        )
        .create_async()
        .await;

    let spaces = client_for(&server).list_spaces().await.unwrap();
    mock.assert_async().await;

    assert_eq!(spaces.len(), 2);
    assert_eq!(spaces[0].id, "SALES");
    assert_eq!(spaces[0].name, "Sales Analytics");
    assert_eq!(spaces[1].id, "HR");
    assert_eq!(spaces[1].name, "HR");
}

#[tokio::test]
async fn test_list_space_assets() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/dwc/catalog/spaces('SALES')/assets")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"value":[
                {"name":"ORDERS","type":"View","assetRelationalDataUrl":"/rel/SALES/ORDERS"},
                {"name":"REVENUE","type":"AnalyticalModel","supportsAnalyticalQueries":true}
            ]}"#,
        )
        .create_async()
        .await;

    let assets = client_for(&server).list_space_assets("SALES").await.unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].space_id, "SALES");
    assert!(assets[0].supports_relational());
    assert!(!assets[1].supports_relational());
    assert!(assets[1].supports_analytical());
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let cases = [
        (401, "auth"),
        (403, "auth"),
        (404, "not_found"),
        (429, "rate_limited"),
        (400, "invalid_request"),
        (503, "server"),
    ];

    for (status, expected) in cases {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/dwc/catalog/spaces")
            .with_status(status)
            .with_header("Retry-After", "7")
            .with_body("upstream said no")
            .create_async()
            .await;

        let error = client_for(&server).list_spaces().await.unwrap_err();
        let kind = match &error {
            CatalogError::Authentication { .. } => "auth",
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::RateLimited { retry_after_secs } => {
                assert_eq!(*retry_after_secs, Some(7));
                "rate_limited"
            }
            CatalogError::InvalidRequest { message } => {
                assert!(message.contains("upstream said no"));
                "invalid_request"
            }
            CatalogError::ServerError { status, .. } => {
                assert_eq!(*status, 503);
                "server"
            }
            other => panic!("unexpected error for {status}: {other:?}"),
        };
        assert_eq!(kind, expected, "status {status}");
    }
}

#[tokio::test]
async fn test_response_without_value_array() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/dwc/catalog/spaces")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"d":{"results":[]}}"#)
        .create_async()
        .await;

    assert!(matches!(
        client_for(&server).list_spaces().await,
        Err(CatalogError::Serialization { .. })
    ));
}

#[tokio::test]
async fn test_relational_metadata_parsed() {
    let mut server = Server::new_async().await;
    server
        .mock(
            "GET",
            "/api/v1/dwc/consumption/relational/SALES/ORDERS/$metadata",
        )
        .with_status(200)
        .with_header("content-type", "application/xml")
        .with_body(METADATA)
        .create_async()
        .await;

    let target = AssetRef::new("SALES", "ORDERS");
    let columns = client_for(&server)
        .get_relational_metadata(&target)
        .await
        .unwrap();

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ORDER_ID", "STATUS", "AMOUNT"]);
    assert!(columns[0].is_key);
    assert_eq!(columns[2].data_type, "Edm.Decimal");
}

#[tokio::test]
async fn test_fetch_page_requests_one_extra_row() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/dwc/consumption/relational/SALES/ORDERS/ORDERS")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("$top".into(), "6".into()),
            Matcher::UrlEncoded("$select".into(), "ORDER_ID,STATUS".into()),
            Matcher::UrlEncoded("$filter".into(), "STATUS eq 'OPEN'".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(order_rows(6))
        .create_async()
        .await;

    let query = RelationalQuery::new(5)
        .with_select(["ORDER_ID", "STATUS"])
        .with_filter("STATUS eq 'OPEN'");
    let sample = client_for(&server)
        .fetch_page(&AssetRef::new("SALES", "ORDERS"), &query)
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(sample.columns, vec!["ORDER_ID", "STATUS"]);
    assert_eq!(sample.row_count(), 5);
    assert!(sample.truncated);
    assert_eq!(sample.rows[0][0], SampleValue::Integer(1));
}

#[tokio::test]
async fn test_preview_through_service() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/dwc/consumption/relational/SALES/ORDERS/ORDERS")
        .match_query(Matcher::UrlEncoded("$top".into(), "11".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(order_rows(4))
        .create_async()
        .await;

    let preview = service_for(&server)
        .preview_asset("SALES", "ORDERS", 10)
        .await
        .unwrap();

    // annotation keys are not columns
    assert_eq!(preview.columns, vec!["ORDER_ID", "STATUS", "AMOUNT"]);
    assert_eq!(preview.row_count, 4);
    assert!(!preview.truncated);
    assert_eq!(preview.rows[1][2], SampleValue::Float(21.0));
}

#[tokio::test]
async fn test_list_columns_prefers_metadata_and_caches() {
    let mut server = Server::new_async().await;
    let metadata = server
        .mock(
            "GET",
            "/api/v1/dwc/consumption/relational/SALES/ORDERS/$metadata",
        )
        .with_status(200)
        .with_body(METADATA)
        .expect(1)
        .create_async()
        .await;

    let service = service_for(&server);
    let first = service.list_columns("SALES", "ORDERS").await.unwrap();
    let second = service.list_columns("SALES", "ORDERS").await.unwrap();
    metadata.assert_async().await;

    assert_eq!(first.source, ColumnSource::RelationalMetadata);
    assert_eq!(first.columns.len(), 3);
    assert_eq!(second.columns, first.columns);
}

#[tokio::test]
async fn test_list_columns_falls_back_to_sample() {
    let mut server = Server::new_async().await;
    server
        .mock(
            "GET",
            "/api/v1/dwc/consumption/relational/SALES/ORDERS/$metadata",
        )
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/dwc/consumption/relational/SALES/ORDERS/ORDERS")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(order_rows(1))
        .create_async()
        .await;

    let columns = service_for(&server)
        .list_columns("SALES", "ORDERS")
        .await
        .unwrap();
    assert_eq!(columns.source, ColumnSource::SampleInference);
    let names: Vec<&str> = columns.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ORDER_ID", "STATUS", "AMOUNT"]);
}

#[tokio::test]
async fn test_upstream_failure_surfaces_as_catalog_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/dwc/consumption/relational/SALES/ORDERS/ORDERS")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body("Property NOPE not found")
        .create_async()
        .await;

    let result = service_for(&server)
        .profile_column("SALES", "ORDERS", "NOPE", 100)
        .await;
    match result {
        Err(ProbeError::Catalog(CatalogError::InvalidRequest { message })) => {
            assert!(message.contains("NOPE"))
        }
        other => panic!("expected invalid request, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_diagnostics_against_unreachable_tenant() {
    let client = CatalogClient::with_token_source(
        "http://127.0.0.1:1",
        Duration::from_secs(2),
        Arc::new(StaticToken::new("test-token")),
    )
    .unwrap();
    let service = CatalogService::new(Arc::new(client), ProbeConfig::default());

    let report = service.diagnostics().await;
    assert!(!report.ok);
    assert_eq!(report.backend, "http");
    assert!(report.checks[0].ok);
    assert!(!report.checks[1].ok);
}
