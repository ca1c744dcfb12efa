use super::*;
use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn store_for(server: &MockServer) -> HttpLeadStore {
    HttpLeadStore::new(Duration::from_secs(5))
        .unwrap()
        .with_endpoint(&format!("{}/exec", server.uri()))
        .unwrap()
}

#[test]
fn test_unconfigured_by_default() {
    let store = HttpLeadStore::new(Duration::from_secs(5)).unwrap();
    assert!(!store.is_configured());
    assert!(store.endpoint().is_none());
}

#[test]
fn test_set_endpoint_validates() {
    let store = HttpLeadStore::new(Duration::from_secs(5)).unwrap();

    let err = store.set_endpoint("not a url").unwrap_err();
    assert!(matches!(err, LeadStoreError::InvalidEndpoint(_)));

    let err = store.set_endpoint("ftp://example.com/exec").unwrap_err();
    assert!(matches!(err, LeadStoreError::InvalidEndpoint(_)));
    assert!(!store.is_configured());

    store
        .set_endpoint("  https://script.google.com/macros/s/abc/exec ")
        .unwrap();
    assert!(store.is_configured());

    store.set_endpoint("").unwrap();
    assert!(!store.is_configured());
}

#[tokio::test]
async fn test_request_without_endpoint() {
    let store = HttpLeadStore::new(Duration::from_secs(5)).unwrap();
    let err = store.unprocessed_leads().await.unwrap_err();
    assert!(matches!(err, LeadStoreError::NotConfigured));
}

#[tokio::test]
async fn test_unprocessed_leads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getUnprocessedLeads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 2,
            "leads": [
                {"rowIndex": 2, "givenName": "Jane", "lastName": "Citizen", "mobile": 412345678, "processed": ""},
                {"rowIndex": 3, "givenName": "John", "lastName": "Smith", "source": ""}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let leads = store.unprocessed_leads().await.unwrap();

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].row_index, 2);
    assert_eq!(leads[0].mobile, "412345678");
    assert!(!leads[0].is_processed());
    assert_eq!(leads[1].source, "Other");
}

#[tokio::test]
async fn test_mark_processed_sends_row_index() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "markLeadProcessed"))
        .and(query_param("rowIndex", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Lead marked as processed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    store.mark_processed(5).await.unwrap();
}

#[tokio::test]
async fn test_api_error_with_ok_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getLead"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid row index"})),
        )
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = store.lead(999).await.unwrap_err();
    assert!(matches!(err, LeadStoreError::Api(ref m) if m == "Invalid row index"));
}

#[tokio::test]
async fn test_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = store.all_leads().await.unwrap_err();
    assert!(matches!(err, LeadStoreError::Status(503)));
}

#[tokio::test]
async fn test_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = store.probe().await.unwrap_err();
    assert!(matches!(err, LeadStoreError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_add_lead_sends_non_empty_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "addLead"))
        .and(query_param("givenName", "Jane"))
        .and(query_param("email", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Lead added successfully",
            "rowIndex": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let lead = NewLead {
        given_name: "Jane".to_string(),
        email: "jane@example.com".to_string(),
        ..Default::default()
    };
    assert_eq!(store.add_lead(&lead).await.unwrap(), 12);
}

#[tokio::test]
async fn test_probe_reports_lead_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getSheetData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "sheetName": "Data",
            "lastRow": 11,
            "lastColumn": 15,
            "data": [["Title", "Given Name(s)"]]
        })))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let summary = store.probe().await.unwrap();
    assert_eq!(summary.sheet_name, "Data");
    assert_eq!(summary.lead_count(), 10);
}
