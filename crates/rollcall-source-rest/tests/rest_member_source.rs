//! REST adapter behavior against a mock HTTP server.
//!
//! Covers the status-to-error mapping the orchestrator depends on,
//! default injection at create, and list-envelope unwrapping.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollcall_core::{Email, ExternalId, MemberSource, MemberStatus, Source};
use rollcall_sync::identifier::{GroupSourceIdentifier, MemberSourceIdentifier};
use rollcall_sync::traits::{GroupSourceRepository, MemberSourceRepository};
use rollcall_source_rest::{
    AuthBinding, CommunityBinding, CoursePlatformBinding, CrmBinding, RestGroupSourceRepository,
    RestMemberSourceRepository, RestSourceConfig, SourceAuth,
};

fn email(s: &str) -> Email {
    Email::parse(s).unwrap()
}

fn external_id(s: &str) -> ExternalId {
    ExternalId::parse(s).unwrap()
}

fn config_for(server: &MockServer) -> RestSourceConfig {
    RestSourceConfig::new(server.uri())
}

fn crm_adapter(server: &MockServer) -> RestMemberSourceRepository<CrmBinding> {
    RestMemberSourceRepository::new(CrmBinding::new(), config_for(server)).unwrap()
}

#[tokio::test]
async fn finds_member_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": "S1",
            "Full_name_custom__c": "Ada Lovelace",
            "Email": "ada@example.com",
            "Membership_status__c": "active",
        })))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let record = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("S1")))
        .await
        .unwrap();

    assert_eq!(record.source, Source::Crm);
    assert_eq!(record.status, MemberStatus::Active);
    assert_eq!(record.email, email("ada@example.com"));
}

#[tokio::test]
async fn http_404_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sobjects/Contact/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let err = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("missing")))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn http_5xx_maps_to_unavailable_not_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let err = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("S1")))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
}

#[tokio::test]
async fn http_401_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let err = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("S1")))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_payload_maps_to_source_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let err = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("S1")))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SOURCE_INVALID");
}

#[tokio::test]
async fn crm_email_lookup_goes_through_the_query_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "records": [{
                "Id": "S1",
                "Full_name_custom__c": "Ada Lovelace",
                "Email": "ada@example.com",
            }],
        })))
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let record = adapter
        .find_one(&MemberSourceIdentifier::Email(email("ada@example.com")))
        .await
        .unwrap();
    assert_eq!(record.id, external_id("S1"));
}

#[tokio::test]
async fn crm_create_answers_with_a_bare_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sobjects/Contact"))
        .and(body_partial_json(json!({ "Email": "ada@example.com" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "S1", "success": true })),
        )
        .mount(&server)
        .await;

    let adapter = crm_adapter(&server);
    let created = adapter
        .create(&rollcall_core::MemberSourceForCreate {
            status: MemberStatus::Pending,
            name: "Ada Lovelace".to_string(),
            email: email("ada@example.com"),
            organisation_name: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, external_id("S1"));
    assert_eq!(created.email, email("ada@example.com"));
}

#[tokio::test]
async fn crm_update_tolerates_an_empty_204() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let record = MemberSource {
        id: external_id("S1"),
        source: Source::Crm,
        status: MemberStatus::Active,
        name: "Ada Lovelace".to_string(),
        email: email("ada@example.com"),
        organisation_name: None,
    };

    let adapter = crm_adapter(&server);
    let updated = adapter.update(&record).await.unwrap();
    assert_eq!(updated, record);
}

#[tokio::test]
async fn http_422_on_update_maps_to_update_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/sobjects/Contact/S1"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let record = MemberSource {
        id: external_id("S1"),
        source: Source::Crm,
        status: MemberStatus::Active,
        name: "Ada Lovelace".to_string(),
        email: email("ada@example.com"),
        organisation_name: None,
    };

    let adapter = crm_adapter(&server);
    let err = adapter.update(&record).await.unwrap_err();
    assert_eq!(err.error_code(), "UPDATE_REJECTED");
}

#[tokio::test]
async fn auth_create_sends_connection_and_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({ "connection": "tenant-db" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user_id": "auth0|abc123",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
        })))
        .mount(&server)
        .await;

    let adapter = RestMemberSourceRepository::new(
        AuthBinding::new().with_connection("tenant-db"),
        config_for(&server),
    )
    .unwrap();

    let created = adapter
        .create(&rollcall_core::MemberSourceForCreate {
            status: MemberStatus::Pending,
            name: "Ada Lovelace".to_string(),
            email: email("ada@example.com"),
            organisation_name: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, external_id("auth0|abc123"));
}

#[tokio::test]
async fn auth_email_lookup_uses_users_by_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users-by-email"))
        .and(query_param("email", "ada@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "user_id": "auth0|abc123",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
        }])))
        .mount(&server)
        .await;

    let adapter =
        RestMemberSourceRepository::new(AuthBinding::new(), config_for(&server)).unwrap();
    let record = adapter
        .find_one(&MemberSourceIdentifier::Email(email("ada@example.com")))
        .await
        .unwrap();
    assert_eq!(record.id, external_id("auth0|abc123"));
}

#[tokio::test]
async fn bearer_auth_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/abc123"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "abc123",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
        })))
        .mount(&server)
        .await;

    let config = config_for(&server).with_auth(SourceAuth::Bearer {
        token: "secret-token".to_string(),
    });
    let adapter = RestMemberSourceRepository::new(AuthBinding::new(), config).unwrap();
    let record = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("abc123")))
        .await
        .unwrap();
    assert_eq!(record.email, email("ada@example.com"));
}

#[tokio::test]
async fn course_platform_group_slug_lookup_is_unsupported() {
    let server = MockServer::start().await;
    let adapter =
        RestGroupSourceRepository::new(CoursePlatformBinding::new(), config_for(&server)).unwrap();

    let err = adapter
        .find_one(&GroupSourceIdentifier::Slug(
            rollcall_core::Slug::parse("mechanical-computing").unwrap(),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_IDENTIFIER");
    // no request was made at all
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn community_group_delete_is_supported() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/groups/g-12"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let adapter =
        RestGroupSourceRepository::new(CommunityBinding::new(), config_for(&server)).unwrap();
    adapter.delete(&external_id("g-12")).await.unwrap();

    // members do not allow it
    let members =
        RestMemberSourceRepository::new(CommunityBinding::new(), config_for(&server)).unwrap();
    let err = members.delete(&external_id("u-1")).await.unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
}

#[tokio::test]
async fn connection_failure_maps_to_unavailable() {
    // a server that is not listening
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let adapter =
        RestMemberSourceRepository::new(CrmBinding::new(), RestSourceConfig::new(uri)).unwrap();
    let err = adapter
        .find_one(&MemberSourceIdentifier::SourceId(external_id("S1")))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
}
