//! Integration tests for the ManageIQ client using wiremock
//!
//! These tests drive the public client API against mocked endpoints,
//! covering each authenticator, the typed resource accessors, and the
//! handling of error responses.

use manageiq::{BasicAuthenticator, BearerAuthenticator, Client, ClientParams, Error};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bearer_client(server: &MockServer) -> Client {
    let auth = BearerAuthenticator::new("test-token").with_base_url(format!("{}/api", server.uri()));
    Client::new(Arc::new(auth), ClientParams::default()).expect("client should build")
}

/// Test module for resource accessors
mod resource_tests {
    use super::*;

    /// Groups are listed with the bearer token attached
    #[tokio::test]
    async fn test_get_groups() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/groups"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "groups",
                "count": 2,
                "subcount": 2,
                "pages": 1,
                "resources": [
                    {"href": "https://host/api/groups/1"},
                    {"href": "https://host/api/groups/2"}
                ],
                "actions": [{"name": "create", "method": "post", "href": "https://host/api/groups"}]
            })))
            .mount(&server)
            .await;

        let groups = bearer_client(&server).get_groups().await.expect("groups");

        assert_eq!(groups.count, 2);
        assert_eq!(groups.resources.len(), 2);
        assert_eq!(groups.actions[0].name, "create");
    }

    /// A single group is fetched by id
    #[tokio::test]
    async fn test_get_group() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/groups/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "2",
                "description": "EvmGroup-administrator",
                "group_type": "system"
            })))
            .mount(&server)
            .await;

        let group = bearer_client(&server).get_group("2").await.expect("group");
        assert_eq!(group.description, "EvmGroup-administrator");
    }

    /// Service catalogs use the shared list envelope
    #[tokio::test]
    async fn test_get_service_catalogs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/service_catalogs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "service_catalogs",
                "count": 1,
                "subcount": 1,
                "resources": [{"href": "https://host/api/service_catalogs/10"}]
            })))
            .mount(&server)
            .await;

        let catalogs = bearer_client(&server).get_service_catalogs().await.expect("catalogs");
        assert_eq!(catalogs.name, "service_catalogs");
        assert_eq!(catalogs.subcount, 1);
    }

    /// Query parameters are passed through to the services endpoint
    #[tokio::test]
    async fn test_list_services_with_queries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .and(query_param("expand", "resources"))
            .and(query_param("attributes", "vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "services",
                "count": 1,
                "resources": [{"href": "https://host/api/services/42"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let services = bearer_client(&server)
            .list_services(&[("expand", "resources"), ("attributes", "vms")])
            .await
            .expect("services");
        assert_eq!(services.count, 1);
    }

    /// A service is fetched with its VMs
    #[tokio::test]
    async fn test_get_service() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services/42"))
            .and(query_param("attributes", "vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "name": "my-service",
                "lifecycle_state": "provisioned",
                "vms": [{"id": "7", "name": "vm-1", "raw_power_state": "ACTIVE"}]
            })))
            .mount(&server)
            .await;

        let service = bearer_client(&server)
            .get_service("42", &[("attributes", "vms")])
            .await
            .expect("service");
        assert_eq!(service.vms.len(), 1);
        assert_eq!(service.vms[0].raw_power_state, "ACTIVE");
    }

    /// Null attributes on archived VMs do not fail the whole service
    #[tokio::test]
    async fn test_get_service_with_null_vm_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "vms": [{"id": "7", "name": "vm", "ems_id": null, "ipaddresses": null}]
            })))
            .mount(&server)
            .await;

        let service = bearer_client(&server)
            .get_service("42", &[("attributes", "vms")])
            .await
            .expect("service");
        assert_eq!(service.vms[0].id, "7");
        assert!(service.vms[0].ems_id.is_empty());
        assert!(service.vms[0].ipaddresses.is_empty());
    }

    /// Updates POST the JSON body to the service
    #[tokio::test]
    async fn test_update_service() {
        let server = MockServer::start().await;
        let body = json!({"action": "edit", "resource": {"name": "renamed"}});

        Mock::given(method("POST"))
            .and(path("/api/services/42"))
            .and(header("content-type", "application/json"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "name": "renamed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = bearer_client(&server)
            .update_service("42", &body)
            .await
            .expect("update");
        assert_eq!(service.list.name, "renamed");
    }

    /// Ids are percent-encoded into the path
    #[tokio::test]
    async fn test_id_is_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/groups/a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a b"})))
            .expect(1)
            .mount(&server)
            .await;

        let group = bearer_client(&server).get_group("a b").await.expect("group");
        assert_eq!(group.id, "a b");
    }

    /// An empty id fails before any request is made
    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = bearer_client(&server).get_service("", &[]).await.unwrap_err();
        assert!(matches!(err, Error::UrlResolution(_)));
    }
}

/// Test module for error handling
mod error_tests {
    use super::*;

    /// Test 404 response yields the decoded message
    #[tokio::test]
    async fn test_404_returns_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services/404"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"code": 404, "message": "not found"})),
            )
            .mount(&server)
            .await;

        let err = bearer_client(&server).get_service("404", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "not found");
    }

    /// Test 500 response without a JSON body
    #[tokio::test]
    async fn test_500_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/groups"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = bearer_client(&server).get_groups().await.unwrap_err();
        assert_eq!(err.to_string(), "unknown error, status code: 500");
    }

    /// Basic auth failures surface the token endpoint's response
    #[tokio::test]
    async fn test_basic_auth_failure_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/groups"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = BasicAuthenticator::new("admin", "wrong").with_base_url(format!("{}/api", server.uri()));
        let client = Client::new(Arc::new(auth), ClientParams::default()).expect("client");

        let err = client.get_groups().await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        let details = err.as_authentication().expect("authentication error");
        assert_eq!(details.response.status_code.as_u16(), 401);
    }

    /// Connection failures are transport errors
    #[tokio::test]
    async fn test_connection_refused() {
        let auth = BearerAuthenticator::new("tok").with_base_url("http://127.0.0.1:1/api");
        let client = Client::new(Arc::new(auth), ClientParams::default()).expect("client");

        let err = client.get_groups().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}

/// Test module for Keycloak sessions driven through the client
mod keycloak_tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use manageiq::KeycloakAuthenticator;

    fn token_expiring_in(secs: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + secs;
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
        format!("{}.{}.sig", header, claims)
    }

    /// One login serves several API calls
    #[tokio::test]
    async fn test_single_login_for_many_calls() {
        let server = MockServer::start().await;
        let access = token_expiring_in(3600);

        Mock::given(method("POST"))
            .and(path("/realms/manageiq/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": token_expiring_in(7200),
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/groups"))
            .and(header("authorization", format!("Bearer {}", access).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "groups"})))
            .expect(2)
            .mount(&server)
            .await;

        let auth = KeycloakAuthenticator::new("manageiq", "miq-client", "secret", "admin", "smartvm")
            .with_keycloak_base_url(server.uri())
            .with_base_url(format!("{}/api", server.uri()));
        let client = Client::new(Arc::new(auth), ClientParams::default()).expect("client");

        assert_eq!(client.get_groups().await.expect("first").name, "groups");
        assert_eq!(client.get_groups().await.expect("second").name, "groups");
    }

    /// A rejected login never reaches the API
    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/manageiq/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;

        let auth = KeycloakAuthenticator::new("manageiq", "miq-client", "secret", "admin", "bad")
            .with_keycloak_base_url(server.uri())
            .with_base_url(format!("{}/api", server.uri()));
        let client = Client::new(Arc::new(auth), ClientParams::default()).expect("client");

        let err = client.get_service_catalogs().await.unwrap_err();
        assert_eq!(err.to_string(), "invalid_grant: Invalid user credentials");
        assert!(err.as_authentication().is_some());
    }
}
