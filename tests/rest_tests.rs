//! HTTP binding through a full router

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use common::{Fish, FishProvider, Pond, Tank, authenticate};
use crudgate::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

fn basic(username: &str, password: &str) -> HeaderValue {
    HeaderValue::from_str(&Credentials::basic(username, password).to_header_value())
        .expect("valid header value")
}

fn server_with(config: ApiConfig, provider: FishProvider) -> TestServer {
    let app = ServerBuilder::from_config(config)
        .with_authenticator(authenticate)
        .register("fish", provider)
        .expect("fish registers")
        .build();
    TestServer::try_new(app).expect("Failed to create test server")
}

fn server(pond: Arc<Pond>) -> TestServer {
    server_with(ApiConfig::default(), FishProvider::new(pond))
}

mod get_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_fish() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let server = server(pond);

        let response = server.get(&format!("/fish/{}", fish.id)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], fish.id);
        assert_eq!(body["color"], "Red");
        assert_eq!(body["fin_count"], 4);
    }

    #[tokio::test]
    async fn test_get_missing_fish() {
        let server = server(Pond::new());

        let response = server.get("/fish/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body, json!({ "code": 404, "message": "Fish with ID 999 not found" }));
    }

    #[tokio::test]
    async fn test_get_private_fish_needs_owner_credentials() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Black", 4));
        let server = server(pond);
        let path = format!("/fish/{}", fish.id);

        let response = server.get(&path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], 401);

        let response = server
            .get(&path)
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let server = server(Pond::new());

        let response = server.get("/fish/nemo").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_json_not_found() {
        let server = server(Pond::new());

        let response = server.get("/sharks/1").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body, json!({ "code": 404, "message": "Not Found" }));
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_not_found() {
        let server = server(Pond::new());

        for response in [server.get("/fish").await, server.delete("/fish").await] {
            response.assert_status(StatusCode::NOT_FOUND);
            let body: Value = response.json();
            assert_eq!(body, json!({ "code": 404, "message": "Not Found" }));
        }
    }

    #[tokio::test]
    async fn test_unmatched_route_is_json_not_found() {
        let server = server(Pond::new());

        let response = server.get("/fish/1/fins/2").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "Not Found");
    }
}

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_requires_identity() {
        let pond = Pond::new();
        let server = server(pond.clone());

        let response = server
            .post("/fish")
            .json(&json!({ "color": "Blue", "fin_count": 4, "owner_id": 1 }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({ "code": 401, "message": "Not authorized to create this Fish" })
        );
        assert_eq!(pond.len(), 0);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let pond = Pond::new();
        let server = server(pond.clone());

        let response = server
            .post("/fish")
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .json(&json!({ "color": "Blue", "fin_count": 4, "owner_id": 1 }))
            .await;

        response.assert_status_ok();
        let created: Value = response.json();
        let id = created["id"].as_u64().expect("numeric id");
        assert_ne!(id, 0);

        let fetched: Value = server.get(&format!("/fish/{}", id)).await.json();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_partial_embedded_object_keeps_factory_values() {
        let pond = Pond::new();
        let server = server(pond.clone());

        let response = server
            .post("/fish")
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .json(&json!({
                "color": "Blue",
                "fin_count": 4,
                "owner_id": 1,
                "tank": { "label": "reef" }
            }))
            .await;

        response.assert_status_ok();
        let created: Value = response.json();
        assert_eq!(created["tank"], json!({ "installed_by": 0, "label": "reef" }));
        let id = created["id"].as_u64().expect("numeric id");
        assert_eq!(pond.peek(id).expect("stored").tank.label, "reef");
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_anonymous() {
        let server = server(Pond::new());

        let response = server
            .post("/fish")
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "apple"))
            .json(&json!({ "color": "Blue", "fin_count": 4 }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let server = server(Pond::new());

        let response = server
            .post("/fish")
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .text("{ this is not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({ "code": 400, "message": "Improperly formatted request body" })
        );
    }

    #[tokio::test]
    async fn test_validation_message_reaches_client() {
        let server = server(Pond::new());

        let response = server
            .post("/fish")
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .json(&json!({ "color": "Blue", "fin_count": 1, "owner_id": 1 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Fish must have at least 2 fins");
    }
}

mod update_tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_update_keeps_create_date() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let server = server(pond.clone());

        let mut body = serde_json::to_value(&fish).expect("serialize fish");
        body["create_date"] =
            serde_json::to_value(fish.create_date + Duration::hours(100)).expect("serialize date");
        body["color"] = json!("Orange");

        let response = server
            .put(&format!("/fish/{}", fish.id))
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .json(&body)
            .await;

        response.assert_status_ok();
        let saved: Value = response.json();
        assert_eq!(
            saved["create_date"],
            serde_json::to_value(fish.create_date).expect("serialize date")
        );
        assert_eq!(saved["color"], "Orange");
    }

    #[tokio::test]
    async fn test_update_may_omit_immutable_embedded_field() {
        let pond = Pond::new();
        let fish = pond.stock(Fish {
            tank: Tank {
                installed_by: 1,
                label: "reef".to_string(),
            },
            ..Fish::new(1, "Red", 4)
        });
        let server = server(pond.clone());

        let response = server
            .put(&format!("/fish/{}", fish.id))
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .json(&json!({
                "id": fish.id,
                "color": "Red",
                "fin_count": 4,
                "tank": { "label": "lagoon" }
            }))
            .await;

        response.assert_status_ok();
        let saved: Value = response.json();
        assert_eq!(saved["tank"], json!({ "installed_by": 1, "label": "lagoon" }));
        assert_eq!(saved["owner_id"], 1);
    }

    #[tokio::test]
    async fn test_update_without_path_id() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let server = server(pond.clone());

        let response = server
            .put("/fish")
            .add_header(AUTHORIZATION, basic("admin", "admin"))
            .json(&json!({ "id": fish.id, "color": "Teal", "fin_count": 4 }))
            .await;

        response.assert_status_ok();
        assert_eq!(pond.peek(fish.id).expect("stored").color, "Teal");
        assert_eq!(pond.peek(fish.id).expect("stored").owner_id, 1);
    }

    #[tokio::test]
    async fn test_mismatched_ids_are_bad_request() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let server = server(pond.clone());

        let response = server
            .put(&format!("/fish/{}", fish.id + 10))
            .add_header(AUTHORIZATION, basic("admin", "admin"))
            .json(&json!({ "id": fish.id, "color": "Teal", "fin_count": 4 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(pond.save_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        let server = server(Pond::new());

        let response = server
            .put("/fish/1")
            .add_header(AUTHORIZATION, basic("admin", "admin"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Improperly formatted request body");
    }
}

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_twice() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let server = server(pond.clone());
        let path = format!("/fish/{}", fish.id);

        let response = server
            .delete(&path)
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({ "code": 200, "message": "Success" }));

        let response = server
            .delete(&path)
            .add_header(AUTHORIZATION, basic("MaxwellPayne", "banana"))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_disabled_delete_hides_existing_fish() {
        let pond = Pond::new();
        let fish = pond.stock(Fish::new(1, "Red", 4));
        let config = ApiConfig::from_yaml_str(
            r#"
messages:
  not_found: "Nothing swims here"
disabled:
  fish: [delete]
"#,
        )
        .expect("valid config");
        let server = server_with(config, FishProvider::new(pond.clone()));

        let response = server
            .delete(&format!("/fish/{}", fish.id))
            .add_header(AUTHORIZATION, basic("admin", "admin"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "Nothing swims here");
        assert!(pond.peek(fish.id).is_some());
    }
}

mod panic_tests {
    use super::*;

    struct Explodes;

    #[async_trait]
    impl GetHooks<Fish> for Explodes {
        async fn pre_get(&self, _id: u64, _user: Option<&dyn Identity>) -> Option<Outcome<Fish>> {
            panic!("hook exploded")
        }
    }

    #[tokio::test]
    async fn test_handler_panic_is_generic_internal_error() {
        let config = ApiConfig::from_yaml_str("messages:\n  internal_error: \"Something broke\"\n")
            .expect("valid config");
        let provider = FishProvider::new(Pond::new()).with_hooks(HookSet::none().on_get(Explodes));
        let server = server_with(config, provider);

        let response = server.get("/fish/1").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body, json!({ "code": 500, "message": "Something broke" }));
    }
}
