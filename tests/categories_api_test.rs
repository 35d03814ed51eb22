mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use storefront_api::entities::ProductCategory;
use uuid::Uuid;

use common::{id_of, json_body, TestApp};

#[tokio::test]
async fn duplicate_name_is_a_conflict_and_creates_nothing() {
    let app = TestApp::new().await;
    app.create_category("Vestes").await;

    let response = app
        .admin(Method::POST, "/api/v1/categories", Some(json!({ "name": "Vestes" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "Conflict");

    let count = ProductCategory::find().count(&*app.state.db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn names_collide_after_case_folding() {
    let app = TestApp::new().await;
    let first = app.create_category("Écharpes & Gants").await;
    assert_eq!(first["slug"], "echarpes-gants");

    for name in ["écharpes & gants", "ÉCHARPES & GANTS"] {
        let response = app
            .admin(Method::POST, "/api/v1/categories", Some(json!({ "name": name })))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT, "{name}");
    }
}

#[tokio::test]
async fn colliding_slugs_get_numeric_suffixes() {
    let app = TestApp::new().await;
    let first = app.create_category("Vestes").await;
    let second = app.create_category("Vestes!").await;
    let third = app.create_category("  vestes  ?").await;

    assert_eq!(first["slug"], "vestes");
    assert_eq!(second["slug"], "vestes-1");
    assert_eq!(third["slug"], "vestes-2");
}

#[tokio::test]
async fn explicit_slug_is_normalized_and_deduplicated() {
    let app = TestApp::new().await;
    app.create_category("Vestes").await;

    let response = app
        .admin(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Manteaux", "slug": "Vestes" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["slug"], "vestes-1");
}

#[tokio::test]
async fn list_is_ordered_by_name() {
    let app = TestApp::new().await;
    for name in ["Vestes", "Accessoires", "Robes"] {
        app.create_category(name).await;
    }

    let listed = json_body(app.get("/api/v1/categories").await).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Accessoires", "Robes", "Vestes"]);
}

#[tokio::test]
async fn get_unknown_category_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .get(&format!("/api/v1/categories/{}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renaming_rederives_slug_unless_one_is_given() {
    let app = TestApp::new().await;
    let category = app.create_category("Robes").await;
    let uri = format!("/api/v1/categories/{}", id_of(&category));

    let renamed = json_body(
        app.admin(Method::PUT, &uri, Some(json!({ "name": "Robes de soirée" })))
            .await,
    )
    .await;
    assert_eq!(renamed["name"], "Robes de soirée");
    assert_eq!(renamed["slug"], "robes-de-soiree");

    let same_name = json_body(
        app.admin(Method::PUT, &uri, Some(json!({ "name": "Robes de soirée" })))
            .await,
    )
    .await;
    assert_eq!(same_name["slug"], "robes-de-soiree");

    let explicit = json_body(
        app.admin(
            Method::PUT,
            &uri,
            Some(json!({ "name": "Soirée", "slug": "tenues-de-soiree" })),
        )
        .await,
    )
    .await;
    assert_eq!(explicit["name"], "Soirée");
    assert_eq!(explicit["slug"], "tenues-de-soiree");
}

#[tokio::test]
async fn renaming_onto_existing_name_conflicts() {
    let app = TestApp::new().await;
    app.create_category("Vestes").await;
    let robes = app.create_category("Robes").await;

    let response = app
        .admin(
            Method::PUT,
            &format!("/api/v1/categories/{}", id_of(&robes)),
            Some(json!({ "name": "vestes" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let missing = app
        .admin(
            Method::PUT,
            &format!("/api/v1/categories/{}", Uuid::new_v4()),
            Some(json!({ "name": "Chaussures" })),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_blocked_while_products_reference_category() {
    let app = TestApp::new().await;
    let vestes = app.create_category("Vestes").await;
    let product = app
        .create_product(json!({ "name": "Jacket FO2", "price": 15000, "category_id": vestes["id"] }))
        .await;
    let uri = format!("/api/v1/categories/{}", id_of(&vestes));

    let blocked = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);
    let error = json_body(blocked).await;
    assert!(error["message"].as_str().unwrap().contains("1 product(s)"));

    let detach = app
        .admin(
            Method::PUT,
            &format!("/api/v1/products/{}", id_of(&product)),
            Some(json!({ "category_id": null })),
        )
        .await;
    assert_eq!(detach.status(), StatusCode::OK);

    let deleted = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(json_body(deleted).await, json!({ "success": true }));
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_category_names_are_rejected() {
    let app = TestApp::new().await;
    for body in [json!({ "name": "V" }), json!({ "name": "x".repeat(101) })] {
        let response = app
            .admin(Method::POST, "/api/v1/categories", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
