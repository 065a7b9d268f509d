use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::filing::domain::{EntityId, FilingFlag};
use crate::filing::router::{
    classify_handler, filing_router, put_facts_handler, remove_facts_handler, rules_handler,
    status_handler, verdict_handler,
};

fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("build request")
}

#[tokio::test]
async fn put_route_creates_then_replaces_rows() {
    let router = filing_router(shared_service());
    let payload = json!({ "wage_income": 35000, "flags": ["incorrect_tax_credits"] });

    let created = router
        .clone()
        .oneshot(json_request("PUT", "/api/v1/filing/entities/p-1", &payload))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    assert_eq!(body.get("id").and_then(Value::as_str), Some("p-1"));

    let replaced = router
        .oneshot(json_request("PUT", "/api/v1/filing/entities/p-1", &payload))
        .await
        .expect("route executes");
    assert_eq!(replaced.status(), StatusCode::OK);
}

#[tokio::test]
async fn verdict_route_reports_classification() {
    let service = shared_service();
    service
        .set_facts(
            person("p-1")
                .with_wage_income(30_000)
                .with_flag(FilingFlag::MultipleEmploymentsWithoutJointTax)
                .with_flag(FilingFlag::DiscretionaryAssessment),
        )
        .expect("store facts");
    let router = filing_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/filing/entities/p-1/verdict")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("filing_requirement").and_then(Value::as_str),
        Some("MandatoryFilingL1")
    );
    assert_eq!(
        payload["inferred_classes"],
        json!(["MandatoryL1Filer", "AdditionalMandatoryL1Filer"])
    );
    assert_eq!(payload["must_file"], json!(true));
    assert_eq!(payload["no_filing_required"], json!(false));
}

#[tokio::test]
async fn verdict_handler_returns_not_found_for_unknown_entity() {
    let response = verdict_handler(State(shared_service()), Path("ghost".to_string())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("ghost")));
}

#[tokio::test]
async fn put_handler_rejects_negative_income() {
    let service = shared_service();
    let entity = person("ignored").with_non_wage_income(-10);

    let response = put_facts_handler(
        State(service.clone()),
        Path("p-neg".to_string()),
        Ok(axum::Json(entity)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(service.entity_ids().expect("ids").is_empty());
}

#[tokio::test]
async fn classify_handler_evaluates_without_storing() {
    let service = shared_service();
    let entity = person("adhoc").with_flag(FilingFlag::EmployerChange);

    let response = classify_handler(State(service.clone()), Ok(axum::Json(entity))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("filing_requirement").and_then(Value::as_str),
        Some("VoluntaryFilingL1")
    );
    assert_eq!(payload["optional_filing"], json!(true));
    assert!(service.entity_ids().expect("ids").is_empty());
}

#[tokio::test]
async fn classify_route_defaults_missing_facts() {
    let router = filing_router(shared_service());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/filing/classify",
            &json!({ "id": "blank" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["inferred_classes"], json!(["NoFilingRequired"]));
    assert_eq!(payload["no_filing_required"], json!(true));
}

#[tokio::test]
async fn status_handler_lists_matching_entities() {
    let service = shared_service();
    service
        .set_facts(person("e1").with_non_wage_income(1_000))
        .expect("store");
    service.set_facts(person("idle")).expect("store");

    let response = status_handler(State(service.clone()), Path("must_file".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["entities"], json!(["e1"]));

    let response = status_handler(State(service), Path("no_filing".to_string())).await;
    let payload = read_json_body(response).await;
    assert_eq!(payload["entities"], json!(["idle"]));
}

#[tokio::test]
async fn status_handler_rejects_unknown_status() {
    let response = status_handler(State(shared_service()), Path("sometimes".to_string())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rules_handler_lists_catalog_in_order() {
    let response = rules_handler(State(shared_service())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let names: Vec<&str> = payload["rules"]
        .as_array()
        .expect("rules array")
        .iter()
        .filter_map(|rule| rule.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names.len(), 9);
    assert_eq!(names.first(), Some(&"mandatory_l1_wage_irregularity"));
    assert_eq!(names.last(), Some(&"no_filing_required"));
}

#[tokio::test]
async fn properties_route_returns_stored_facts() {
    let service = shared_service();
    service
        .set_facts(person("p-1").with_wage_income(12_000))
        .expect("store");
    let router = filing_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/filing/entities/p-1")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["properties"]["wage_income"], json!("12000"));
    assert_eq!(payload["properties"]["single_employer"], json!("false"));
}

#[tokio::test]
async fn put_route_reports_mistyped_fields_as_json() {
    let service = shared_service();
    let router = filing_router(service.clone());

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/filing/entities/p-1",
            &json!({ "wage_income": "abc" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some_and(|message| !message.is_empty()));
    assert!(service.entity_ids().expect("ids").is_empty());
}

#[tokio::test]
async fn classify_route_reports_malformed_bodies_as_json() {
    let router = filing_router(shared_service());

    let response = router
        .oneshot(
            Request::post("/api/v1/filing/classify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"id\": \"broken\""))
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn delete_route_removes_stored_facts() {
    let service = shared_service();
    service
        .set_facts(person("p-1").with_non_wage_income(2_000))
        .expect("store");
    let router = filing_router(service.clone());

    let response = router
        .oneshot(
            Request::delete("/api/v1/filing/entities/p-1")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("id").and_then(Value::as_str), Some("p-1"));
    assert!(service.classify(&EntityId::new("p-1")).is_err());
}

#[tokio::test]
async fn remove_handler_returns_not_found_for_unknown_entity() {
    let response = remove_facts_handler(State(shared_service()), Path("ghost".to_string())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
