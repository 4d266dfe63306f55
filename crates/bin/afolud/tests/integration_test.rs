//! End-to-end tests for the full afolud stack.
//!
//! Each test wires the virtual platform into the real analysis services and
//! the real axum router, and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use afolu_adapter_http_axum::router;
use afolu_adapter_http_axum::state::AppState;
use afolu_adapter_virtual::VirtualPlatform;
use afolu_app::services::{
    Analysis, AnalysisService, BiomassAnalysis, LandCoverAnalysis, NdviAnalysis,
};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const DEADLINE: Duration = Duration::from_secs(300);

fn app<A: Analysis + 'static>(analysis: A, platform: VirtualPlatform) -> axum::Router {
    let service = AnalysisService::new(analysis, Arc::new(platform), DEADLINE);
    router::build(AppState::new(service))
}

fn parcel() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[-74.1, 4.6], [-74.1, 4.7], [-74.0, 4.7], [-74.0, 4.6], [-74.1, 4.6]]]
    })
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn number(body: &Value, key: &str) -> f64 {
    body[key].as_f64().unwrap_or_else(|| panic!("{key} should be a number in {body}"))
}

// ---------------------------------------------------------------------------
// Health checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_report_service_name_when_health_check_called() {
    let cases = [
        (app(BiomassAnalysis, VirtualPlatform::default()), "biomass"),
        (app(LandCoverAnalysis, VirtualPlatform::default()), "landcover"),
        (app(NdviAnalysis, VirtualPlatform::default()), "ndvi-calculator"),
    ];
    for (app, name) in cases {
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], name);
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn should_attach_request_id_to_every_response() {
    let resp = app(BiomassAnalysis, VirtualPlatform::default())
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-42");

    let resp = app(BiomassAnalysis, VirtualPlatform::default())
        .oneshot(post("/calculate-biomass", &json!({})))
        .await
        .unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

// ---------------------------------------------------------------------------
// Biomass
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_calculate_biomass_for_parcel() {
    let (status, body) = send(
        app(BiomassAnalysis, VirtualPlatform::default()),
        post("/calculate-biomass", &json!({"geometry": parcel(), "year": 2022})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2022);
    assert_eq!(body["project_type"], "Silvopastoreo");
    assert_eq!(body["methodology"], "MODIS_NPP_converted");
    assert!((number(&body, "npp_kg_c_m2_year") - 0.45).abs() < 1e-9);
    assert!((number(&body, "biomass_kg_ha") - 11_250.0).abs() < 1e-6);

    let area_ha = number(&body, "area_ha");
    assert!((12_000.0..12_500.0).contains(&area_ha), "got {area_ha} ha");

    let total = number(&body, "total_biomass_kg");
    let carbon = number(&body, "carbon_stock_kg");
    let tco2e = number(&body, "carbon_tco2e");
    assert!((carbon - total * 0.5).abs() <= 0.01);
    assert!((tco2e - carbon / 1000.0 * 44.0 / 12.0).abs() <= 0.01);
}

#[tokio::test]
async fn should_reject_biomass_request_without_geometry() {
    let (status, body) = send(
        app(BiomassAnalysis, VirtualPlatform::default()),
        post("/calculate-biomass", &json!({"year": 2023})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: geometry");
}

#[tokio::test]
async fn should_reject_non_json_body() {
    let resp = app(BiomassAnalysis, VirtualPlatform::default())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/calculate-biomass")
                .body(Body::from("geometry=1"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_report_invalid_geometry_as_server_error() {
    let (status, body) = send(
        app(BiomassAnalysis, VirtualPlatform::default()),
        post(
            "/calculate-biomass",
            &json!({"geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Invalid geometry");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn should_return_identical_payload_for_identical_input() {
    let request = json!({"geometry": parcel(), "project_type": "Reforestation"});
    let (_, first) = send(
        app(BiomassAnalysis, VirtualPlatform::default()),
        post("/calculate-biomass", &request),
    )
    .await;
    let (_, second) = send(
        app(BiomassAnalysis, VirtualPlatform::default()),
        post("/calculate-biomass", &request),
    )
    .await;
    assert_eq!(first, second);
    assert_eq!(first["project_type"], "Reforestation");
}

// ---------------------------------------------------------------------------
// Land cover
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_break_parcel_down_by_land_cover_class() {
    let (status, body) = send(
        app(LandCoverAnalysis, VirtualPlatform::default()),
        post("/get-landcover", &json!({"geometry": parcel()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2021);
    assert_eq!(body["data_source"], "ESA WorldCover v200");
    assert_eq!(body["resolution_m"], 10);

    let classes = body["land_cover"].as_object().unwrap();
    let names: Vec<&str> = classes.keys().map(String::as_str).collect();
    assert_eq!(names, ["cropland", "forest", "grassland", "water"]);
    let sum: f64 = classes.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((sum - number(&body, "total_area_ha")).abs() < 0.05);
}

#[tokio::test]
async fn should_label_unknown_land_cover_codes() {
    let platform = VirtualPlatform::default().with_land_cover(vec![(10, 0.5), (77, 0.5)]);
    let (status, body) = send(
        app(LandCoverAnalysis, platform),
        post("/get-landcover", &json!({"geometry": parcel(), "year": 2020})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2020);
    assert!(body["land_cover"]["unknown_77"].is_number());
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_describe_ndvi_service_at_root() {
    let (status, body) = send(app(NdviAnalysis, VirtualPlatform::default()), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "NDVI Calculator");
    assert_eq!(body["version"], "1.0.0");
    assert!(body["endpoints"]["/calculate-ndvi"].is_string());
}

#[tokio::test]
async fn should_not_expose_root_for_other_services() {
    let resp = app(BiomassAnalysis, VirtualPlatform::default())
        .oneshot(get("/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_calculate_ndvi_statistics_and_series() {
    let (status, body) = send(
        app(NdviAnalysis, VirtualPlatform::default()),
        post(
            "/calculate-ndvi",
            &json!({"geometry": parcel(), "start_date": "2023-01-01", "end_date": "2023-12-31"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_count"], 15);
    assert_eq!(body["period"], json!({"start": "2023-01-01", "end": "2023-12-31"}));
    let mean = number(&body, "ndvi_mean");
    assert!((-1.0..=1.0).contains(&mean));
    assert!((number(&body, "ndvi_std") - 0.08).abs() < 1e-9);
    assert!(number(&body, "cloud_coverage_pct") < 20.0);

    let series = body["ndvi_time_series"].as_array().unwrap();
    assert_eq!(series.len(), 12, "masked scenes are dropped");
    assert!(series.iter().all(|point| point["ndvi"].is_number()));
    let dates: Vec<&str> = series.iter().map(|p| p["date"].as_str().unwrap()).collect();
    assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn should_return_not_found_when_no_images_match() {
    let (status, body) = send(
        app(NdviAnalysis, VirtualPlatform::default()),
        post(
            "/calculate-ndvi",
            &json!({
                "geometry": parcel(),
                "start_date": "1990-01-01",
                "end_date": "1990-12-31",
                "cloud_threshold": 50
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No images found for the specified criteria");
    assert_eq!(body["image_count"], 0);
}

#[tokio::test]
async fn should_require_ndvi_dates() {
    let (status, body) = send(
        app(NdviAnalysis, VirtualPlatform::default()),
        post("/calculate-ndvi", &json!({"geometry": parcel(), "start_date": "2023-01-01"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: end_date");
}

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_fail_request_when_platform_exceeds_deadline() {
    let platform = VirtualPlatform::default().with_latency(Duration::from_secs(120));
    let service = AnalysisService::new(BiomassAnalysis, Arc::new(platform), Duration::from_secs(30));
    let app = router::build(AppState::new(service));

    let (status, body) = send(app, post("/calculate-biomass", &json!({"geometry": parcel()}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body["message"].as_str().unwrap().contains("30s"));
}
