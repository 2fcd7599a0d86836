//! HTTP API integration tests.
//!
//! These tests drive the full router with `tower::ServiceExt::oneshot`
//! against synthetic caches on disk.

use axum::body::Body;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use basemap_server::RouterConfig;

use super::test_utils::{jpeg_tile, png_tile, router_for, router_with_config, CacheBuilder};

// =============================================================================
// Helpers
// =============================================================================

struct Fixture {
    _world: TempDir,
    _aerial: TempDir,
    router: axum::Router,
}

/// Two services: `World` (10.1, PNG) and `Aerial` (10.3, MIXED).
fn fixture() -> Fixture {
    let world = CacheBuilder::v1().tile(2, 36, 28, png_tile(1)).build();
    let aerial = CacheBuilder::v3()
        .tile_format("MIXED")
        .tile(1, 0, 1, jpeg_tile(2))
        .tile(1, 1, 0, png_tile(3))
        .build();
    let router = router_for(&[("World", world.path()), ("Aerial", aerial.path())]);

    Fixture {
        _world: world,
        _aerial: aerial,
        router,
    }
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(router, uri).await;
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

// =============================================================================
// Root and Health
// =============================================================================

#[tokio::test]
async fn test_root_redirects_to_services() {
    let fixture = fixture();
    let (status, headers, _) = get(fixture.router, "/").await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/rest/services");
}

#[tokio::test]
async fn test_health() {
    let fixture = fixture();
    let (status, json) = get_json(fixture.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["services"], 2);
}

// =============================================================================
// Services Directory
// =============================================================================

#[tokio::test]
async fn test_services_directory_html_by_default() {
    let fixture = fixture();
    let (status, headers, body) = get(fixture.router, "/rest/services").await;
    let html = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(html.contains(r#"<a href="/rest/services/World/MapServer">World</a>"#));
    assert!(html.contains(r#"<a href="/rest/services/Aerial/MapServer">Aerial</a>"#));
}

#[tokio::test]
async fn test_services_directory_json() {
    let fixture = fixture();
    let (status, json) = get_json(fixture.router, "/rest/services?f=json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["currentVersion"], 10.11);
    assert_eq!(json["folders"], serde_json::json!([]));

    let services = json["services"].as_array().unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0]["name"], "Aerial");
    assert_eq!(services[0]["type"], "MapServer");
    assert_eq!(services[1]["name"], "World");
}

#[tokio::test]
async fn test_services_directory_pjson_is_indented() {
    let fixture = fixture();
    let (status, _, body) = get(fixture.router, "/rest/services/?f=pjson").await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains('\n'));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["services"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_services_directory_unknown_format() {
    let fixture = fixture();
    let (status, json) = get_json(fixture.router, "/rest/services?f=kmz").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_format");
}

// =============================================================================
// MapServer Document
// =============================================================================

#[tokio::test]
async fn test_mapserver_json() {
    let fixture = fixture();
    let (status, headers, body) = get(fixture.router, "/rest/services/World/MapServer?f=json").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");

    assert_eq!(json["singleFusedMapCache"], true);
    assert_eq!(json["minScale"], 591657527.0);
    assert_eq!(json["maxScale"], 295828763.0);
    assert_eq!(json["tileInfo"]["rows"], 256);
    assert_eq!(json["tileInfo"]["format"], "PNG");
    assert_eq!(json["tileInfo"]["lods"].as_array().unwrap().len(), 2);
    assert_eq!(json["spatialReference"]["wkid"], 102100);
    assert_eq!(json["spatialReference"]["latestWkid"], 3857);
    assert_eq!(
        json["supportedImageFormatTypes"],
        "PNG32,PNG24,PNG,JPG,DIB,TIFF,EMF,PS,PDF,GIF,SVG,SVGZ,BMP"
    );
    assert_eq!(json["fullExtent"]["xmax"], 20037508.342787);
}

#[tokio::test]
async fn test_mapserver_pjson_with_trailing_slash() {
    let fixture = fixture();
    let (status, _, body) = get(fixture.router, "/rest/services/Aerial/MapServer/?f=pjson").await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("\n  \"currentVersion\""));
}

#[tokio::test]
async fn test_mapserver_jsonp_callback() {
    let fixture = fixture();
    let (status, headers, body) = get(
        fixture.router,
        "/rest/services/World/MapServer?f=json&callback=dojo.io.script.jsonp_dojoIoScript1._jsonpCallback",
    )
    .await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/javascript");
    assert!(text.starts_with("dojo.io.script.jsonp_dojoIoScript1._jsonpCallback({"));
    assert!(text.ends_with("});"));
}

#[tokio::test]
async fn test_mapserver_invalid_callback() {
    let fixture = fixture();
    let (status, json) = get_json(
        fixture.router,
        "/rest/services/World/MapServer?f=json&callback=alert(1)//",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_callback");
}

#[tokio::test]
async fn test_mapserver_html_and_jsapi() {
    let fixture = fixture();

    let (status, _, body) = get(fixture.router.clone(), "/rest/services/World/MapServer").await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("World (MapServer)"));
    assert!(html.contains("?f=jsapi"));

    let (status, _, body) = get(fixture.router, "/rest/services/World/MapServer?f=jsapi").await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("esri/layers/TileLayer"));
    assert!(html.contains("/rest/services/World/MapServer"));
}

#[tokio::test]
async fn test_mapserver_unknown_service() {
    let fixture = fixture();
    let (status, json) = get_json(fixture.router, "/rest/services/Nowhere/MapServer?f=json").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert!(json["message"].as_str().unwrap().contains("Nowhere"));
}

// =============================================================================
// Tiles
// =============================================================================

#[tokio::test]
async fn test_tile_png() {
    let fixture = fixture();
    let (status, headers, body) =
        get(fixture.router, "/rest/services/World/MapServer/tile/2/36/28").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
    assert_eq!(body, png_tile(1));
}

#[tokio::test]
async fn test_tile_mixed_format_is_sniffed() {
    let fixture = fixture();

    let (status, headers, body) = get(
        fixture.router.clone(),
        "/rest/services/Aerial/MapServer/tile/1/0/1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body, jpeg_tile(2));

    let (status, headers, body) =
        get(fixture.router, "/rest/services/Aerial/MapServer/tile/1/1/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(body, png_tile(3));
}

#[tokio::test]
async fn test_missing_tile_is_empty_404() {
    let fixture = fixture();

    let (status, _, body) = get(
        fixture.router.clone(),
        "/rest/services/World/MapServer/tile/2/36/29",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());

    let (status, _, body) =
        get(fixture.router, "/rest/services/World/MapServer/tile/9/9000/9000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_tile_unknown_service() {
    let fixture = fixture();
    let (status, json) = get_json(fixture.router, "/rest/services/Nowhere/MapServer/tile/0/0/0").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_tile_non_numeric_coordinate() {
    let fixture = fixture();

    for uri in [
        "/rest/services/World/MapServer/tile/two/36/28",
        "/rest/services/World/MapServer/tile/2/-1/28",
    ] {
        let (status, _, _) = get(fixture.router.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_truncated_bundle_is_server_error() {
    let dir = CacheBuilder::v3().packet_size(4).tile(0, 0, 0, vec![0x42; 32]).build();
    let path = dir.path().join("_alllayers/L00/R0000C0000.bundle");
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

    let router = router_for(&[("Broken", dir.path())]);
    let (status, json) = get_json(router, "/rest/services/Broken/MapServer/tile/0/0/0").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "truncated_bundle");
}

// =============================================================================
// Router Configuration
// =============================================================================

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let fixture = fixture();
    let request = Request::builder()
        .uri("/rest/services?f=json")
        .header(header::ORIGIN, "https://maps.example.com")
        .body(Body::empty())
        .unwrap();
    let response = fixture.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let dir = CacheBuilder::v1().tile(0, 0, 0, png_tile(0)).build();
    let router = router_with_config(
        &[("World", dir.path())],
        RouterConfig::new().with_tracing(false).with_cache_max_age(60),
    );

    let (status, headers, _) = get(router, "/rest/services/World/MapServer/tile/0/0/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");
}

#[tokio::test]
async fn test_static_dir_is_served() {
    let cache = CacheBuilder::v1().build();
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("viewer.js"), "console.log('tiles');").unwrap();

    let router = router_with_config(
        &[("World", cache.path())],
        RouterConfig::new()
            .with_tracing(false)
            .with_static_dir(assets.path()),
    );

    let (status, _, body) = get(router.clone(), "/static/viewer.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log('tiles');");

    let (status, _, _) = get(router, "/static/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
