//! Integration tests for the box-counting endpoints.
//!
//! The vision provider is a `MockVisionBackend`, so every test can assert
//! whether (and how) the provider was called.

mod common;

use axum::http::StatusCode;
use base64::Engine;
use boxsight_core::ServiceConfig;
use boxsight_inference::mock::{MockFailure, MockVisionBackend};
use common::{bearer, body_json, jpeg_bytes, post_image, post_json, post_multipart};

const MB: usize = 1024 * 1024;

const MULTIPART_ENDPOINTS: [&str; 2] = ["/count-boxes", "/count-boxes-simple"];

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_bearer_token_returns_401() {
    let (app, mock) = common::build_test_app();
    let response = post_image(
        app,
        "/count-boxes",
        None,
        Some("pallet.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn wrong_bearer_token_returns_401_on_every_protected_endpoint() {
    for uri in ["/count-boxes", "/count-boxes-simple"] {
        let (app, mock) = common::build_test_app();
        let response = post_image(
            app,
            uri,
            Some("Bearer not-the-key"),
            Some("pallet.jpg"),
            Some("image/jpeg"),
            &jpeg_bytes(1024),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(mock.call_count(), 0);
    }

    let (app, mock) = common::build_test_app();
    let response = post_json(
        app,
        "/count-boxes-base64",
        Some("Bearer not-the-key"),
        serde_json::json!({"image": "AAAA"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn non_bearer_scheme_returns_401() {
    let (app, _) = common::build_test_app();
    let response = post_image(
        app,
        "/count-boxes",
        Some(&format!("Basic {}", common::API_KEY)),
        Some("pallet.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_api_key_refuses_service() {
    let mock = MockVisionBackend::new().with_reply(common::PROVIDER_REPLY);
    let app = common::build_app(ServiceConfig::default(), Some(mock.clone()));

    let response = post_image(
        app,
        "/count-boxes",
        Some("Bearer anything"),
        Some("pallet.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(mock.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Upload validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_media_type_never_reaches_provider() {
    for uri in MULTIPART_ENDPOINTS {
        for (filename, content_type) in [
            ("report.pdf", "application/pdf"),
            ("notes.txt", "text/plain"),
            ("vector.svg", "image/svg+xml"),
            // declared type wins over an image-looking extension
            ("pallet.jpg", "application/zip"),
        ] {
            let (app, mock) = common::build_test_app();
            let response = post_image(
                app,
                uri,
                Some(&bearer()),
                Some(filename),
                Some(content_type),
                &jpeg_bytes(1024),
            )
            .await;

            assert_eq!(
                response.status(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "{uri}: {content_type} should be rejected"
            );
            assert_eq!(
                mock.call_count(),
                0,
                "{uri}: {content_type} reached the provider"
            );
        }
    }
}

#[tokio::test]
async fn oversized_upload_returns_413_regardless_of_type() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..common::test_config()
    };

    for uri in MULTIPART_ENDPOINTS {
        for content_type in ["image/jpeg", "application/pdf"] {
            let mock = MockVisionBackend::new().with_reply(common::PROVIDER_REPLY);
            let app = common::build_app(config.clone(), Some(mock.clone()));

            let response = post_image(
                app,
                uri,
                Some(&bearer()),
                Some("big.jpg"),
                Some(content_type),
                &jpeg_bytes(4096),
            )
            .await;

            assert_eq!(
                response.status(),
                StatusCode::PAYLOAD_TOO_LARGE,
                "{uri}: {content_type} should be too large"
            );
            assert_eq!(mock.call_count(), 0);
        }
    }
}

#[tokio::test]
async fn oversized_upload_returns_413_without_provider() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..common::test_config()
    };

    for uri in MULTIPART_ENDPOINTS {
        let app = common::build_app(config.clone(), None);
        let response = post_image(
            app,
            uri,
            Some(&bearer()),
            Some("big.jpg"),
            Some("image/jpeg"),
            &jpeg_bytes(4096),
        )
        .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE, "{uri}");
    }

    let app = common::build_app(config, None);
    let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes(4096));
    let response = post_json(
        app,
        "/count-boxes-base64",
        Some(&bearer()),
        serde_json::json!({ "image": encoded }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_at_ceiling_is_accepted() {
    let config = ServiceConfig {
        max_upload_bytes: 2048,
        ..common::test_config()
    };
    let mock = MockVisionBackend::new().with_reply(common::PROVIDER_REPLY);
    let app = common::build_app(config, Some(mock.clone()));

    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("exact.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(2048),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn missing_file_field_returns_400() {
    let (app, mock) = common::build_test_app();
    let body = common::multipart_body("image", Some("pallet.jpg"), Some("image/jpeg"), b"abc");
    let response = post_multipart(app, "/count-boxes", Some(&bearer()), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn empty_file_returns_400() {
    let (app, mock) = common::build_test_app();
    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("empty.jpg"),
        Some("image/jpeg"),
        b"",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn generic_content_type_falls_back_to_extension() {
    let (app, mock) = common::build_test_app();
    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("shelf.PNG"),
        Some("application/octet-stream"),
        &jpeg_bytes(512),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = mock.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mime_type, "image/png");
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_megabyte_jpeg_end_to_end() {
    let (app, mock) = common::build_test_app();
    let image = jpeg_bytes(3 * MB);

    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("warehouse.jpg"),
        Some("image/jpeg"),
        &image,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["filename"], "warehouse.jpg");
    assert_eq!(json["analysis"]["total_count"], 2);
    assert_eq!(json["analysis"]["box_details"][0]["type"], "box");
    assert_eq!(json["analysis"]["box_details"][0]["labels"][0], "FRAGILE");
    assert_eq!(json["analysis"]["summary"]["arrangement"], "stacked");
    assert_eq!(json["analysis"]["confidence_score"], 0.85);

    let calls = mock.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mime_type, "image/jpeg");
    assert_eq!(calls[0].size_bytes, 3 * MB);
    assert_eq!(calls[0].prompt, common::TEST_PROMPT);
}

#[tokio::test]
async fn simple_endpoint_returns_count_and_labels() {
    let (app, _) = common::build_test_app();
    let response = post_image(
        app,
        "/count-boxes-simple",
        Some(&bearer()),
        Some("pallet.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!({"total_count": 2, "labels": ["FRAGILE"]})
    );
}

#[tokio::test]
async fn unparseable_reply_yields_degraded_result() {
    let mock = MockVisionBackend::new().with_reply("I'm sorry, I can't see any boxes here.");
    let app = common::build_app(common::test_config(), Some(mock));

    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("blurry.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let analysis = &body_json(response).await["analysis"];
    assert_eq!(analysis["total_count"], 0);
    assert_eq!(analysis["box_details"], serde_json::json!([]));
    assert_eq!(analysis["summary"]["arrangement"], "unparseable");
    assert_eq!(analysis["confidence_score"], 0.0);
}

// ---------------------------------------------------------------------------
// Provider failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_failures_map_to_gateway_statuses() {
    for (failure, status) in [
        (MockFailure::Unavailable, StatusCode::BAD_GATEWAY),
        (MockFailure::Error, StatusCode::BAD_GATEWAY),
        (MockFailure::Timeout, StatusCode::GATEWAY_TIMEOUT),
    ] {
        let mock = MockVisionBackend::new().with_failure(failure);
        let app = common::build_app(common::test_config(), Some(mock.clone()));

        let response = post_image(
            app,
            "/count-boxes",
            Some(&bearer()),
            Some("pallet.jpg"),
            Some("image/jpeg"),
            &jpeg_bytes(1024),
        )
        .await;

        assert_eq!(response.status(), status, "{failure:?}");
        assert_eq!(mock.call_count(), 1);

        let error = body_json(response).await["error"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(!error.contains("mock:"), "provider detail leaked: {error}");
    }
}

#[tokio::test]
async fn unconfigured_provider_returns_503() {
    let app = common::build_app(common::test_config(), None);
    let response = post_image(
        app,
        "/count-boxes",
        Some(&bearer()),
        Some("pallet.jpg"),
        Some("image/jpeg"),
        &jpeg_bytes(1024),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Base64 endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn base64_data_url_is_analyzed() {
    let (app, mock) = common::build_test_app();
    let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes(600));

    let response = post_json(
        app,
        "/count-boxes-base64",
        Some(&bearer()),
        serde_json::json!({"image": format!("data:image/jpeg;base64,{encoded}")}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["analysis"]["total_count"], 2);
    assert_eq!(json["image_info"]["size_bytes"], 600);
    assert_eq!(json["image_info"]["content_type"], "image/jpeg");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn base64_wrapped_lines_are_accepted() {
    let (app, mock) = common::build_test_app();
    let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes(600));
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| std::str::from_utf8(line).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(wrapped.contains('\n'));

    let response = post_json(
        app,
        "/count-boxes-base64",
        Some(&bearer()),
        serde_json::json!({"image": format!("data:image/jpeg;base64,{wrapped}")}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["image_info"]["size_bytes"], 600);
    assert_eq!(mock.get_calls()[0].size_bytes, 600);
}

#[tokio::test]
async fn base64_without_prefix_is_sniffed() {
    let (app, mock) = common::build_test_app();
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);

    let response = post_json(
        app,
        "/count-boxes-base64",
        Some(&bearer()),
        serde_json::json!({ "image": encoded }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["image_info"]["content_type"],
        "image/png"
    );
    assert_eq!(mock.get_calls()[0].mime_type, "image/png");
}

#[tokio::test]
async fn base64_rejections_never_reach_provider() {
    let pdf = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7 not an image");

    for (image, status) in [
        ("%%% not base64 %%%".to_string(), StatusCode::BAD_REQUEST),
        (String::new(), StatusCode::BAD_REQUEST),
        (pdf, StatusCode::UNSUPPORTED_MEDIA_TYPE),
    ] {
        let (app, mock) = common::build_test_app();
        let response = post_json(
            app,
            "/count-boxes-base64",
            Some(&bearer()),
            serde_json::json!({ "image": image }),
        )
        .await;

        assert_eq!(response.status(), status);
        assert_eq!(mock.call_count(), 0);
    }
}

#[tokio::test]
async fn base64_oversized_returns_413() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..common::test_config()
    };
    let mock = MockVisionBackend::new();
    let app = common::build_app(config, Some(mock.clone()));
    let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes(2048));

    let response = post_json(
        app,
        "/count-boxes-base64",
        Some(&bearer()),
        serde_json::json!({ "image": encoded }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(mock.call_count(), 0);
}
