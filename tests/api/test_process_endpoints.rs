// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Processing endpoint tests
//!
//! These tests verify that:
//! - Detection annotates, stores and reports every box
//! - Validation failures leave nothing on disk
//! - The staged upload is gone after success and after failure
//! - Concurrent requests for one user never share an artifact name
//! - Background removal honors the configured output format
//! - Text extraction trims and stores nothing

use super::support::*;
use axum::http::StatusCode;
use image::GenericImageView;
use regex::Regex;
use serde_json::json;
use vision_artifact_node::storage::ArtifactFormat;
use vision_artifact_node::vision::Detection;

#[cfg(test)]
mod process_endpoint_tests {
    use super::*;

    /// Test 1: cat.jpg detection round trip
    ///
    /// One box labeled "cat" comes back in the response, the artifact is named
    /// after the request and the stored JPEG has a red outline on the box.
    #[tokio::test]
    async fn test_detect_cat_scenario() {
        let node = TestNode::new(working_services(vec![cat_detection()], ""));
        let original = white_jpeg(64, 64);

        let response = node
            .upload("/detect", Some("u1"), Some(("cat.jpg", &original[..])))
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let body = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["detections"],
            json!([{"class": "cat", "confidence": 0.92, "bbox": [10.0, 10.0, 50.0, 50.0]}])
        );
        assert_eq!(body["objectTypes"], json!(["cat"]));

        let output_ref = body["outputRef"].as_str().unwrap();
        let pattern = Regex::new(r"^/outputs/u1/[0-9a-f]{32}_processed_detect\.jpg$").unwrap();
        assert!(pattern.is_match(output_ref), "unexpected ref {}", output_ref);

        let fetched = node.get(output_ref).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.headers["content-type"], "image/jpeg");

        let annotated = image::load_from_memory(&fetched.body).unwrap().to_rgb8();
        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        assert!(!is_red(before.get_pixel(10, 30)));
        assert!(is_red(annotated.get_pixel(10, 30)), "{:?}", annotated.get_pixel(10, 30));
        assert!(is_red(annotated.get_pixel(30, 10)));
    }

    /// Test 2: Every detection is drawn and objectTypes is the distinct set
    #[tokio::test]
    async fn test_detect_counts_match() {
        let detections = vec![
            cat_detection(),
            Detection {
                label: "dog".to_string(),
                confidence: 0.61,
                bbox: [70.0, 70.0, 110.0, 110.0],
            },
            Detection {
                label: "cat".to_string(),
                confidence: 0.33,
                bbox: [70.0, 10.0, 110.0, 50.0],
            },
        ];
        let node = TestNode::new(working_services(detections, ""));

        let response = node
            .upload("/detect", Some("u1"), Some(("pets.png", &white_png(128, 128)[..])))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();

        assert_eq!(body["detections"].as_array().unwrap().len(), 3);
        assert_eq!(body["objectTypes"], json!(["cat", "dog"]));

        let path = node
            .dir
            .path()
            .join(body["outputRef"].as_str().unwrap().trim_start_matches('/'));
        let annotated = image::open(&path).unwrap();
        assert_eq!(annotated.dimensions(), (128, 128));
        let annotated = annotated.to_rgb8();
        for (x, y) in [(10, 30), (70, 90), (70, 30)] {
            assert!(is_red(annotated.get_pixel(x, y)), "no outline at ({}, {})", x, y);
        }
    }

    /// Test 3: A disallowed extension is rejected before anything is written
    #[tokio::test]
    async fn test_invalid_extension_creates_no_files() {
        let node = TestNode::new(working_services(vec![cat_detection()], "text"));

        for route in ["/detect", "/remove-bg", "/extract-text"] {
            for name in ["cat.gif", "cat", "cat.jpg.exe"] {
                let response = node
                    .upload(route, Some("u1"), Some((name, &white_png(8, 8)[..])))
                    .await;
                assert_eq!(response.status, StatusCode::BAD_REQUEST, "{} {}", route, name);
                assert_eq!(response.json()["error"], "Invalid file type");
            }
        }

        assert!(node.staged_files().is_empty());
        assert!(node.output_files().is_empty());
    }

    /// Test 4: Missing image and missing user id
    #[tokio::test]
    async fn test_missing_fields() {
        let node = TestNode::new(working_services(vec![], ""));

        let no_image = node.upload("/detect", Some("u1"), None).await;
        assert_eq!(no_image.status, StatusCode::BAD_REQUEST);
        assert_eq!(no_image.json()["error"], "No image provided");

        let no_id = node
            .upload("/remove-bg", None, Some(("cat.jpg", &white_jpeg(8, 8)[..])))
            .await;
        assert_eq!(no_id.status, StatusCode::BAD_REQUEST);
        assert_eq!(no_id.json()["error"], "_id (user id) is required in form-data");
        assert_eq!(no_id.json()["errorType"], "validation_error");

        let empty_file = node
            .upload("/extract-text", Some("u1"), Some(("cat.jpg", &b""[..])))
            .await;
        assert_eq!(empty_file.status, StatusCode::BAD_REQUEST);
        assert_eq!(empty_file.json()["error"], "No image provided");

        assert!(node.staged_files().is_empty());
    }

    /// Test 5: A user id that is not a single safe path component is rejected
    #[tokio::test]
    async fn test_unsafe_user_id_rejected() {
        let node = TestNode::new(working_services(vec![cat_detection()], ""));

        for id in ["../escape", "a/b", "..", "", "c:\\x", "a#b", "a?b"] {
            let response = node
                .upload("/detect", Some(id), Some(("cat.jpg", &white_jpeg(64, 64)[..])))
                .await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST, "id {:?}", id);
        }

        assert!(node.output_files().is_empty());
        assert!(node.staged_files().is_empty());
    }

    /// Test 6: Collaborator failures become 500s and still clean up
    #[tokio::test]
    async fn test_failures_clean_staging() {
        let node = TestNode::new(broken_services("model offline"));
        let upload = white_jpeg(16, 16);

        let cases = [
            ("/detect", "Detection failed: model offline"),
            ("/remove-bg", "Background removal failed: model offline"),
            ("/extract-text", "OCR failed: model offline"),
        ];
        for (route, message) in cases {
            let response = node
                .upload(route, Some("u1"), Some(("cat.jpg", &upload[..])))
                .await;
            assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
            let body = response.json();
            assert_eq!(body["status"], "error");
            assert_eq!(body["error"], message);
            assert!(node.staged_files().is_empty(), "{} left a staged file", route);
        }

        assert!(node.output_files().is_empty());
    }

    /// Test 7: Successful calls leave no staged upload behind
    #[tokio::test]
    async fn test_success_cleans_staging() {
        let node = TestNode::new(working_services(vec![cat_detection()], "hi"));
        let upload = white_jpeg(64, 64);

        for route in ["/detect", "/remove-bg", "/extract-text"] {
            let response = node
                .upload(route, Some("u1"), Some(("cat.jpg", &upload[..])))
                .await;
            assert_eq!(response.status, StatusCode::OK, "{}", route);
            assert!(node.staged_files().is_empty(), "{} left a staged file", route);
        }
    }

    /// Test 8: Concurrent requests for one user get distinct artifacts
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_distinct_names() {
        let node = TestNode::new(working_services(vec![cat_detection()], ""));
        let upload = white_jpeg(64, 64);

        let requests = (0..8).map(|_| {
            node.upload("/detect", Some("shared"), Some(("cat.jpg", &upload[..])))
        });
        let responses = futures::future::join_all(requests).await;

        let mut refs: Vec<String> = responses
            .iter()
            .map(|r| {
                assert_eq!(r.status, StatusCode::OK);
                r.json()["outputRef"].as_str().unwrap().to_string()
            })
            .collect();
        refs.sort();
        refs.dedup();
        assert_eq!(refs.len(), 8);
        assert_eq!(node.output_files().len(), 8);
        assert!(node.staged_files().is_empty());
    }

    /// Test 9: Background removal flattens onto white for JPEG output
    #[tokio::test]
    async fn test_remove_background_jpeg() {
        let node = TestNode::new(working_services(vec![], ""));

        let response = node
            .upload("/remove-bg", Some("u2"), Some(("dog.png", &white_png(32, 32)[..])))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();
        assert_eq!(body["status"], "success");
        assert!(body.get("detections").is_none());

        let output_ref = body["outputRef"].as_str().unwrap();
        assert!(output_ref.starts_with("/outputs/u2/"));
        assert!(output_ref.ends_with("_processed_bg.jpg"));

        let fetched = node.get(output_ref).await;
        let img = image::load_from_memory(&fetched.body).unwrap().to_rgb8();
        let corner = img.get_pixel(0, 0);
        assert!(corner.0.iter().all(|&c| c > 240), "{:?}", corner);
        let center = img.get_pixel(16, 16);
        assert!(center[2] > 150 && center[0] < 80, "{:?}", center);
    }

    /// Test 10: PNG output keeps the alpha channel
    #[tokio::test]
    async fn test_remove_background_png() {
        let node = TestNode::with_config(working_services(vec![], ""), |config| {
            config.background_output = ArtifactFormat::Png;
        });

        let response = node
            .upload("/remove-bg", Some("u2"), Some(("dog.jpg", &white_jpeg(32, 32)[..])))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let output_ref = response.json()["outputRef"].as_str().unwrap().to_string();
        assert!(output_ref.ends_with("_processed_bg.png"));

        let fetched = node.get(&output_ref).await;
        assert_eq!(fetched.headers["content-type"], "image/png");
        let img = image::load_from_memory(&fetched.body).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(16, 16)[3], 255);
    }

    /// Test 11: Extracted text is trimmed and no artifact is written
    #[tokio::test]
    async fn test_extract_text() {
        let node = TestNode::new(working_services(vec![], "\n  INVOICE #42\nTotal: 10\n\n"));

        let response = node
            .upload("/extract-text", Some("u3"), Some(("scan.JPEG", &white_jpeg(16, 16)[..])))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.json(),
            json!({"status": "success", "extractedText": "INVOICE #42\nTotal: 10"})
        );
        assert!(node.output_files().is_empty());
    }
}
