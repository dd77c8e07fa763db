// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Output listing and serving tests
//!
//! These tests verify that:
//! - Stored artifacts come back byte-identical through their reference
//! - Traversal, absolute and encoded paths are rejected with 400
//! - Unknown artifacts are 404
//! - Listing an unknown user is an empty list

use super::support::*;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

#[cfg(test)]
mod outputs_endpoint_tests {
    use super::*;

    fn find_all(user_id: &str) -> Request<Body> {
        multipart_request("/find-all", &[Part::Text("_id", user_id)])
    }

    /// Test 1: The returned reference serves the exact stored bytes
    #[tokio::test]
    async fn test_round_trip_is_byte_identical() {
        let node = TestNode::new(working_services(vec![cat_detection()], ""));

        let response = node
            .upload("/detect", Some("u1"), Some(("cat.jpg", &white_jpeg(64, 64)[..])))
            .await;
        let output_ref = response.json()["outputRef"].as_str().unwrap().to_string();

        let stored = std::fs::read(
            node.dir
                .path()
                .join(output_ref.trim_start_matches('/')),
        )
        .unwrap();

        let fetched = node.get(&output_ref).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(&fetched.body[..], &stored[..]);
        assert_eq!(
            fetched.headers["content-length"],
            stored.len().to_string().as_str()
        );
        let disposition = fetched.headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("inline"), "{}", disposition);
    }

    /// Test 2: Traversal attempts never reach the filesystem outside the root
    #[tokio::test]
    async fn test_traversal_is_invalid_path() {
        let node = TestNode::new(working_services(vec![], ""));
        std::fs::write(node.dir.path().join("secret.txt"), b"top secret").unwrap();
        std::fs::create_dir_all(node.config.output_dir.join("u1")).unwrap();

        let attempts = [
            "/outputs/../secret.txt",
            "/outputs/../../etc/passwd",
            "/outputs/u1/../../secret.txt",
            "/outputs/u1/..%2F..%2Fsecret.txt",
            "/outputs/%2Fetc%2Fpasswd",
            "/outputs/u1/..%5C..%5Csecret.txt",
            "/outputs/u1/%252e%252e%252fsecret.txt",
            "/outputs/C:%5Cwindows%5Cwin.ini",
        ];
        for uri in attempts {
            let response = node.get(uri).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(response.json()["error"], "Invalid path", "{}", uri);
            assert!(!response.body.windows(6).any(|w| w == b"secret"));
        }
    }

    /// Test 3: A bare namespace is not a file reference
    #[tokio::test]
    async fn test_namespace_only_is_invalid() {
        let node = TestNode::new(working_services(vec![], ""));
        let response = node.get("/outputs/u1").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    /// Test 4: Unknown artifacts and unknown namespaces are 404
    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let node = TestNode::new(working_services(vec![], ""));
        std::fs::create_dir_all(node.config.output_dir.join("u1")).unwrap();
        std::fs::write(node.config.output_dir.join("u1/.half.jpg.part"), b"half").unwrap();

        for uri in [
            "/outputs/u1/nope.jpg",
            "/outputs/ghost/nope.jpg",
            "/outputs/u1/.half.jpg.part",
        ] {
            let response = node.get(uri).await;
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(response.json()["error"], "File not found");
        }
    }

    /// Test 5: Listing a user without a namespace directory is empty
    #[tokio::test]
    async fn test_find_all_unknown_user_is_empty() {
        let node = TestNode::new(working_services(vec![], ""));
        let response = node.send(find_all("nobody")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({"images": []}));
    }

    /// Test 6: Listing returns every artifact as a sorted reference list
    #[tokio::test]
    async fn test_find_all_lists_artifacts() {
        let node = TestNode::new(working_services(vec![cat_detection()], ""));

        let mut refs = Vec::new();
        for route in ["/detect", "/remove-bg", "/detect"] {
            let response = node
                .upload(route, Some("u5"), Some(("cat.jpg", &white_jpeg(64, 64)[..])))
                .await;
            refs.push(response.json()["outputRef"].as_str().unwrap().to_string());
        }
        node.upload("/detect", Some("someone-else"), Some(("cat.jpg", &white_jpeg(64, 64)[..])))
            .await;
        refs.sort();

        let response = node.send(find_all("u5")).await;
        assert_eq!(response.status, StatusCode::OK);
        let images: Vec<String> =
            serde_json::from_value(response.json()["images"].clone()).unwrap();
        assert_eq!(images, refs);
    }

    /// Test 7: find-all accepts a url-encoded form too
    #[tokio::test]
    async fn test_find_all_urlencoded() {
        let node = TestNode::new(working_services(vec![], ""));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/find-all")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("_id=u1"))
            .unwrap();
        let response = node.send(request).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({"images": []}));
    }

    /// Test 8: find-all without a usable id is a 400
    #[tokio::test]
    async fn test_find_all_requires_id() {
        let node = TestNode::new(working_services(vec![], ""));

        let missing = node.send(multipart_request("/find-all", &[])).await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            missing.json()["error"],
            "_id (user id) is required in form-data"
        );

        let unsafe_id = node.send(find_all("../u1")).await;
        assert_eq!(unsafe_id.status, StatusCode::BAD_REQUEST);
    }
}
