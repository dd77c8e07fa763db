// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Info and health route tests

use super::support::*;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};

#[cfg(test)]
mod info_route_tests {
    use super::*;

    /// Test 1: GET / lists the processing routes
    #[tokio::test]
    async fn test_info_lists_routes() {
        let node = TestNode::new(working_services(vec![], ""));
        let response = node.get("/").await;
        assert_eq!(response.status, StatusCode::OK);

        let body = response.json();
        let routes = body["routes"].as_object().unwrap();
        for route in ["/detect", "/remove-bg", "/extract-text", "/find-all", "/outputs"] {
            assert!(
                routes.keys().any(|k| k.contains(route)),
                "route {} not advertised",
                route
            );
        }
        assert!(body["version"].as_str().unwrap().starts_with('v'));
    }

    /// Test 2: Health reports success and how collaborators are called
    #[tokio::test]
    async fn test_health() {
        let node = TestNode::new(working_services(vec![], ""));
        let response = node.get("/health").await;
        assert_eq!(response.status, StatusCode::OK);

        let body = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Server healthy");
        let collaborators = body["collaborators"].as_array().unwrap();
        assert_eq!(collaborators.len(), 3);
        assert_eq!(collaborators[0]["serialized"], true);
        assert_eq!(collaborators[2]["serialized"], false);
    }

    /// Test 3: Processing routes reject GET
    #[tokio::test]
    async fn test_process_routes_reject_get() {
        let node = TestNode::new(working_services(vec![], ""));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/detect")
            .body(Body::empty())
            .unwrap();
        let response = node.send(request).await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Test 4: Bodies over the upload limit are refused
    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let node = TestNode::with_config(working_services(vec![], ""), |config| {
            config.max_upload_bytes = 1024;
        });
        let big = vec![0u8; 512 * 1024];
        let response = node
            .upload("/detect", Some("u1"), Some(("big.jpg", &big[..])))
            .await;
        assert!(response.status.is_client_error(), "{}", response.status);
        assert!(node.staged_files().is_empty());
    }
}
