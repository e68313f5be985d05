use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use hyper::{Body, Request, Response};
use lxcfs_common::errors::InjectorError;
use lxcfs_macros::{logger, lxcfs_error, lxcfs_info, lxcfs_log, with_dollar_sign};
use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys, rsa_private_keys};

use crate::injector::{handle, InjectorContext};

logger!("LxcfsServer");

pub type Acceptor = tokio_rustls::TlsAcceptor;

/// Loads the certificate chain and the first private key found.
/// RSA keys are tried first, then PKCS#8.
pub fn load_ssl(cert_file: &Path, key_file: &Path) -> Result<ServerConfig, InjectorError> {
    let mut cert_reader = BufReader::new(
        File::open(cert_file).map_err(|e| format!("Unable to open cert file: {}", e))?,
    );
    let mut key_pem = vec![];
    File::open(key_file)
        .and_then(|mut f| f.read_to_end(&mut key_pem))
        .map_err(|e| format!("Unable to open key file: {}", e))?;

    let raw_certs =
        certs(&mut cert_reader).map_err(|e| format!("Unable to load certificates: {}", e))?;
    let certs: Vec<Certificate> = raw_certs.into_iter().map(Certificate).collect();
    let mut raw_keys =
        rsa_private_keys(&mut key_pem.as_slice()).map_err(|e| format!("Unable to load keys: {}", e))?;
    if raw_keys.is_empty() {
        raw_keys = pkcs8_private_keys(&mut key_pem.as_slice())
            .map_err(|e| format!("Unable to load keys: {}", e))?;
    }
    let key = raw_keys
        .into_iter()
        .next()
        .map(PrivateKey)
        .ok_or_else(|| format!("No private key found in {}", key_file.display()))?;

    Ok(ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| format!("Unable to create ServerConfig with TLS certificate: {}", e))?)
}

fn response(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

pub async fn injector_handler(
    req: Request<Body>,
    context: Arc<InjectorContext>,
) -> Result<Response<Body>, hyper::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/mutate") => {
            let content_type = req
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let bs = hyper::body::to_bytes(req.into_body()).await?;
            match handle(&bs, content_type.as_deref(), &context) {
                Ok(body) => {
                    let mut ok = response(StatusCode::OK, Body::from(body));
                    ok.headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    Ok(ok)
                }
                Err(e) => {
                    error!("Admission request failed: {}", e);
                    Ok(response(e.status_code(), Body::from(e.to_string())))
                }
            }
        }
        _ => Ok(response(StatusCode::NOT_FOUND, Body::empty())),
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Got OS shutdown signal, shutting down webhook server");
}

#[cfg(test)]
mod tests {
    use super::{injector_handler, load_ssl};
    use crate::injector::InjectorContext;
    use http::header::CONTENT_TYPE;
    use http::{Method, StatusCode};
    use hyper::{Body, Request};
    use k8s_openapi::api::core::v1::{Container, Pod};
    use kube::api::DynamicObject;
    use kube::core::admission::AdmissionReview;
    use lxcfs_common::annotations::LXCFS_INJECTOR_ANNOTATION_INJECT;
    use lxcfs_common::config::WebhookConfig;
    use lxcfs_test_macros::{pod, set_pod_field};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::{NamedTempFile, TempDir};

    fn context() -> Arc<InjectorContext> {
        Arc::new(InjectorContext::new(WebhookConfig::default()))
    }

    fn request(method: Method, path: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("Unable to build request")
    }

    fn review_body(uid: &str, pod: &Pod) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": uid,
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "name": "srv1",
                "namespace": "ns1",
                "operation": "CREATE",
                "userInfo": {"username": "admin"},
                "object": serde_json::to_value(pod).expect("Unable to serialize Pod")
            }
        }))
        .expect("Unable to serialize AdmissionReview")
    }

    #[tokio::test]
    async fn test_handler_mutate() {
        let uid = uuid::Uuid::new_v4().to_string();
        let p = pod!(1,
            containers => vec!["app"],
            annotations => vec![(LXCFS_INJECTOR_ANNOTATION_INJECT, "true")]);
        let req = request(
            Method::POST,
            "/mutate",
            "application/json",
            review_body(&uid, &p),
        );
        let resp = injector_handler(req, context())
            .await
            .expect("Handler failed");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let bs = hyper::body::to_bytes(resp.into_body())
            .await
            .expect("Unable to read body");
        let review: AdmissionReview<DynamicObject> =
            serde_json::from_slice(&bs).expect("Unable to parse AdmissionReview");
        let response = review.response.expect("No response in review");
        assert_eq!(response.uid, uid);
        assert!(response.allowed);
        assert!(response.patch.is_some());
    }

    #[tokio::test]
    async fn test_handler_transport_errors() {
        let p = pod!(1, containers => vec!["app"]);
        let tests = vec![
            (
                request(Method::POST, "/mutate", "application/json", vec![]),
                StatusCode::BAD_REQUEST,
            ),
            (
                request(Method::POST, "/mutate", "text/plain", review_body("uid", &p)),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                request(Method::GET, "/mutate", "application/json", vec![]),
                StatusCode::NOT_FOUND,
            ),
            (
                request(Method::POST, "/validate", "application/json", review_body("uid", &p)),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (req, status) in tests {
            let path = req.uri().path().to_string();
            let resp = injector_handler(req, context())
                .await
                .expect("Handler failed");
            assert_eq!(resp.status(), status, "Wrong status for {}", path);
        }
    }

    #[tokio::test]
    async fn test_handler_malformed_review() {
        let req = request(
            Method::POST,
            "/mutate",
            "application/json",
            b"{\"apiVersion\": 1".to_vec(),
        );
        let resp = injector_handler(req, context())
            .await
            .expect("Handler failed");
        assert_eq!(resp.status(), StatusCode::OK);
        let bs = hyper::body::to_bytes(resp.into_body())
            .await
            .expect("Unable to read body");
        let review: AdmissionReview<DynamicObject> =
            serde_json::from_slice(&bs).expect("Unable to parse AdmissionReview");
        let response = review.response.expect("No response in review");
        assert!(!response.allowed);
        assert!(response.patch.is_none());
        assert!(!response.result.message.is_empty());
    }

    #[test]
    fn test_load_ssl_errors() {
        let dir = TempDir::new().expect("Unable to create temp dir");
        let missing = dir.path().join("cert.pem");
        let e = load_ssl(&missing, &missing).unwrap_err();
        assert!(e.error.starts_with("Unable to open cert file"));

        let empty = NamedTempFile::new().expect("Unable to create empty pem file");
        let e = load_ssl(empty.path(), empty.path()).unwrap_err();
        assert!(e.error.starts_with("No private key found"));
    }
}
