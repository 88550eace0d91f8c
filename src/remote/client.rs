//! HTTP client for the scanner REST API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::{RemoteError, RemoteResult};
use super::traits::ScanService;
use super::types::{
    CreatedTarget, Criticality, NewScan, NewTarget, RemoteTargetMap, RunningScanSet, ScanList,
    ScanSchedule, ScanSpeed, TargetConfigurationPatch, TargetId, TargetList, UsageStats,
};
use crate::core::config::RunConfig;

const API_PREFIX: &str = "api/v1/";
const AUTH_HEADER: &str = "x-auth";

/// Scanner API client
///
/// Every request carries the API key and a JSON content type. Certificate
/// verification follows `RunConfig::accept_invalid_certs`.
#[derive(Clone)]
pub struct RemoteServiceClient {
    client: Client,
    base_url: String,
    target_description: String,
    target_criticality: Criticality,
}

impl std::fmt::Debug for RemoteServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteServiceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RemoteServiceClient {
    pub fn new(config: &RunConfig) -> RemoteResult<Self> {
        let mut auth = HeaderValue::from_str(&config.api_key).map_err(|e| {
            RemoteError::ClientBuild {
                reason: format!("API key is not a valid header value: {}", e),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(AUTH_HEADER), auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if config.accept_invalid_certs {
            log::warn!(
                "TLS certificate verification is disabled for {}",
                config.host()
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| RemoteError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            target_description: config.target_description.clone(),
            target_criticality: config.target_criticality,
        })
    }

    /// Full URL for an API path such as `targets` or `me/stats`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            API_PREFIX,
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| RemoteError::transport(path, e))?;
        let response = expect_status(path, response, StatusCode::OK)?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::decode(path, e))
    }
}

fn expect_status(path: &str, response: Response, expected: StatusCode) -> RemoteResult<Response> {
    if response.status() == expected {
        Ok(response)
    } else {
        Err(RemoteError::UnexpectedStatus {
            endpoint: path.to_string(),
            status: response.status().as_u16(),
        })
    }
}

#[async_trait]
impl ScanService for RemoteServiceClient {
    async fn check_connectivity(&self) -> RemoteResult<()> {
        let path = "info";
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| RemoteError::transport(path, e))?;
        expect_status(path, response, StatusCode::OK).map(|_| ())
    }

    async fn list_targets(&self) -> RemoteResult<RemoteTargetMap> {
        let list: TargetList = self.get_json("targets").await?;
        Ok(list.into_address_map())
    }

    async fn list_running_scans(&self) -> RemoteResult<RunningScanSet> {
        let list: ScanList = self.get_json("scans").await?;
        Ok(list.into_running_set())
    }

    async fn create_target(&self, address: &str) -> RemoteResult<TargetId> {
        let path = "targets";
        let body = NewTarget {
            address,
            description: &self.target_description,
            criticality: self.target_criticality,
        };
        let response = self
            .client
            .post(self.endpoint(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(path, e))?;
        let response = expect_status(path, response, StatusCode::CREATED)?;
        let created: CreatedTarget = response
            .json()
            .await
            .map_err(|e| RemoteError::decode(path, e))?;
        Ok(created.target_id)
    }

    async fn set_scan_speed(&self, target_id: &str, speed: ScanSpeed) -> RemoteResult<()> {
        let path = format!("targets/{}/configuration", target_id);
        let response = self
            .client
            .patch(self.endpoint(&path))
            .json(&TargetConfigurationPatch { scan_speed: speed })
            .send()
            .await
            .map_err(|e| RemoteError::transport(&path, e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::UnexpectedStatus {
                endpoint: path,
                status: response.status().as_u16(),
            })
        }
    }

    async fn running_scan_count(&self) -> RemoteResult<u64> {
        let stats: UsageStats = self.get_json("me/stats").await?;
        Ok(stats.scans_running_count)
    }

    async fn create_scan(&self, target_id: &str, profile_id: &str) -> RemoteResult<()> {
        let path = "scans";
        let body = NewScan {
            target_id,
            profile_id,
            schedule: ScanSchedule::immediate(),
        };
        let response = self
            .client
            .post(self.endpoint(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(path, e))?;
        expect_status(path, response, StatusCode::CREATED).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one connection per scripted response, recording each raw request
    async fn stub_scanner(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn client_for(base_url: &str) -> RemoteServiceClient {
        let mut config = RunConfig::new(base_url, "secret-key");
        config.accept_invalid_certs = false;
        RemoteServiceClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_api_prefix() {
        let client = client_for("https://scanner:13443/");
        assert_eq!(
            client.endpoint("me/stats"),
            "https://scanner:13443/api/v1/me/stats"
        );
        assert_eq!(
            client.endpoint("/targets/abc/configuration"),
            "https://scanner:13443/api/v1/targets/abc/configuration"
        );
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        let config = RunConfig::new("https://scanner/", "bad\nkey");
        let err = RemoteServiceClient::new(&config).unwrap_err();
        assert!(matches!(err, RemoteError::ClientBuild { .. }));
    }

    #[test]
    fn test_debug_output_hides_credentials() {
        let client = client_for("https://scanner/");
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("https://scanner/"));
        assert!(!rendered.contains("secret-key"));
    }

    #[tokio::test]
    async fn test_connectivity_sends_auth_header() {
        let (base_url, server) = stub_scanner(vec![(200, "{}")]).await;
        let client = client_for(&base_url);

        client.check_connectivity().await.unwrap();

        let requests = server.await.unwrap();
        let request = requests[0].to_ascii_lowercase();
        assert!(request.starts_with("get /api/v1/info "));
        assert!(request.contains("x-auth: secret-key"));
        assert!(request.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn test_connectivity_requires_200() {
        let (base_url, server) = stub_scanner(vec![(401, "{}")]).await;
        let client = client_for(&base_url);

        let err = client.check_connectivity().await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::UnexpectedStatus {
                endpoint: "info".to_string(),
                status: 401
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_target_posts_metadata_and_reads_id() {
        let (base_url, server) = stub_scanner(vec![(201, r#"{"target_id":"t-42"}"#)]).await;
        let client = client_for(&base_url);

        let id = client.create_target("a.com").await.unwrap();
        assert_eq!(id, "t-42");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/v1/targets "));
        assert!(requests[0].contains(r#""address":"a.com""#));
        assert!(requests[0].contains(r#""description":"awvs-auto""#));
        assert!(requests[0].contains(r#""criticality":"10""#));
    }

    #[tokio::test]
    async fn test_create_target_rejects_200() {
        let (base_url, server) = stub_scanner(vec![(200, r#"{"target_id":"t-42"}"#)]).await;
        let client = client_for(&base_url);

        assert!(client.create_target("a.com").await.is_err());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_running_scans_and_stats() {
        let scans = r#"{"scans":[
            {"target_id":"t1","current_session":{"status":"processing"}},
            {"target_id":"t2","current_session":{"status":"completed"}}
        ]}"#;
        let (base_url, server) =
            stub_scanner(vec![(200, scans), (200, r#"{"scans_running_count":3}"#)]).await;
        let client = client_for(&base_url);

        let running = client.list_running_scans().await.unwrap();
        assert_eq!(running.len(), 1);
        assert!(running.contains("t1"));
        assert_eq!(client.running_scan_count().await.unwrap(), 3);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /api/v1/scans "));
        assert!(requests[1].starts_with("GET /api/v1/me/stats "));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (base_url, server) = stub_scanner(vec![(200, "not json")]).await;
        let client = client_for(&base_url);

        let err = client.list_targets().await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_without_count_never_admits() {
        use crate::notifications::api::MemorySink;
        use crate::scheduler::{ScanAdmissionController, TickOutcome};
        use std::collections::HashSet;

        let (base_url, server) = stub_scanner(vec![(200, r#"{"error":"license"}"#)]).await;
        let mut config = RunConfig::new(base_url.as_str(), "secret-key");
        config.accept_invalid_certs = false;
        config.max_concurrent_tasks = 1;
        let client = RemoteServiceClient::new(&config).unwrap();
        let sink = MemorySink::new();

        let identifiers = [("a.com".to_string(), "t1".to_string())].into_iter().collect();
        let outcome = ScanAdmissionController::new(&client, &sink, &config)
            .tick(
                &"a.com".to_string(),
                &identifiers,
                &mut RunningScanSet::new(),
                &mut HashSet::new(),
            )
            .await;

        assert_eq!(outcome, TickOutcome::Deferred);
        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /api/v1/me/stats "));
    }

    #[tokio::test]
    async fn test_create_scan_and_speed_patch() {
        let (base_url, server) = stub_scanner(vec![(200, "{}"), (201, "{}"), (409, "{}")]).await;
        let client = client_for(&base_url);

        client.set_scan_speed("t1", ScanSpeed::Fast).await.unwrap();
        client
            .create_scan("t1", "11111111-1111-1111-1111-111111111111")
            .await
            .unwrap();
        assert!(client
            .create_scan("t1", "11111111-1111-1111-1111-111111111111")
            .await
            .is_err());

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("PATCH /api/v1/targets/t1/configuration "));
        assert!(requests[0].contains(r#"{"scan_speed":"fast"}"#));
        assert!(requests[1].starts_with("POST /api/v1/scans "));
        assert!(requests[1].contains(r#""schedule":{"disable":false,"start_date":null,"time_sensitive":false}"#));
    }

    #[tokio::test]
    async fn test_unreachable_scanner_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = client_for(&base_url);
        let err = client.check_connectivity().await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport { .. }));
    }
}
