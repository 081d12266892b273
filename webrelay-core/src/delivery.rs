//! Fan-out delivery
//!
//! Forwards one publication to every subscriber in a registry snapshot and
//! reports the subscribers whose delivery failed at the transport level.
//! A subscriber answering with a non-2xx status still counts as delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::registry::SubscriberRegistry;
use crate::Result;

/// Content type declared on every outbound delivery
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Aggregate outcome of one publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Per-process sequence number, for log correlation
    pub publication_id: u64,
    /// Number of subscribers in the snapshot
    pub attempted: usize,
    /// Subscribers whose delivery did not complete, in snapshot order
    pub failed: Vec<String>,
}

impl DeliveryReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Broadcasts payloads to the subscribers of a registry.
pub struct FanOut {
    registry: Arc<SubscriberRegistry>,
    client: Client,
    max_concurrent: usize,
    next_publication: AtomicU64,
}

impl FanOut {
    /// Create a fan-out over `registry` with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `Error::HttpClient` if the HTTP client cannot be built.
    pub fn new(registry: Arc<SubscriberRegistry>, config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            registry,
            client,
            max_concurrent: config.max_concurrent.max(1),
            next_publication: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Deliver `payload` to every current subscriber.
    ///
    /// Deliveries run concurrently up to the configured limit. Every
    /// delivery of one call targets the same snapshot; registrations made
    /// meanwhile take effect from the next publication.
    pub async fn publish(&self, payload: Bytes) -> DeliveryReport {
        let publication_id = self.next_publication.fetch_add(1, Ordering::Relaxed);
        let targets = self.registry.snapshot();
        let attempted = targets.len();

        debug!(
            publication_id,
            subscribers = attempted,
            payload_bytes = payload.len(),
            "Publishing"
        );

        let failed: Vec<String> = stream::iter(targets)
            .map(|url| {
                let payload = payload.clone();
                async move {
                    match self.deliver(&url, payload).await {
                        Ok(_) => None,
                        Err(e) => {
                            warn!(
                                publication_id,
                                url = %url,
                                timeout = e.is_timeout(),
                                connect = e.is_connect(),
                                error = %e,
                                "Delivery failed"
                            );
                            Some(url)
                        }
                    }
                }
            })
            .buffered(self.max_concurrent)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        info!(
            publication_id,
            attempted,
            failed = failed.len(),
            "Publication finished"
        );

        DeliveryReport {
            publication_id,
            attempted,
            failed,
        }
    }

    /// POST the payload to one subscriber.
    async fn deliver(&self, url: &str, payload: Bytes) -> std::result::Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Delivered");
        } else {
            warn!(url = %url, status = status.as_u16(), "Subscriber answered with non-success status");
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A local URL nobody listens on.
    ///
    /// The port is released before use, so another process could grab it in
    /// between; the window is small enough for tests.
    fn refused_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/hook")
    }

    fn fanout(registry: Arc<SubscriberRegistry>) -> FanOut {
        let config = DeliveryConfig {
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
            ..DeliveryConfig::default()
        };
        FanOut::new(registry, &config).unwrap()
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers() {
        let fanout = fanout(Arc::new(SubscriberRegistry::new()));

        let report = fanout.publish(Bytes::from_static(b"{}")).await;

        assert_eq!(report.attempted, 0);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_payload_and_content_type_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"x":1}"#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let registry = Arc::new(SubscriberRegistry::new());
        registry.add(&format!("{}/hook", server.uri()));
        let fanout = fanout(registry);

        let report = fanout.publish(Bytes::from_static(br#"{"x":1}"#)).await;

        assert_eq!(report.attempted, 1);
        assert!(report.is_success());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_refused_subscriber_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let down = refused_url();
        let registry = Arc::new(SubscriberRegistry::new());
        registry.add(&server.uri());
        registry.add(&down);
        let fanout = fanout(registry);

        let report = fanout.publish(Bytes::from_static(br#"{"x":1}"#)).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, vec![down]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let registry = Arc::new(SubscriberRegistry::new());
        registry.add(&server.uri());
        let fanout = fanout(registry);

        let report = fanout.publish(Bytes::from_static(b"[]")).await;

        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_failures_follow_snapshot_order() {
        let registry = Arc::new(SubscriberRegistry::new());
        let down: std::collections::BTreeSet<String> = (0..4).map(|_| refused_url()).collect();
        for url in &down {
            registry.add(url);
        }
        let down: Vec<String> = down.into_iter().collect();

        let config = DeliveryConfig {
            max_concurrent: 3,
            ..DeliveryConfig::default()
        };
        let fanout = FanOut::new(registry, &config).unwrap();

        let report = fanout.publish(Bytes::from_static(b"{}")).await;

        assert_eq!(report.failed, down);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
            .mount(&server)
            .await;

        let registry = Arc::new(SubscriberRegistry::new());
        registry.add(&server.uri());
        let config = DeliveryConfig {
            timeout_seconds: 1,
            ..DeliveryConfig::default()
        };
        let fanout = FanOut::new(registry, &config).unwrap();

        let report = fanout.publish(Bytes::from_static(b"{}")).await;

        assert_eq!(report.failed, vec![server.uri()]);
    }

    #[tokio::test]
    async fn test_publication_ids_increase() {
        let fanout = fanout(Arc::new(SubscriberRegistry::new()));

        let first = fanout.publish(Bytes::new()).await;
        let second = fanout.publish(Bytes::new()).await;

        assert!(second.publication_id > first.publication_id);
    }
}
