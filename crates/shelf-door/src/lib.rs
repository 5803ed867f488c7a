//! HTTP door relay.
//!
//! The door controller exposes `GET /door` (open) and `GET /lock` (lock) on a
//! private network. Any 2xx counts as success; the body is ignored.

use std::time::Duration;

use async_trait::async_trait;
use shelf_core::{
    door::{DoorAction, DoorRelay, RelayOutcome},
    errors::Error,
    Result,
};

#[derive(Clone, Debug)]
pub struct HttpDoorRelay {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDoorRelay {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("door client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn url_for(&self, action: DoorAction) -> String {
        format!("{}{}", self.base_url, action.endpoint_path())
    }
}

#[async_trait]
impl DoorRelay for HttpDoorRelay {
    async fn trigger(&self, action: DoorAction) -> Result<RelayOutcome> {
        let url = self.url_for(action);
        tracing::debug!(%url, "calling door service");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::External(format!("door service request error: {e}")))?;

        let status = resp.status().as_u16();
        tracing::debug!(status, "door service responded");
        Ok(RelayOutcome { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP responder; yields the request line it saw.
    async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response =
                format!("HTTP/1.1 {status_line}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok");
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn endpoints_are_joined_to_the_base_url() {
        let relay = HttpDoorRelay::new("http://door.local:5458/", Duration::from_secs(1)).unwrap();
        assert_eq!(relay.url_for(DoorAction::Open), "http://door.local:5458/door");
        assert_eq!(relay.url_for(DoorAction::Lock), "http://door.local:5458/lock");
    }

    #[tokio::test]
    async fn open_hits_door_endpoint_and_reports_success() {
        let (base, server) = serve_once("200 OK").await;
        let relay = HttpDoorRelay::new(base, Duration::from_secs(5)).unwrap();

        let outcome = relay.trigger(DoorAction::Open).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(server.await.unwrap(), "GET /door HTTP/1.1");
    }

    #[tokio::test]
    async fn non_2xx_is_an_outcome_not_an_error() {
        let (base, server) = serve_once("503 Service Unavailable").await;
        let relay = HttpDoorRelay::new(base, Duration::from_secs(5)).unwrap();

        let outcome = relay.trigger(DoorAction::Lock).await.unwrap();

        assert_eq!(outcome.status, 503);
        assert!(!outcome.is_success());
        assert_eq!(server.await.unwrap(), "GET /lock HTTP/1.1");
    }

    #[tokio::test]
    async fn unreachable_service_is_an_external_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let relay = HttpDoorRelay::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();

        assert!(matches!(
            relay.trigger(DoorAction::Open).await,
            Err(Error::External(_))
        ));
    }
}
