use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    model::{EventKind, EventTime, LATITUDE, LONGITUDE},
};

/// Public sunrise-sunset.org endpoint. Always queried for the fixed coordinate.
pub const SUN_API_ENDPOINT: &str = "https://api.sunrise-sunset.org/json";

/// Source of event times. Failures are reported as `None`, never as errors.
#[async_trait]
pub trait SunTimesFetcher: Send + Sync + Debug {
    async fn fetch_time(&self, kind: EventKind) -> Option<EventTime>;
}

#[derive(Debug, Clone)]
pub struct HttpSunTimesFetcher {
    endpoint: String,
    http: Client,
}

impl HttpSunTimesFetcher {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_endpoint(SUN_API_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        // No idle pool: each fetch owns its connection and drops it afterwards.
        let http = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    async fn try_fetch(&self, kind: EventKind) -> Result<EventTime, FetchError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", LATITUDE.to_string()),
                ("lng", LONGITUDE.to_string()),
                ("formatted", "0".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        parse_event_time(&body, kind)
    }
}

#[async_trait]
impl SunTimesFetcher for HttpSunTimesFetcher {
    async fn fetch_time(&self, kind: EventKind) -> Option<EventTime> {
        info!(event = %kind, endpoint = %self.endpoint, "Fetching event time");

        match self.try_fetch(kind).await {
            Ok(time) => {
                debug!(event = %kind, at = %time.at, "Event time fetched");
                Some(time)
            }
            Err(e) => {
                warn!(event = %kind, error = %e, "Failed to fetch event time");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SunApiResponse {
    results: Option<SunApiResults>,
}

#[derive(Debug, Deserialize)]
struct SunApiResults {
    sunrise: Option<String>,
    sunset: Option<String>,
}

/// Pull one event out of a sunrise-sunset.org JSON body.
pub fn parse_event_time(body: &str, kind: EventKind) -> Result<EventTime, FetchError> {
    let parsed: SunApiResponse = serde_json::from_str(body)?;
    let results = parsed.results.ok_or(FetchError::MissingResults)?;

    let raw = match kind {
        EventKind::Sunrise => results.sunrise,
        EventKind::Sunset => results.sunset,
    }
    .ok_or(FetchError::MissingField(kind))?;

    let at = DateTime::parse_from_rfc3339(&raw)
        .map_err(|source| FetchError::Timestamp {
            value: raw.clone(),
            source,
        })?
        .with_timezone(&Utc);

    Ok(EventTime { kind, at })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    const SAMPLE: &str = r#"{
        "results": {
            "sunrise": "2024-06-21T12:48:00+00:00",
            "sunset": "2024-06-22T03:35:00+00:00",
            "solar_noon": "2024-06-21T20:11:00+00:00",
            "day_length": 52620
        },
        "status": "OK",
        "tzid": "UTC"
    }"#;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Whether the peer closed the connection within a few seconds.
    async fn closed_by_peer(stream: &mut TcpStream) -> bool {
        let mut chunk = [0u8; 64];
        loop {
            match tokio::time::timeout(Duration::from_secs(5), stream.read(&mut chunk)).await {
                Ok(Ok(0)) | Ok(Err(_)) => return true,
                Ok(Ok(_)) => continue,
                Err(_) => return false,
            }
        }
    }

    /// Serve one canned response. The handle yields the request line and
    /// whether the client released the connection afterwards.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<(String, bool)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let released = closed_by_peer(&mut stream).await;
            let request_line = request.lines().next().unwrap_or_default().to_string();
            (request_line, released)
        });

        (format!("http://{addr}/json"), handle)
    }

    #[test]
    fn parses_both_events() {
        let sunrise = parse_event_time(SAMPLE, EventKind::Sunrise).unwrap();
        let sunset = parse_event_time(SAMPLE, EventKind::Sunset).unwrap();

        assert_eq!(sunrise.at, utc("2024-06-21T12:48:00Z"));
        assert_eq!(sunset.kind, EventKind::Sunset);
        assert_eq!(sunset.at, utc("2024-06-22T03:35:00Z"));
    }

    #[test]
    fn accepts_zulu_suffix() {
        let body = r#"{"results":{"sunrise":"2024-06-21T05:45:00Z","sunset":"x"}}"#;
        let sunrise = parse_event_time(body, EventKind::Sunrise).unwrap();
        assert_eq!(sunrise.at, utc("2024-06-21T05:45:00+00:00"));
    }

    #[test]
    fn missing_results_is_an_error() {
        let err = parse_event_time(r#"{"status":"OK"}"#, EventKind::Sunrise).unwrap_err();
        assert!(matches!(err, FetchError::MissingResults));
    }

    #[test]
    fn missing_field_is_an_error() {
        let body = r#"{"results":{"sunrise":"2024-06-21T05:45:00+00:00"}}"#;
        let err = parse_event_time(body, EventKind::Sunset).unwrap_err();
        assert!(matches!(err, FetchError::MissingField(EventKind::Sunset)));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let body = r#"{"results":{"sunrise":"5:45:00 AM","sunset":"2024-06-22T03:35:00+00:00"}}"#;
        let err = parse_event_time(body, EventKind::Sunrise).unwrap_err();
        assert!(matches!(err, FetchError::Timestamp { .. }));
        assert!(err.to_string().contains("5:45:00 AM"));
        assert!(parse_event_time(body, EventKind::Sunset).is_ok());
    }

    #[test]
    fn error_status_payload_is_an_error() {
        // The API reports failures with an empty string in place of `results`.
        let body = r#"{"results":"","status":"INVALID_REQUEST"}"#;
        let err = parse_event_time(body, EventKind::Sunrise).unwrap_err();
        assert!(matches!(err, FetchError::Json(_)));
    }

    #[test]
    fn truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn fetches_from_server_and_releases_connection() {
        let (endpoint, server) = serve_once("200 OK", SAMPLE).await;
        let fetcher = HttpSunTimesFetcher::with_endpoint(endpoint).unwrap();

        let sunrise = fetcher.fetch_time(EventKind::Sunrise).await;
        assert_eq!(sunrise.map(|t| t.at), Some(utc("2024-06-21T12:48:00Z")));

        let (request_line, released) = server.await.unwrap();
        assert!(request_line.starts_with("GET /json?"));
        assert!(request_line.contains("lat=37.7749"));
        assert!(request_line.contains("lng=-122.4194"));
        assert!(request_line.contains("formatted=0"));
        assert!(released);
    }

    #[tokio::test]
    async fn malformed_response_yields_none() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;
        let fetcher = HttpSunTimesFetcher::with_endpoint(endpoint).unwrap();

        assert!(fetcher.fetch_time(EventKind::Sunset).await.is_none());
        assert!(server.await.unwrap().1);
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let (endpoint, server) = serve_once("500 Internal Server Error", SAMPLE).await;
        let fetcher = HttpSunTimesFetcher::with_endpoint(endpoint).unwrap();

        assert!(fetcher.fetch_time(EventKind::Sunrise).await.is_none());
        assert!(server.await.unwrap().1);
    }

    #[tokio::test]
    async fn connection_refused_yields_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpSunTimesFetcher::with_endpoint(format!("http://{addr}/json")).unwrap();
        assert!(fetcher.fetch_time(EventKind::Sunrise).await.is_none());
    }

    #[tokio::test]
    async fn abandoned_fetch_releases_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accepts and reads the request, then never answers.
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            closed_by_peer(&mut stream).await
        });

        let fetcher = HttpSunTimesFetcher::with_endpoint(format!("http://{addr}/json")).unwrap();
        let outcome = tokio::time::timeout(
            Duration::from_millis(300),
            fetcher.fetch_time(EventKind::Sunrise),
        )
        .await;

        assert!(outcome.is_err(), "hanging server must not produce a value");
        assert!(server.await.unwrap());
    }
}
