use std::future::Future;
use std::time::Duration;

use image::DynamicImage;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::{Result, StreetViewError};
use crate::params::RequestParameters;
use crate::types::{MetadataStatus, PanoramaMetadata};

pub const METADATA_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview/metadata";
pub const STREETVIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";

/// The two Street View Static API calls the resolver needs.
///
/// [`HttpProvider`] is the real implementation. Anything else (a recording
/// fake in tests, a proxy) can stand in for it.
pub trait StreetViewProvider {
    /// Look up the panorama nearest `params.location`.
    ///
    /// A non-OK `status` in the response is not an error at this level; the
    /// caller decides what it means.
    fn fetch_metadata(
        &self,
        params: &RequestParameters,
    ) -> impl Future<Output = Result<PanoramaMetadata>> + Send;

    /// Fetch and decode the view described by `params`.
    fn fetch_image(
        &self,
        params: &RequestParameters,
    ) -> impl Future<Output = Result<DynamicImage>> + Send;
}

/// Talks to the Google endpoints over a reusable reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    metadata_endpoint: String,
    streetview_endpoint: String,
}

impl HttpProvider {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a preconfigured client (proxies, custom headers, timeouts).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            metadata_endpoint: METADATA_ENDPOINT.to_string(),
            streetview_endpoint: STREETVIEW_ENDPOINT.to_string(),
        }
    }

    /// A provider whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Point the provider at different metadata and image endpoints.
    pub fn endpoints(mut self, metadata: impl Into<String>, streetview: impl Into<String>) -> Self {
        self.metadata_endpoint = metadata.into();
        self.streetview_endpoint = streetview.into();
        self
    }

    /// Full metadata URL for `params`. Contains the API key.
    pub fn metadata_url(&self, params: &RequestParameters) -> Result<Url> {
        build_url(&self.metadata_endpoint, params)
    }

    /// Full image URL for `params`. Contains the API key.
    pub fn streetview_url(&self, params: &RequestParameters) -> Result<Url> {
        build_url(&self.streetview_endpoint, params)
    }
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StreetViewProvider for HttpProvider {
    async fn fetch_metadata(&self, params: &RequestParameters) -> Result<PanoramaMetadata> {
        let url = self.metadata_url(params)?;
        debug!(location = %params.location, radius = params.radius, "requesting panorama metadata");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, body));
        }

        let metadata: PanoramaMetadata = serde_json::from_str(&body)
            .map_err(|e| StreetViewError::ParseError(format!("metadata JSON: {e}")))?;

        if metadata.status != MetadataStatus::Ok {
            warn!(
                status = %metadata.status,
                location = %params.location,
                "metadata lookup did not return a panorama"
            );
        }
        Ok(metadata)
    }

    async fn fetch_image(&self, params: &RequestParameters) -> Result<DynamicImage> {
        let url = self.streetview_url(params)?;
        debug!(
            location = %params.location,
            heading = params.heading,
            fov = params.fov,
            "requesting street view image"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status, body));
        }

        let bytes = response.bytes().await?;
        let img = image::load_from_memory(&bytes)?;
        Ok(img)
    }
}

fn build_url(endpoint: &str, params: &RequestParameters) -> Result<Url> {
    Url::parse_with_params(endpoint, params.to_query())
        .map_err(|e| StreetViewError::InvalidArgument(format!("endpoint {endpoint:?}: {e}")))
}

/// Map a non-success HTTP status to an error. Google answers a bad key with 403.
fn rejection(status: StatusCode, body: String) -> StreetViewError {
    let message = body.trim().to_string();
    warn!(%status, "request rejected by provider");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StreetViewError::ConfigurationError(if message.is_empty() {
                status.to_string()
            } else {
                message
            })
        }
        _ => StreetViewError::ProviderError {
            status: status.to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterOverrides;
    use crate::types::LatLng;
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn params(location: &str) -> RequestParameters {
        RequestParameters::new("test_key").merged(&ParameterOverrides::new().location(location))
    }

    /// Answer one HTTP request with a canned response; yields the raw request.
    async fn serve_once(status_line: &str, content_type: &str, body: Vec<u8>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn local_provider(base: &str) -> HttpProvider {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpProvider::with_client(client).endpoints(format!("{base}/metadata"), format!("{base}/streetview"))
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_metadata_url_construction() {
        let provider = HttpProvider::new();
        let url = provider.metadata_url(&params("42.4385,-76.5032")).unwrap();
        assert!(url.as_str().starts_with(METADATA_ENDPOINT));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("location".to_string(), "42.4385,-76.5032".to_string())));
        assert!(pairs.contains(&("key".to_string(), "test_key".to_string())));
        assert!(pairs.contains(&("radius".to_string(), "50".to_string())));
    }

    #[test]
    fn test_streetview_url_encodes_address() {
        let provider = HttpProvider::new();
        let url = provider.streetview_url(&params("123 Main St, City")).unwrap();
        assert!(url.as_str().starts_with(STREETVIEW_ENDPOINT));
        assert!(!url.as_str().contains(' '));
        let location = url
            .query_pairs()
            .find(|(k, _)| k == "location")
            .map(|(_, v)| v.into_owned());
        assert_eq!(location.as_deref(), Some("123 Main St, City"));
        assert!(url.as_str().contains("size=640x640"));
    }

    #[test]
    fn test_bad_endpoint_is_invalid_argument() {
        let provider = HttpProvider::new().endpoints("not a url", "also not");
        assert!(matches!(
            provider.metadata_url(&params("x")),
            Err(StreetViewError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_metadata_parses_response() {
        let body = br#"{"status":"OK","location":{"lat":1.5,"lng":2.5},"pano_id":"p1","date":"2020-01"}"#;
        let (base, server) = serve_once("200 OK", "application/json", body.to_vec()).await;

        let meta = local_provider(&base).fetch_metadata(&params("1,2")).await.unwrap();
        assert_eq!(meta.location, Some(LatLng::new(1.5, 2.5)));
        assert_eq!(meta.pano_id.as_deref(), Some("p1"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /metadata?location=1%2C2&"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_passes_zero_results_through() {
        let (base, _server) =
            serve_once("200 OK", "application/json", br#"{"status":"ZERO_RESULTS"}"#.to_vec()).await;
        let meta = local_provider(&base).fetch_metadata(&params("0,0")).await.unwrap();
        assert_eq!(meta.status, MetadataStatus::ZeroResults);
    }

    #[tokio::test]
    async fn test_fetch_metadata_bad_json_is_parse_error() {
        let (base, _server) = serve_once("200 OK", "text/html", b"<html>oops</html>".to_vec()).await;
        let err = local_provider(&base).fetch_metadata(&params("0,0")).await.unwrap_err();
        assert!(matches!(err, StreetViewError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_fetch_image_decodes() {
        let (base, server) = serve_once("200 OK", "image/png", png_bytes(8, 4)).await;
        let img = local_provider(&base).fetch_image(&params("1,2")).await.unwrap();
        assert_eq!((img.width(), img.height()), (8, 4));
        assert!(server.await.unwrap().starts_with("GET /streetview?"));
    }

    #[tokio::test]
    async fn test_fetch_image_garbage_is_decode_error() {
        let (base, _server) = serve_once("200 OK", "image/jpeg", b"definitely not a jpeg".to_vec()).await;
        let err = local_provider(&base).fetch_image(&params("1,2")).await.unwrap_err();
        assert!(matches!(err, StreetViewError::DecodeError(_)));
    }

    #[tokio::test]
    async fn test_fetch_image_forbidden_is_configuration_error() {
        let body = b"The Google Maps Platform server rejected your request.".to_vec();
        let (base, _server) = serve_once("403 Forbidden", "text/plain", body).await;
        match local_provider(&base).fetch_image(&params("1,2")).await {
            Err(StreetViewError::ConfigurationError(msg)) => assert!(msg.contains("rejected")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_image_server_error_is_provider_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "text/plain", b"boom".to_vec()).await;
        match local_provider(&base).fetch_image(&params("1,2")).await {
            Err(StreetViewError::ProviderError { status, message }) => {
                assert!(status.starts_with("500"));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        // Accept and hold the connection without ever answering
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let provider = HttpProvider::with_timeout(Duration::from_millis(200))
            .unwrap()
            .endpoints(format!("{base}/metadata"), format!("{base}/streetview"));
        let started = std::time::Instant::now();
        let err = provider.fetch_metadata(&params("1,2")).await.unwrap_err();

        match err {
            StreetViewError::TransportError(e) => assert!(e.is_timeout(), "{e}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let err = local_provider(&base).fetch_metadata(&params("1,2")).await.unwrap_err();
        assert!(matches!(err, StreetViewError::TransportError(_)));
    }
}
