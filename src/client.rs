//! Self-check client: wait for the server, write one value, read it back.

use std::error::Error as _;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use reqwest::{header, Client, StatusCode};
use tokio::time::{sleep, timeout};

use crate::codec::{Codec, CodecKind, Locator, LocatorCodec, TimestampCodec};
use crate::errors::ClientError;

lazy_static! {
    // Local traffic only; never route it through a proxy.
    static ref HTTP_CLIENT: Client = Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| Client::new());
}

/// Block until `url` accepts connections.
///
/// The first attempt goes out immediately, later ones every `interval`. Only a
/// refused connection counts as "not ready"; any response at all, or any
/// other error, ends the wait.
pub async fn wait_for_server(client: &Client, url: &str, interval: Duration) {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match client.get(url).send().await {
            Err(e) if is_connection_refused(&e) => {
                tracing::debug!("server at {url} not ready (attempt {attempts})");
                sleep(interval).await;
            }
            Err(e) => {
                tracing::debug!("readiness check of {url} failed, treating as ready: {e}");
                return;
            }
            Ok(_) => {
                tracing::debug!("server at {url} ready after {attempts} attempt(s)");
                return;
            }
        }
    }
}

/// [`wait_for_server`] with an optional upper bound.
pub async fn wait_for_server_within(
    client: &Client,
    url: &str,
    interval: Duration,
    limit: Option<Duration>,
) -> Result<(), ClientError> {
    match limit {
        Some(limit) => timeout(limit, wait_for_server(client, url, interval))
            .await
            .map_err(|_| ClientError::NotReady),
        None => {
            wait_for_server(client, url, interval).await;
            Ok(())
        }
    }
}

/// Whether `err` was caused by `ECONNREFUSED` anywhere down its source chain.
pub fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// One `POST /time` followed by one `GET /time`, no retries.
///
/// Returns the payload decoded from the read.
pub async fn round_trip<C: Codec>(
    client: &Client,
    base_url: &str,
    codec: &C,
    payload: &C::Payload,
) -> Result<C::Payload, ClientError> {
    let url = format!("{base_url}/time");

    let response = client
        .post(&url)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(codec.encode(payload))
        .send()
        .await?;
    ensure_ok(response.status())?;

    let response = client.get(&url).send().await?;
    ensure_ok(response.status())?;

    let text = response.text().await?;
    Ok(codec.decode(&text)?)
}

fn ensure_ok(status: StatusCode) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status(status))
    }
}

/// Write the current time as a decimal timestamp and read it back.
pub async fn timestamp_handshake(client: &Client, base_url: &str) -> Result<String, ClientError> {
    let codec = TimestampCodec;
    let sent = codec.now()?;

    let received = round_trip(client, base_url, &codec, &sent).await?;
    Ok(match received.to_datetime() {
        Some(at) => format!("{} ({})", received, at.to_rfc3339()),
        None => received.to_string(),
    })
}

/// Write the address of a local time value and read the value back through
/// the locator the server returns.
pub async fn locator_handshake(client: &Client, base_url: &str) -> Result<String, ClientError> {
    let codec = LocatorCodec;
    let now: Box<DateTime<Utc>> = Box::new(Utc::now());
    let sent = Locator::of(now.as_ref());

    let received = round_trip(client, base_url, &codec, &sent).await?;
    if received != sent {
        return Err(ClientError::LocatorMismatch {
            sent: sent.to_string(),
            received: received.to_string(),
        });
    }

    // SAFETY: `received` equals the address of `now`, which is owned by this
    // frame and outlives the borrow.
    let value = unsafe { received.resolve::<DateTime<Utc>>() };
    Ok(value.map(|v| v.timestamp().to_string()).unwrap_or_default())
}

/// Full handshake against a server using `kind`: wait, write, read.
///
/// Returns the decoded value in printable form.
pub async fn run_handshake(
    kind: CodecKind,
    base_url: &str,
    interval: Duration,
    limit: Option<Duration>,
) -> Result<String, ClientError> {
    run_handshake_with(&HTTP_CLIENT, kind, base_url, interval, limit).await
}

pub async fn run_handshake_with(
    client: &Client,
    kind: CodecKind,
    base_url: &str,
    interval: Duration,
    limit: Option<Duration>,
) -> Result<String, ClientError> {
    wait_for_server_within(client, base_url, interval, limit).await?;
    tracing::info!("server at {base_url} is ready, running {kind} handshake");

    match kind {
        CodecKind::Timestamp => timestamp_handshake(client, base_url).await,
        CodecKind::Locator => locator_handshake(client, base_url).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_configured_app;
    use crate::config::AppConfig;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    fn test_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    async fn spawn_server(kind: CodecKind) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cfg = AppConfig {
            codec: kind,
            ..AppConfig::default()
        };
        tokio::spawn(async move {
            axum::serve(listener, build_configured_app(cfg)).await.unwrap();
        });
        addr
    }

    /// An address nothing listens on: bind, note the port, release it.
    async fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn refused_connection_is_detected() {
        let addr = closed_addr().await;
        let err = test_client()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();

        assert!(is_connection_refused(&err), "{err:?}");
    }

    #[tokio::test]
    async fn wait_returns_once_server_starts() {
        let addr = closed_addr().await;
        let cfg = AppConfig::default();

        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, build_configured_app(cfg)).await.unwrap();
        });

        let waited = timeout(
            Duration::from_secs(10),
            wait_for_server(&test_client(), &format!("http://{addr}"), Duration::from_millis(50)),
        )
        .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn first_attempt_is_not_delayed() {
        let addr = spawn_server(CodecKind::Timestamp).await;

        // Far longer than the bound below: only an immediate first attempt fits.
        let waited = timeout(
            Duration::from_secs(2),
            wait_for_server(&test_client(), &format!("http://{addr}"), Duration::from_secs(60)),
        )
        .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn bounded_wait_gives_up() {
        let addr = closed_addr().await;

        let result = wait_for_server_within(
            &test_client(),
            &format!("http://{addr}"),
            Duration::from_millis(20),
            Some(Duration::from_millis(150)),
        )
        .await;
        assert!(matches!(result, Err(ClientError::NotReady)));
    }

    #[tokio::test]
    async fn timestamp_handshake_round_trips() {
        let addr = spawn_server(CodecKind::Timestamp).await;
        let printed = run_handshake_with(
            &test_client(),
            CodecKind::Timestamp,
            &format!("http://{addr}"),
            Duration::from_millis(20),
            Some(Duration::from_secs(10)),
        )
        .await
        .unwrap();

        let seconds: i64 = printed.split_whitespace().next().unwrap().parse().unwrap();
        assert!((Utc::now().timestamp() - seconds).abs() < 60, "{printed}");
    }

    #[tokio::test]
    async fn locator_handshake_reads_through_the_address() {
        let addr = spawn_server(CodecKind::Locator).await;
        let printed = run_handshake_with(
            &test_client(),
            CodecKind::Locator,
            &format!("http://{addr}"),
            Duration::from_millis(20),
            Some(Duration::from_secs(10)),
        )
        .await
        .unwrap();

        let seconds: i64 = printed.parse().unwrap();
        assert!((Utc::now().timestamp() - seconds).abs() < 60, "{printed}");
    }

    #[tokio::test]
    async fn round_trip_surfaces_rejections() {
        let addr = spawn_server(CodecKind::Locator).await;

        // A timestamp sent to a locator server is rejected with 400.
        let codec = TimestampCodec;
        let payload = codec.decode("1732483484").unwrap();
        let err = round_trip(&test_client(), &format!("http://{addr}"), &codec, &payload)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status(StatusCode::BAD_REQUEST)), "{err:?}");
    }
}
