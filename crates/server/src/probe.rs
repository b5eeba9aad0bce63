//! Backend probing for the Model-List Access Filter (G, spec.md §4.5).
//!
//! Probes `{endpointUrl}/v1/models` with the caller's `Authorization`
//! header forwarded verbatim, classifies the response, and retries
//! transient failures with the same bounded jittered backoff the
//! reconcilers use (`maas_core::probe_backoff`).

use std::time::Duration;

use futures::stream::{self, StreamExt};
use maas_core::probe_backoff;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 4;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;
const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Granted,
    Denied,
}

/// Builds the shared client probes use. TLS verification may be disabled
/// for intra-cluster probes (spec.md §4.5 "trust boundary the design
/// accepts"); `verify_tls` comes from server config.
///
/// # Panics
/// Panics if the underlying TLS backend fails to initialize, mirroring
/// `reqwest::ClientBuilder::build`'s own panics-on-misconfiguration surface.
#[must_use]
pub fn build_client(verify_tls: bool) -> Client {
    Client::builder()
        .danger_accept_invalid_certs(!verify_tls)
        .timeout(PROBE_TIMEOUT)
        .build()
        .expect("failed to build probe HTTP client")
}

fn classify(status: StatusCode) -> Option<ProbeOutcome> {
    if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
        Some(ProbeOutcome::Granted)
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) {
        Some(ProbeOutcome::Denied)
    } else {
        None // 5xx: retry
    }
}

/// Probes a single model endpoint, retrying 5xx/transport errors with
/// bounded jittered backoff before denying on exhaustion (spec.md §4.5
/// step 3).
pub async fn probe_one(client: &Client, endpoint_url: &str, authorization: Option<&str>) -> ProbeOutcome {
    let url = format!("{}/v1/models", endpoint_url.trim_end_matches('/'));

    for attempt in 0..MAX_ATTEMPTS {
        let mut request = client.get(&url);
        if let Some(auth) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        match request.send().await {
            Ok(response) => {
                if let Some(outcome) = classify(response.status()) {
                    if outcome == ProbeOutcome::Granted {
                        if !body_within_cap(response).await {
                            debug!(url, "probe_response_exceeded_body_cap");
                            return ProbeOutcome::Denied;
                        }
                    }
                    return outcome;
                }
                warn!(url, status = %response.status(), attempt, "probe_transient_failure");
            }
            Err(err) => {
                warn!(url, error = %err, attempt, "probe_transport_error");
            }
        }

        if attempt + 1 < MAX_ATTEMPTS {
            tokio::time::sleep(probe_backoff(attempt, rand::random())).await;
        }
    }

    ProbeOutcome::Denied
}

async fn body_within_cap(response: reqwest::Response) -> bool {
    if let Some(len) = response.content_length() {
        if len > MAX_BODY_BYTES {
            return false;
        }
    }
    let mut stream = response.bytes_stream();
    let mut total: u64 = 0;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                total += bytes.len() as u64;
                if total > MAX_BODY_BYTES {
                    return false;
                }
            }
            Err(_) => return false,
        }
    }
    true
}

/// Probes every `(model, endpoint_url)` pair with bounded concurrency
/// (cap ~10, spec.md §4.5 step 4), returning only the granted subset.
pub async fn probe_all(client: &Client, targets: Vec<(String, String)>, authorization: Option<&str>) -> Vec<String> {
    let results: Vec<(String, ProbeOutcome)> = stream::iter(targets)
        .map(|(model, endpoint_url)| {
            let client = client.clone();
            let authorization = authorization.map(str::to_owned);
            async move {
                let outcome = probe_one(&client, &endpoint_url, authorization.as_deref()).await;
                (model, outcome)
            }
        })
        .buffer_unordered(MAX_CONCURRENCY)
        .collect()
        .await;

    let mut granted: Vec<String> = results.into_iter().filter(|(_, outcome)| *outcome == ProbeOutcome::Granted).map(|(model, _)| model).collect();
    granted.sort();
    granted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_2xx_is_granted() {
        assert_eq!(classify(StatusCode::OK), Some(ProbeOutcome::Granted));
    }

    #[test]
    fn classify_405_is_granted() {
        assert_eq!(classify(StatusCode::METHOD_NOT_ALLOWED), Some(ProbeOutcome::Granted));
    }

    #[test]
    fn classify_401_403_404_are_denied() {
        assert_eq!(classify(StatusCode::UNAUTHORIZED), Some(ProbeOutcome::Denied));
        assert_eq!(classify(StatusCode::FORBIDDEN), Some(ProbeOutcome::Denied));
        assert_eq!(classify(StatusCode::NOT_FOUND), Some(ProbeOutcome::Denied));
    }

    #[test]
    fn classify_5xx_is_none_signalling_retry() {
        assert_eq!(classify(StatusCode::INTERNAL_SERVER_ERROR), None);
        assert_eq!(classify(StatusCode::BAD_GATEWAY), None);
    }
}
