use futures_util::StreamExt;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{ExtractError, Result};

/// Direct HTTP(S) retrieval of a stream to a local file.
///
/// Automatic redirects are disabled on the client; redirects are followed by
/// an explicit bounded loop so a redirect cycle terminates with
/// `TooManyRedirects` instead of recursing forever.
pub struct StreamFetcher {
    client: Client,
    max_redirects: usize,
}

impl StreamFetcher {
    pub fn new(max_redirects: usize) -> Result<Self> {
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self {
            client,
            max_redirects,
        })
    }

    /// Retrieve `stream_url` and write the body byte-for-byte to
    /// `destination`. On failure a partially written destination file may
    /// remain; the caller owns its cleanup.
    pub async fn fetch(&self, stream_url: &str, destination: &Path) -> Result<()> {
        let mut current = Url::parse(stream_url)
            .map_err(|_| ExtractError::InvalidUrl(stream_url.to_string()))?;

        // one initial request plus up to max_redirects follow-ups
        for _ in 0..=self.max_redirects {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(ExtractError::DownloadFailed {
                        status: status.as_u16(),
                    })?;

                // Location may be relative; resolve against the current URL
                current = current
                    .join(location)
                    .map_err(|_| ExtractError::InvalidRedirect(location.to_string()))?;
                tracing::debug!("Following redirect to {}", current);
                continue;
            }

            if !status.is_success() {
                return Err(ExtractError::DownloadFailed {
                    status: status.as_u16(),
                });
            }

            return write_body(response, destination).await;
        }

        Err(ExtractError::TooManyRedirects(self.max_redirects))
    }
}

async fn write_body(response: reqwest::Response, destination: &Path) -> Result<()> {
    let mut file = File::create(destination).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }

    file.flush().await?;
    Ok(())
}
