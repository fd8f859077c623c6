//! Retrieval of Greek personal names from the Lexicon of Greek Personal
//! Names (LGPN), backed by a local SQLite cache.
//!
//! The first call downloads the full dataset and persists it in a single
//! transaction; every later call streams names straight from the cache.

mod client;
mod decode;
mod types;

pub use client::FetchError;
pub use types::NameRecord;

use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;
use url::Url;

use crate::cache::{CacheError, NameCache};
use crate::cancel::CancellationToken;
use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum NamesError {
  #[error("unable to build HTTP client: {0}")]
  Http(#[source] reqwest::Error),
  #[error("name cache error: {0}")]
  Cache(#[from] CacheError),
  #[error("unable to download names: {0}")]
  Fetch(#[from] FetchError),
  #[error("name retrieval cancelled")]
  Cancelled,
  #[error("cache population task failed: {0}")]
  Join(#[from] task::JoinError),
}

/// Handles fetching and caching of names from the LGPN.
pub struct Client {
  endpoint: Url,
  cache_dir: PathBuf,
  http: reqwest::Client,
}

impl Client {
  pub fn new(config: &Config) -> Result<Self, NamesError> {
    let http = reqwest::Client::builder()
      .user_agent(client::USER_AGENT)
      .build()
      .map_err(NamesError::Http)?;

    Ok(Self {
      endpoint: config.endpoint.clone(),
      cache_dir: config.cache_dir.clone(),
      http,
    })
  }

  /// Return a channel that receives every name in the LGPN.
  ///
  /// On a cold cache the dataset is downloaded first, fed record by record
  /// into the insert transaction, so memory stays bounded regardless of
  /// dataset size. The channel closes after the last name has been read,
  /// when `cancel` fires, or when the receiver is dropped.
  pub async fn names(
    &self,
    cancel: CancellationToken,
  ) -> Result<mpsc::Receiver<String>, NamesError> {
    let mut cache = NameCache::open(&self.cache_dir)?;

    // A second concurrent cold call can race this check and populate twice;
    // accepted for a single-process CLI.
    if cache.count()? == 0 {
      info!("downloading name list and building cache (this may take a minute)");

      let records = client::fetch_all(&self.http, &self.endpoint, cancel.clone())
        .await
        .map_err(|err| match err {
          FetchError::Cancelled => NamesError::Cancelled,
          other => NamesError::Fetch(other),
        })?;

      let populate_cancel = cancel.clone();
      cache = task::spawn_blocking(move || {
        let result = cache.populate(records, &populate_cancel);
        result.map(|()| cache)
      })
      .await?
      .map_err(|err| match err {
        CacheError::Interrupted => NamesError::Cancelled,
        other => NamesError::Cache(other),
      })?;

      info!("name cache built");
    }

    Ok(cache.into_name_stream(cancel)?)
  }
}

#[cfg(test)]
pub(crate) mod testserver {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  /// Minimal one-response HTTP server standing in for the LGPN endpoint.
  pub(crate) struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
  }

  impl TestServer {
    /// Serve `body` with `status` (e.g. "200 OK") to every connection until
    /// dropped or closed.
    pub(crate) async fn spawn(status: &'static str, body: &'static str) -> TestServer {
      let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
      let addr = listener.local_addr().unwrap();
      let hits = Arc::new(AtomicUsize::new(0));
      let hits_counter = hits.clone();

      let handle = tokio::spawn(async move {
        loop {
          let Ok((mut sock, _)) = listener.accept().await else {
            return;
          };
          hits_counter.fetch_add(1, Ordering::SeqCst);

          // Drain the request head; GET requests fit in one read.
          let mut buf = [0u8; 2048];
          let _ = sock.read(&mut buf).await;

          let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
          );
          let _ = sock.write_all(response.as_bytes()).await;
          let _ = sock.shutdown().await;
        }
      });

      TestServer {
        url: format!("http://{addr}"),
        hits,
        handle,
      }
    }

    /// Serve the response head and `partial_body`, then hold the socket
    /// open without ever completing the advertised body.
    pub(crate) async fn spawn_stalling(partial_body: &'static str) -> TestServer {
      let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
      let addr = listener.local_addr().unwrap();
      let hits = Arc::new(AtomicUsize::new(0));
      let hits_counter = hits.clone();

      let handle = tokio::spawn(async move {
        let Ok((mut sock, _)) = listener.accept().await else {
          return;
        };
        hits_counter.fetch_add(1, Ordering::SeqCst);

        let mut buf = [0u8; 2048];
        let _ = sock.read(&mut buf).await;

        let response = format!(
          "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{partial_body}",
          partial_body.len() + 1_000_000,
        );
        let _ = sock.write_all(response.as_bytes()).await;

        // Keep the connection alive so the client's body read stalls.
        std::future::pending::<()>().await;
      });

      TestServer {
        url: format!("http://{addr}"),
        hits,
        handle,
      }
    }

    /// Number of requests served so far.
    pub(crate) fn hits(&self) -> usize {
      self.hits.load(Ordering::SeqCst)
    }

    /// Stop accepting connections.
    pub(crate) fn close(&self) {
      self.handle.abort();
    }
  }

  impl Drop for TestServer {
    fn drop(&mut self) {
      self.handle.abort();
    }
  }
}
