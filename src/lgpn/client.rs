//! HTTP retrieval of the LGPN name dataset.

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tracing::error;
use url::Url;

use super::decode::{ArrayDecoder, DecodeError, Poll};
use super::types::NameRecord;
use crate::cancel::CancellationToken;

/// Identifies this client to the LGPN server.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How many decoded records may sit between the decoder and the consumer.
const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("unable to build request URL: {0}")]
  BadUrl(#[from] url::ParseError),
  #[error("unable to make request: {0}")]
  Request(#[from] reqwest::Error),
  #[error("LGPN returned unexpected status: {0}")]
  UnexpectedStatus(StatusCode),
  #[error("malformed payload: {0}")]
  MalformedPayload(DecodeError),
  #[error("fetch cancelled")]
  Cancelled,
}

/// Fetch every record of the LGPN name dataset.
///
/// Issues one GET against the base URL and decodes the response body
/// incrementally. Anything detectable before the first record is produced
/// (request failure, non-200 status, a payload that is not a JSON array)
/// comes back as an error from this call. Once the receiver has been handed
/// out the channel has no error slot: later decode or network problems are
/// logged and close the channel early, so consumers observe truncation, not
/// failure.
pub(crate) async fn fetch_all(
  http: &reqwest::Client,
  endpoint: &Url,
  cancel: CancellationToken,
) -> Result<mpsc::Receiver<NameRecord>, FetchError> {
  let mut url = endpoint.join("/cgi-bin/lgpn_search.cgi")?;
  url.set_query(Some("qtype=names"));

  let res = http.get(url).send().await?;
  if res.status() != StatusCode::OK {
    // Dropping the response releases the connection and body.
    return Err(FetchError::UnexpectedStatus(res.status()));
  }

  let mut body = res.bytes_stream();
  let mut decoder = ArrayDecoder::new();

  // Decode eagerly until the first record (or the end of the array), so a
  // payload that is not an array fails this call instead of masquerading as
  // an empty dataset.
  let first = loop {
    match decoder.poll::<NameRecord>() {
      Ok(Poll::Record(record)) => break Some(record),
      Ok(Poll::End) => break None,
      Ok(Poll::Incomplete) => {
        // Racing against the token aborts the body read even when the
        // server has stalled; dropping the body closes the connection.
        let chunk = tokio::select! {
          _ = cancel.cancelled() => return Err(FetchError::Cancelled),
          chunk = body.next() => chunk,
        };

        match chunk {
          Some(chunk) => decoder.extend(&chunk?),
          None => {
            let err = if decoder.is_started() {
              DecodeError::Truncated
            } else {
              DecodeError::NotAnArray
            };
            return Err(FetchError::MalformedPayload(err));
          }
        }
      }
      Err(err) => return Err(FetchError::MalformedPayload(err)),
    }
  };

  let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

  let Some(record) = first else {
    // Empty array: tx drops here and the receiver reports end of stream.
    return Ok(rx);
  };

  tokio::spawn(async move {
    // The response body (and with it the connection) is dropped exactly
    // once, when this task returns.
    if tx.send(record).await.is_err() {
      return;
    }

    loop {
      if cancel.is_cancelled() {
        return;
      }

      match decoder.poll::<NameRecord>() {
        Ok(Poll::Record(record)) => {
          if tx.send(record).await.is_err() {
            return;
          }
        }
        Ok(Poll::End) => return,
        Ok(Poll::Incomplete) => {
          // Returning here drops the body mid-read and closes the record
          // channel, which unblocks a populate parked on it.
          let chunk = tokio::select! {
            _ = cancel.cancelled() => return,
            chunk = body.next() => chunk,
          };

          match chunk {
            Some(Ok(chunk)) => decoder.extend(&chunk),
            Some(Err(err)) => {
              error!("error reading name payload: {err}");
              return;
            }
            None => {
              error!("name payload ended before the array was closed");
              return;
            }
          }
        }
        Err(err) => {
          error!("json error in name payload: {err}");
          return;
        }
      }
    }
  });

  Ok(rx)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lgpn::testserver::TestServer;

  async fn fetch_names(server: &TestServer) -> Result<Vec<String>, FetchError> {
    let http = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .build()
      .unwrap();
    let endpoint = Url::parse(&server.url).unwrap();

    let mut records = fetch_all(&http, &endpoint, CancellationToken::new()).await?;

    let mut names = Vec::new();
    while let Some(record) = records.recv().await {
      names.push(record.name);
    }
    Ok(names)
  }

  #[tokio::test]
  async fn fetches_records_in_payload_order() {
    let server = TestServer::spawn(
      "200 OK",
      r#"[{"name":"X","notBefore":"1","notAfter":"2"},
          {"name":"Y","notBefore":"3","notAfter":"4"},
          {"name":"Z","notBefore":"5","notAfter":"6"},]"#,
    )
    .await;

    let names = fetch_names(&server).await.unwrap();
    assert_eq!(names, vec!["X", "Y", "Z"]);
  }

  #[tokio::test]
  async fn rejects_unexpected_status() {
    let server = TestServer::spawn("500 Internal Server Error", "oops").await;

    let err = fetch_names(&server).await.unwrap_err();
    assert!(matches!(
      err,
      FetchError::UnexpectedStatus(StatusCode::INTERNAL_SERVER_ERROR)
    ));
  }

  #[tokio::test]
  async fn rejects_a_payload_that_is_not_an_array() {
    let server = TestServer::spawn("200 OK", r#"{"error":"wrong shape"}"#).await;

    let err = fetch_names(&server).await.unwrap_err();
    assert!(matches!(
      err,
      FetchError::MalformedPayload(DecodeError::NotAnArray)
    ));
  }
}
