//! HTTP-backed story workflow and hint service.
//!
//! The story workflow is called with an empty JSON object and answers with a
//! [`Mystery`]. The hint service receives the rendered prompt plus the raw
//! inputs and answers with a streamed `text/plain` body, which is decoded
//! into UTF-8 fragments as it arrives.

use std::time::Duration;

use futures::{Stream, StreamExt, TryStreamExt, stream};
use queryhunt_core::narrator::{HintRequest, HintService, HintStream, Mystery, StoryWorkflow};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

fn client(timeout: Duration) -> Result<Client> {
  Ok(Client::builder().timeout(timeout).build()?)
}

/// Fail with the status and body of any non-2xx response.
async fn check(service: &'static str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { service, status: status.as_u16(), body })
}

// ─── Story ───────────────────────────────────────────────────────────────────

/// Calls a remote story-generation workflow.
#[derive(Clone)]
pub struct HttpStoryWorkflow {
  client: Client,
  url:    String,
}

impl HttpStoryWorkflow {
  /// Generation is slow; `timeout` bounds the whole request.
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    Ok(Self { client: client(timeout)?, url: url.into() })
  }
}

impl StoryWorkflow for HttpStoryWorkflow {
  type Error = Error;

  async fn generate(&self) -> Result<Mystery> {
    let resp = self
      .client
      .post(&self.url)
      .json(&serde_json::json!({}))
      .send()
      .await?;
    let mystery: Mystery = check("story workflow", resp).await?.json().await?;

    if mystery.statements.is_empty() {
      return Err(Error::EmptyMystery);
    }
    debug!(statements = mystery.statements.len(), "mystery generated");
    Ok(mystery)
  }
}

// ─── Hints ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HintBody<'a> {
  prompt:  String,
  #[serde(flatten)]
  request: &'a HintRequest,
}

/// Calls a remote hint service and streams its answer.
#[derive(Clone)]
pub struct HttpHintService {
  client: Client,
  url:    String,
}

impl HttpHintService {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    Ok(Self { client: client(timeout)?, url: url.into() })
  }
}

impl HintService for HttpHintService {
  type Error = Error;

  async fn hint(&self, request: HintRequest) -> Result<HintStream<Error>> {
    let body = HintBody { prompt: request.prompt(), request: &request };
    let resp = self.client.post(&self.url).json(&body).send().await?;
    let resp = check("hint service", resp).await?;
    Ok(decode_utf8(resp.bytes_stream()))
  }
}

/// Turn a byte stream into UTF-8 text fragments.
///
/// A multi-byte character split across chunks is carried over to the next
/// chunk. Bytes that can never form valid UTF-8, or a stream that ends
/// mid-character, fail the stream.
pub fn decode_utf8<S, B, E>(bytes: S) -> HintStream<Error>
where
  S: Stream<Item = Result<B, E>> + Send + 'static,
  B: AsRef<[u8]> + Send + 'static,
  E: 'static,
  Error: From<E>,
{
  let bytes = bytes.map_err(Error::from).boxed();

  stream::try_unfold((bytes, Vec::new()), |(mut bytes, mut carry)| async move {
    loop {
      let Some(chunk) = bytes.next().await else {
        return if carry.is_empty() { Ok(None) } else { Err(Error::Utf8) };
      };
      carry.extend_from_slice(chunk?.as_ref());

      let valid = match std::str::from_utf8(&carry) {
        Ok(text) => text.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => return Err(Error::Utf8),
      };
      if valid == 0 {
        continue;
      }

      let rest = carry.split_off(valid);
      let text = String::from_utf8(carry).map_err(|_| Error::Utf8)?;
      return Ok(Some((text, (bytes, rest))));
    }
  })
  .boxed()
}
