//! libcurl-backed transport: multipart upload and artifact GET.

use anyhow::{Context, Result};
use curl::easy::{Easy, Form, List};
use std::time::Duration;
use url::Url;

use super::{ArtifactFetcher, FetchError, JobTransport, RawResponse, TransportError};
use crate::config::BatchConfig;
use crate::job::{Payload, SubmitParams};

const PDF_MIME: &str = "application/pdf";

/// Blocking HTTP client for the processing API. Cheap to share behind an `Arc`;
/// every call builds its own curl handle.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    base: Url,
    endpoint: Url,
    api_key: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl CurlTransport {
    pub fn from_config(cfg: &BatchConfig) -> Result<Self> {
        let base = Url::parse(&cfg.api_base_url)
            .with_context(|| format!("invalid api_base_url {}", cfg.api_base_url))?;
        let endpoint = base
            .join(&cfg.endpoint)
            .with_context(|| format!("invalid endpoint {}", cfg.endpoint))?;
        Ok(Self {
            base,
            endpoint,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            connect_timeout: cfg.connect_timeout(),
            request_timeout: cfg.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Absolute URL for an artifact locator. Relative locators such as
    /// `/api/file?...` resolve against the API base.
    pub fn resolve(&self, locator: &str) -> Result<Url, FetchError> {
        self.base
            .join(locator)
            .map_err(|e| FetchError::InvalidLocator(format!("{locator}: {e}")))
    }

    fn headers(&self) -> Result<List, curl::Error> {
        let mut list = List::new();
        if let Some(key) = &self.api_key {
            list.append(&format!("x-api-key: {}", key.trim()))?;
        }
        // Skip the 100-continue round trip on large uploads.
        list.append("Expect:")?;
        Ok(list)
    }
}

fn build_form(payload: &Payload, params: &SubmitParams) -> Result<Form, TransportError> {
    let mut form = Form::new();
    match payload {
        Payload::Path { path, .. } => {
            form.part("file").file(path).content_type(PDF_MIME).add()?;
        }
        Payload::Memory { name, bytes } => {
            form.part("file")
                .buffer(name, bytes.to_vec())
                .content_type(PDF_MIME)
                .add()?;
        }
    }
    for (name, value) in params.fields() {
        form.part(name).contents(value.as_bytes()).add()?;
    }
    Ok(form)
}

impl JobTransport for CurlTransport {
    fn submit(
        &self,
        payload: &Payload,
        params: &SubmitParams,
        on_upload: &mut dyn FnMut(u64, u64),
    ) -> Result<RawResponse, TransportError> {
        if let Payload::Path { path, .. } = payload {
            // Surface a vanished file as an I/O error rather than a curl read failure.
            std::fs::metadata(path)?;
        }
        let form = build_form(payload, params)?;
        let mut body = Vec::new();

        let mut easy = Easy::new();
        easy.url(self.endpoint.as_str())?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;
        easy.http_headers(self.headers()?)?;
        easy.httppost(form)?;
        easy.progress(true)?;

        {
            let mut transfer = easy.transfer();
            transfer.progress_function(|_dltotal, _dlnow, ultotal, ulnow| {
                on_upload(ulnow.max(0.0) as u64, ultotal.max(0.0) as u64);
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok(RawResponse { status, body })
    }
}

impl ArtifactFetcher for CurlTransport {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(locator)?;
        let mut body = Vec::new();

        let mut easy = Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;
        easy.http_headers(self.headers()?)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(body)
    }
}
