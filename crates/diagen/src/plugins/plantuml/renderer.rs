//! PlantUML server renderer
//!
//! Encodes a diagram source and fetches the rendered SVG from a PlantUML
//! server with a blocking GET.

use std::io::Read;
use std::time::Duration;

use tracing::{debug, span, trace, Level};

use super::encoder::encode;
use crate::core::{GenerateError, GeneratorConfig, Result};

/// Retrieves the body behind a URL
///
/// The HTTP implementation is [`HttpFetcher`]; tests substitute canned
/// responses.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP fetcher with a per-request timeout
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.timeout)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(GenerateError::fetch_error(url, code)),
            Err(ureq::Error::Transport(err)) => {
                return Err(GenerateError::transport_error(url, err.to_string()))
            }
        };

        // ureq only errors on 4xx/5xx; anything else outside 2xx is still a miss
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(GenerateError::fetch_error(url, status));
        }

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| GenerateError::transport_error(url, err.to_string()))?;
        debug!(status, bytes = body.len(), "Fetched diagram");
        Ok(body)
    }
}

/// Build the request URL for a diagram source
///
/// The token is appended to the server base, which gets a trailing `/` if it
/// lacks one.
pub fn diagram_url(server_url: &str, source: &str) -> Result<String> {
    let token = encode(source)?;
    let separator = if server_url.ends_with('/') { "" } else { "/" };
    Ok(format!("{}{}{}", server_url, separator, token))
}

/// Renders PlantUML sources to SVG through a server
pub struct PlantUmlRenderer<F> {
    server_url: String,
    fetcher: F,
}

impl<F: Fetcher> PlantUmlRenderer<F> {
    pub fn new(server_url: impl Into<String>, fetcher: F) -> Self {
        Self {
            server_url: server_url.into(),
            fetcher,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Render one diagram source to SVG bytes
    pub fn render(&self, source: &str) -> Result<Vec<u8>> {
        let render_span = span!(Level::DEBUG, "render_plantuml", source_len = source.len());
        let _enter = render_span.enter();

        let url = diagram_url(&self.server_url, source)?;
        trace!(url = %url, "Requesting diagram");
        self.fetcher.fetch(&url)
    }
}

impl PlantUmlRenderer<HttpFetcher> {
    /// Renderer against the configured server with the configured timeout
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.server_url.clone(), HttpFetcher::from_config(config))
    }
}
