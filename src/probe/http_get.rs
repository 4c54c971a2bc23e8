use super::Prober;
use crate::backend::Backend;
use crate::http_transport::timeout_connector;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::http::uri::{Authority, Scheme as UriScheme};
use hyper::{Client, Uri};
use hyper_rustls::HttpsConnector;
use hyper_timeout::TimeoutConnector;
use std::time::Duration;

/// Issues an HTTP GET to `scheme://address:port` and reports alive iff
/// the response status falls in the 2xx-3xx range, bounded by a
/// connect/read/write timeout.
#[derive(Debug)]
pub struct HttpGetProber {
  client: Client<TimeoutConnector<HttpsConnector<HttpConnector>>>,
  scheme: UriScheme,
}

impl HttpGetProber {
  pub fn new(timeout: Duration, use_https: bool) -> Self {
    let mut connector = timeout_connector();
    connector.set_connect_timeout(Some(timeout));
    connector.set_read_timeout(Some(timeout));
    connector.set_write_timeout(Some(timeout));

    HttpGetProber {
      client: Client::builder().build(connector),
      scheme: if use_https { UriScheme::HTTPS } else { UriScheme::HTTP },
    }
  }

  fn uri_for(&self, backend: &Backend) -> Option<Uri> {
    let authority = Authority::try_from(format!("{}:{}", backend.address, backend.port)).ok()?;
    Uri::builder()
      .scheme(self.scheme.clone())
      .authority(authority)
      .path_and_query("/")
      .build()
      .ok()
  }
}

#[async_trait]
impl Prober for HttpGetProber {
  async fn alive(&self, backend: &Backend) -> bool {
    let uri = match self.uri_for(backend) {
      Some(uri) => uri,
      None => return false,
    };

    match self.client.get(uri).await {
      Ok(response) => response.status().is_success() || response.status().is_redirection(),
      Err(_) => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_expected_uri() {
    let prober = HttpGetProber::new(Duration::from_secs(1), false);
    let backend = Backend::new("10.0.0.1", 8080);

    let uri = prober.uri_for(&backend).unwrap();

    assert_eq!(uri.to_string(), "http://10.0.0.1:8080/");
  }

  #[test]
  fn builds_https_uri_when_configured() {
    let prober = HttpGetProber::new(Duration::from_secs(1), true);
    let backend = Backend::new("10.0.0.1", 8443);

    let uri = prober.uri_for(&backend).unwrap();

    assert_eq!(uri.scheme_str(), Some("https"));
  }
}
