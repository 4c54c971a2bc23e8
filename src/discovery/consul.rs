use super::Discovery;
use crate::backend::Backend;
use crate::error::DiscoveryError;
use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::Client;
use serde::Deserialize;
use url::Url;

/// TTL Consul's own health-check cadence implies for catalog entries;
/// the catalog API itself carries no TTL field.
const CATALOG_TTL: u32 = 10;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
  #[serde(rename = "Address")]
  address: String,
  #[serde(rename = "ServicePort")]
  service_port: u16,
}

/// Queries a Consul agent's catalog for the healthy instances of a
/// service: `GET /v1/catalog/service/{name}`, with optional `dc`,
/// `near` and `tag` filters.
#[derive(Debug)]
pub struct ConsulDiscovery {
  client: Client<HttpConnector>,
  base_url: Url,
  service: String,
  dc: Option<String>,
  near: Option<String>,
  tag: Option<String>,
}

impl ConsulDiscovery {
  pub fn new(base_url: Url, service: impl Into<String>) -> Self {
    ConsulDiscovery {
      client: Client::new(),
      base_url,
      service: service.into(),
      dc: None,
      near: None,
      tag: None,
    }
  }

  pub fn with_dc(mut self, dc: impl Into<String>) -> Self {
    self.dc = Some(dc.into());
    self
  }

  pub fn with_near(mut self, near: impl Into<String>) -> Self {
    self.near = Some(near.into());
    self
  }

  pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
    self.tag = Some(tag.into());
    self
  }

  fn catalog_url(&self) -> Result<Url, DiscoveryError> {
    let mut url = self
      .base_url
      .join(&format!("/v1/catalog/service/{}", self.service))
      .map_err(|e| DiscoveryError::from_cause("failed to build Consul catalog URL", e))?;

    {
      let mut query = url.query_pairs_mut();
      if let Some(dc) = &self.dc {
        query.append_pair("dc", dc);
      }
      if let Some(near) = &self.near {
        query.append_pair("near", near);
      }
      if let Some(tag) = &self.tag {
        query.append_pair("tag", tag);
      }
    }

    Ok(url)
  }
}

#[async_trait]
impl Discovery for ConsulDiscovery {
  async fn snapshot(&self) -> Result<Vec<Backend>, DiscoveryError> {
    let url = self.catalog_url()?;
    let uri = url
      .as_str()
      .parse()
      .map_err(|e: hyper::http::uri::InvalidUri| DiscoveryError::from_cause("invalid Consul catalog URI", e))?;

    let response = self
      .client
      .get(uri)
      .await
      .map_err(|e| DiscoveryError::from_cause("Consul catalog request failed", e))?;

    let body = to_bytes(response.into_body())
      .await
      .map_err(|e| DiscoveryError::from_cause("failed to read Consul catalog response", e))?;

    let entries: Vec<CatalogEntry> =
      serde_json::from_slice(&body).map_err(|e| DiscoveryError::from_cause("failed to parse Consul catalog response", e))?;

    let backends = entries
      .into_iter()
      .map(|entry| Backend::new(entry.address, entry.service_port).with_ttl(CATALOG_TTL))
      .collect();

    Ok(backends)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_url_includes_optional_filters() {
    let discovery = ConsulDiscovery::new(Url::parse("http://consul.local:8500").unwrap(), "whoami")
      .with_dc("dc1")
      .with_tag("canary");

    let url = discovery.catalog_url().unwrap();

    assert_eq!(url.path(), "/v1/catalog/service/whoami");
    assert!(url.query().unwrap().contains("dc=dc1"));
    assert!(url.query().unwrap().contains("tag=canary"));
  }

  #[test]
  fn parses_catalog_entry_shape() {
    let json = r#"[{"Address":"127.1.1.1","ServicePort":3000,"ServiceID":"whoami-1"}]"#;
    let entries: Vec<CatalogEntry> = serde_json::from_str(json).unwrap();

    assert_eq!(entries[0].address, "127.1.1.1");
    assert_eq!(entries[0].service_port, 3000);
  }
}
