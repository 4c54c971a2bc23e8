use super::Discovery;
use crate::backend::Backend;
use crate::error::DiscoveryError;
use async_trait::async_trait;
use log::warn;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::proto::rr::rdata::SRV;
use trust_dns_resolver::TokioAsyncResolver;

/// Resolves A records for a name and emits one Backend per address, all
/// sharing the caller-supplied port. TTL is copied from the DNS answer.
#[derive(Debug)]
pub struct DnsARecordDiscovery {
  resolver: TokioAsyncResolver,
  name: String,
  port: u16,
}

impl DnsARecordDiscovery {
  pub fn new(name: impl Into<String>, port: u16) -> Result<Self, DiscoveryError> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
      .map_err(|e| DiscoveryError::from_cause("failed to build DNS resolver", e))?;
    Ok(DnsARecordDiscovery {
      resolver,
      name: name.into(),
      port,
    })
  }
}

#[async_trait]
impl Discovery for DnsARecordDiscovery {
  async fn snapshot(&self) -> Result<Vec<Backend>, DiscoveryError> {
    let response = self
      .resolver
      .lookup_ip(self.name.as_str())
      .await
      .map_err(|e| DiscoveryError::from_cause(format!("A lookup for '{}' failed", self.name), e))?;

    let ttl = response
      .as_lookup()
      .record_iter()
      .next()
      .map(|record| record.ttl())
      .unwrap_or(crate::backend::DEFAULT_TTL);

    let backends = response
      .iter()
      .map(|addr: IpAddr| Backend::new(addr.to_string(), self.port).with_ttl(ttl))
      .collect();

    Ok(backends)
  }
}

/// Resolves SRV records for a name and emits one Backend per answer row.
/// A SRV row only names a target *hostname*, not an address, so each row
/// additionally requires a glue A lookup of its target to obtain the
/// actual address and that address's own TTL - the SRV record's own TTL
/// is not used for the Backend.
#[derive(Debug)]
pub struct DnsSrvDiscovery {
  resolver: TokioAsyncResolver,
  name: String,
}

impl DnsSrvDiscovery {
  pub fn new(name: impl Into<String>) -> Result<Self, DiscoveryError> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
      .map_err(|e| DiscoveryError::from_cause("failed to build DNS resolver", e))?;
    Ok(DnsSrvDiscovery {
      resolver,
      name: name.into(),
    })
  }
}

#[async_trait]
impl Discovery for DnsSrvDiscovery {
  async fn snapshot(&self) -> Result<Vec<Backend>, DiscoveryError> {
    let response = self
      .resolver
      .srv_lookup(self.name.as_str())
      .await
      .map_err(|e| DiscoveryError::from_cause(format!("SRV lookup for '{}' failed", self.name), e))?;

    let mut backends = Vec::new();
    for srv in response.iter() {
      let target = srv.target().to_utf8();
      match self.resolver.lookup_ip(target.as_str()).await {
        Ok(glue) => {
          let ttl = glue.as_lookup().record_iter().next().map(|record| record.ttl()).unwrap_or(crate::backend::DEFAULT_TTL);

          if let Some(address) = glue.iter().next() {
            backends.push(backend_from_srv(srv, address, ttl));
          } else {
            warn!("SRV target '{}' resolved to no addresses, skipping", target);
          }
        }
        Err(e) => warn!("glue A lookup for SRV target '{}' failed, skipping: {}", target, e),
      }
    }

    Ok(backends)
  }
}

/// Builds the Backend for one SRV answer row once its target has been
/// resolved to a concrete address and that address's TTL.
fn backend_from_srv(srv: &SRV, address: IpAddr, ttl: u32) -> Backend {
  Backend::new(address.to_string(), srv.port())
    .with_weight(srv.weight() as u32)
    .with_priority(srv.priority() as i32)
    .with_ttl(ttl)
}

#[cfg(test)]
mod tests {
  use super::*;
  use trust_dns_resolver::proto::rr::Name;

  #[test]
  fn srv_record_resolves_to_the_glue_address_and_its_own_ttl() {
    let srv = SRV::new(1, 1, 3000, Name::from_ascii("host.").unwrap());
    let address: IpAddr = "127.1.1.1".parse().unwrap();

    let backend = backend_from_srv(&srv, address, 333);

    assert_eq!(backend.address, "127.1.1.1");
    assert_eq!(backend.port, 3000);
    assert_eq!(backend.ttl, 333);
    assert_eq!(backend.weight, 1);
    assert_eq!(backend.priority, 1);
  }
}
