use super::Discovery;
use crate::backend::Backend;
use crate::error::{ConfigurationError, DiscoveryError};
use async_trait::async_trait;

/// An address list entry as handed to [`StaticDiscovery::new`]: either a
/// bare string (`"host"` or `"host:port"`) or an already-built `Backend`.
#[derive(Debug, Clone)]
pub enum AddressEntry {
  Address(String),
  Backend(Backend),
}

impl From<&str> for AddressEntry {
  fn from(address: &str) -> Self {
    AddressEntry::Address(address.to_owned())
  }
}

impl From<String> for AddressEntry {
  fn from(address: String) -> Self {
    AddressEntry::Address(address)
  }
}

impl From<Backend> for AddressEntry {
  fn from(backend: Backend) -> Self {
    AddressEntry::Backend(backend)
  }
}

const DEFAULT_PORT: u16 = 80;

/// A fixed, never-changing set of backends. Every `snapshot()` call
/// returns the same entries; discovery can't fail since the list was
/// already validated at construction.
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
  backends: Vec<Backend>,
}

impl StaticDiscovery {
  pub fn new<I, E>(entries: I) -> Result<Self, ConfigurationError>
  where
    I: IntoIterator<Item = E>,
    E: Into<AddressEntry>,
  {
    let mut backends = Vec::new();
    for entry in entries {
      backends.push(parse_entry(entry.into())?);
    }
    Ok(StaticDiscovery { backends })
  }
}

fn parse_entry(entry: AddressEntry) -> Result<Backend, ConfigurationError> {
  match entry {
    AddressEntry::Backend(backend) => Ok(backend),
    AddressEntry::Address(address) => parse_address(&address),
  }
}

fn parse_address(address: &str) -> Result<Backend, ConfigurationError> {
  match split_once(address, ':') {
    Some((host, port_str)) => {
      let port: u16 = port_str
        .parse()
        .map_err(|_| ConfigurationError::new(format!("server was in unexpected format: \"{}\"", address)))?;
      Ok(Backend::new(host, port))
    }
    None => Ok(Backend::new(address, DEFAULT_PORT)),
  }
}

/// A stable alternative to the unstable `str::split_once`.
fn split_once(string: &str, pattern: char) -> Option<(&str, &str)> {
  let mut splitter = string.splitn(2, pattern);
  let first = splitter.next()?;
  let second = splitter.next()?;
  Some((first, second))
}

#[async_trait]
impl Discovery for StaticDiscovery {
  async fn snapshot(&self) -> Result<Vec<Backend>, DiscoveryError> {
    Ok(self.backends.clone())
  }
}
