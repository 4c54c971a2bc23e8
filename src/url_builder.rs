use url::Url;

/// Assembles an absolute URL from its parts, mirroring the original
/// `UrlBuilder` collaborator. Query parameters are a multimap: each
/// key keeps the insertion order of its own values, though distinct
/// keys need not preserve their relative order.
#[derive(Debug, Clone, Default)]
pub struct UrlBuilder {
  scheme: String,
  username: Option<String>,
  password: Option<String>,
  hostname: String,
  port: Option<u16>,
  path: String,
  path_appends: Vec<String>,
  query: Vec<(String, String)>,
  fragment: Option<String>,
}

impl UrlBuilder {
  pub fn from_parts(scheme: impl Into<String>, hostname: impl Into<String>, port: Option<u16>) -> Self {
    UrlBuilder {
      scheme: scheme.into(),
      username: None,
      password: None,
      hostname: hostname.into(),
      port,
      path: String::from("/"),
      path_appends: Vec::new(),
      query: Vec::new(),
      fragment: None,
    }
  }

  pub fn parse(url: &str) -> Result<Self, url::ParseError> {
    let parsed = Url::parse(url)?;

    let username = if parsed.username().is_empty() { None } else { Some(parsed.username().to_string()) };
    let password = parsed.password().map(str::to_string);
    let path = if parsed.path().is_empty() { "/".to_string() } else { parsed.path().to_string() };
    let query = parsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

    Ok(UrlBuilder {
      scheme: parsed.scheme().to_string(),
      username,
      password,
      hostname: parsed.host_str().unwrap_or_default().to_string(),
      port: parsed.port(),
      path,
      path_appends: Vec::new(),
      query,
      fragment: parsed.fragment().map(str::to_string),
    })
  }

  pub fn https(mut self) -> Self {
    self.scheme = "https".to_string();
    self
  }

  pub fn username(mut self, username: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self
  }

  pub fn password(mut self, password: impl Into<String>) -> Self {
    self.password = Some(password.into());
    self
  }

  pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
    self.fragment = Some(fragment.into());
    self
  }

  pub fn add_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.query.push((key.into(), value.into()));
    self
  }

  /// Queues `path` to be joined onto this builder's current path at
  /// build time, ensuring a trailing `/` separator before resolving it
  /// as a reference per standard URL reference resolution (RFC 3986) -
  /// so `append_path("v1/things")` onto root `/` yields `/v1/things`,
  /// while `append_path("/v1/things")` (an absolute-path reference)
  /// replaces the path outright, per the resolution rules.
  pub fn append_path(mut self, path: impl Into<String>) -> Self {
    self.path_appends.push(path.into());
    self
  }

  pub fn build(&self) -> Result<Url, url::ParseError> {
    let authority = match &self.port {
      Some(port) => format!("{}:{}", self.hostname, port),
      None => self.hostname.clone(),
    };

    let mut url = Url::parse(&format!("{}://{}{}", self.scheme, authority, self.path))?;

    for next in &self.path_appends {
      let mut base_path = url.path().to_string();
      if !base_path.ends_with('/') {
        base_path.push('/');
      }
      url.set_path(&base_path);
      url = url.join(next)?;
    }

    if let Some(username) = &self.username {
      let _ = url.set_username(username);
    }
    if let Some(password) = &self.password {
      let _ = url.set_password(Some(password));
    }
    if !self.query.is_empty() {
      url.query_pairs_mut().extend_pairs(self.query.iter());
    }
    url.set_fragment(self.fragment.as_deref());

    Ok(url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_a_minimal_http_url() {
    let url = UrlBuilder::from_parts("http", "example.com", None).build().unwrap();
    assert_eq!(url.as_str(), "http://example.com/");
  }

  #[test]
  fn includes_a_non_default_port() {
    let url = UrlBuilder::from_parts("http", "example.com", Some(8080)).build().unwrap();
    assert_eq!(url.as_str(), "http://example.com:8080/");
  }

  #[test]
  fn https_switches_scheme() {
    let url = UrlBuilder::from_parts("http", "example.com", None).https().build().unwrap();
    assert_eq!(url.scheme(), "https");
  }

  #[test]
  fn append_path_joins_onto_root() {
    let url = UrlBuilder::from_parts("http", "example.com", None).append_path("v1/things").build().unwrap();
    assert_eq!(url.path(), "/v1/things");
  }

  #[test]
  fn append_path_joins_onto_an_existing_path_with_trailing_slash() {
    let url =
      UrlBuilder::from_parts("http", "example.com", None).append_path("api/").append_path("v1/things").build().unwrap();
    assert_eq!(url.path(), "/api/v1/things");
  }

  #[test]
  fn an_absolute_path_reference_replaces_rather_than_extends() {
    let url =
      UrlBuilder::from_parts("http", "example.com", None).append_path("api/").append_path("/v1/things").build().unwrap();
    assert_eq!(url.path(), "/v1/things");
  }

  #[test]
  fn query_params_preserve_per_key_insertion_order() {
    let url = UrlBuilder::from_parts("http", "example.com", None)
      .add_query_param("a", "1")
      .add_query_param("a", "2")
      .build()
      .unwrap();

    let values: Vec<_> = url.query_pairs().filter(|(k, _)| k == "a").map(|(_, v)| v.into_owned()).collect();
    assert_eq!(values, vec!["1", "2"]);
  }

  #[test]
  fn round_trips_scheme_host_port_path_query_and_fragment() {
    let original = "http://user@example.com:8080/api/v1?tag=blue&tag=red#section";
    let rebuilt = UrlBuilder::parse(original).unwrap().build().unwrap();

    assert_eq!(rebuilt.scheme(), "http");
    assert_eq!(rebuilt.host_str(), Some("example.com"));
    assert_eq!(rebuilt.port(), Some(8080));
    assert_eq!(rebuilt.path(), "/api/v1");
    assert_eq!(rebuilt.fragment(), Some("section"));

    let tags: Vec<_> = rebuilt.query_pairs().filter(|(k, _)| k == "tag").map(|(_, v)| v.into_owned()).collect();
    assert_eq!(tags, vec!["blue", "red"]);
  }
}
