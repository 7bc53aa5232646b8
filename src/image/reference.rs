//! Image references (e.g. `registry.example.com:5000/team/app:1.2`)

use crate::error::{OsComposeError, Result};
use std::fmt;

/// Tag used when a reference names none
pub const DEFAULT_TAG: &str = "latest";

/// A parsed image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host, when one is named
    pub registry: Option<String>,
    /// Repository path before the image name
    pub namespace: Option<String>,
    /// Image name
    pub name: String,
    /// Tag
    pub tag: Option<String>,
    /// Content digest
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parses an image reference string.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(OsComposeError::InvalidImageReference(s.to_string()));
        }

        let (rest, digest) = match s.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (s, None),
        };

        // the first component is a registry only when it looks like a host
        let (registry, rest) = match rest.split_once('/') {
            Some((host, path))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (Some(host.to_string()), path)
            }
            _ => (None, rest),
        };

        let last_slash = rest.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match rest[last_slash..].rfind(':') {
            Some(i) => (
                &rest[..last_slash + i],
                Some(rest[last_slash + i + 1..].to_string()),
            ),
            None => (rest, None),
        };

        let (namespace, name) = match repository.rsplit_once('/') {
            Some((namespace, name)) => (Some(namespace.to_string()), name),
            None => (None, repository),
        };

        if name.is_empty() || tag.as_deref() == Some("") || digest.as_deref() == Some("") {
            return Err(OsComposeError::InvalidImageReference(s.to_string()));
        }

        Ok(Self {
            registry,
            namespace,
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// Repository without tag or digest
    pub fn repository(&self) -> String {
        let mut repository = String::new();
        if let Some(registry) = &self.registry {
            repository.push_str(registry);
            repository.push('/');
        }
        if let Some(namespace) = &self.namespace {
            repository.push_str(namespace);
            repository.push('/');
        }
        repository.push_str(&self.name);
        repository
    }

    /// Tag, defaulting to `latest`
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let image = ImageReference::parse("redis").unwrap();
        assert_eq!(image.name, "redis");
        assert_eq!(image.registry, None);
        assert_eq!(image.tag, None);
        assert_eq!(image.tag_or_default(), "latest");
    }

    #[test]
    fn test_parse_full_reference() {
        let image = ImageReference::parse("registry.example.com:5000/team/app:1.2").unwrap();
        assert_eq!(image.registry.as_deref(), Some("registry.example.com:5000"));
        assert_eq!(image.namespace.as_deref(), Some("team"));
        assert_eq!(image.name, "app");
        assert_eq!(image.tag.as_deref(), Some("1.2"));
        assert_eq!(image.to_string(), "registry.example.com:5000/team/app:1.2");
    }

    #[test]
    fn test_parse_namespace_without_registry() {
        let image = ImageReference::parse("library/nginx:alpine").unwrap();
        assert_eq!(image.registry, None);
        assert_eq!(image.namespace.as_deref(), Some("library"));
        assert_eq!(image.repository(), "library/nginx");
    }

    #[test]
    fn test_parse_digest() {
        let image = ImageReference::parse("localhost/app@sha256:abc").unwrap();
        assert_eq!(image.registry.as_deref(), Some("localhost"));
        assert_eq!(image.digest.as_deref(), Some("sha256:abc"));
        assert_eq!(image.tag, None);
        assert_eq!(image.to_string(), "localhost/app@sha256:abc");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("app:").is_err());
        assert!(ImageReference::parse("my app").is_err());
    }
}
