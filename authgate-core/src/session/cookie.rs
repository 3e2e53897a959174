//! Session cookie policy and `Set-Cookie` rendering

use std::fmt;

use crate::config::Config;

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    /// Parse the configured attribute; an empty value leaves it unset.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "lax" => Ok(Some(Self::Lax)),
            "strict" => Ok(Some(Self::Strict)),
            "none" => Ok(Some(Self::None)),
            other => Err(format!(
                "cookie.same_site must be lax, strict or none, got '{other}'"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes applied to the session cookie, whatever the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
    pub max_age_secs: u64,
}

impl CookieOptions {
    /// Derive the policy from `session` and `cookie` settings.
    ///
    /// `session.max_age` is in minutes.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let domain = config.cookie.domain.trim();
        let path = config.cookie.path.trim();

        Ok(Self {
            name: config.session.name.clone(),
            path: if path.is_empty() { "/" } else { path }.to_string(),
            domain: (!domain.is_empty()).then(|| domain.to_string()),
            http_only: config.cookie.http_only,
            secure: config.cookie.secure,
            same_site: SameSite::parse_optional(&config.cookie.same_site)?,
            max_age_secs: config.session.max_age.saturating_mul(60),
        })
    }

    /// `Set-Cookie` value carrying `value`
    #[must_use]
    pub fn render(&self, value: &str) -> String {
        self.render_with_max_age(value, self.max_age_secs)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie
    #[must_use]
    pub fn render_expired(&self) -> String {
        self.render_with_max_age("", 0)
    }

    fn render_with_max_age(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, value, self.path);
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        cookie.push_str(&format!("; Max-Age={max_age}"));
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            cookie.push_str("; SameSite=");
            cookie.push_str(same_site.as_str());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CookieOptions {
        CookieOptions {
            name: "AuthgateSession".to_string(),
            path: "/".to_string(),
            domain: Some("example.com".to_string()),
            http_only: true,
            secure: true,
            same_site: Some(SameSite::Strict),
            max_age_secs: 1800,
        }
    }

    #[test]
    fn test_parse_same_site() {
        assert_eq!(SameSite::parse_optional("").unwrap(), None);
        assert_eq!(SameSite::parse_optional("Lax").unwrap(), Some(SameSite::Lax));
        assert_eq!(SameSite::parse_optional("strict").unwrap(), Some(SameSite::Strict));
        assert_eq!(SameSite::parse_optional("NONE").unwrap(), Some(SameSite::None));
        assert!(SameSite::parse_optional("always").is_err());
    }

    #[test]
    fn test_from_config_converts_minutes() {
        let mut config = Config::default();
        config.session.max_age = 30;
        config.cookie.same_site = "strict".to_string();

        let options = CookieOptions::from_config(&config).unwrap();
        assert_eq!(options.max_age_secs, 1800);
        assert_eq!(options.same_site, Some(SameSite::Strict));
        assert_eq!(options.domain, None);
        assert_eq!(options.path, "/");
    }

    #[test]
    fn test_render() {
        assert_eq!(
            options().render("abc"),
            "AuthgateSession=abc; Path=/; Domain=example.com; Max-Age=1800; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn test_render_expired_without_optional_attributes() {
        let options = CookieOptions {
            domain: None,
            http_only: false,
            secure: false,
            same_site: None,
            ..options()
        };
        assert_eq!(options.render_expired(), "AuthgateSession=; Path=/; Max-Age=0");
    }
}
