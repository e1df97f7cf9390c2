use crate::cookie::get_cookie;
use crate::errors::Error;
use std::time::Duration;

struct DefaultSettings {
    base_url: &'static str,
    csrf_cookie_name: &'static str,
    timeout_secs: u64,
}

const DEFAULT_SETTINGS: DefaultSettings = DefaultSettings {
    base_url: "http://127.0.0.1:8000",
    csrf_cookie_name: "csrftoken",
    timeout_secs: 30,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    /// Raw `Cookie` header forwarded with every request.
    pub cookie: Option<String>,
    pub csrf_cookie_name: String,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SETTINGS.base_url.to_string(),
            cookie: None,
            csrf_cookie_name: DEFAULT_SETTINGS.csrf_cookie_name.to_string(),
            timeout: Duration::from_secs(DEFAULT_SETTINGS.timeout_secs),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup, falling back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        Self {
            base_url: lookup("DATAVIEW_BASE_URL").unwrap_or(defaults.base_url),
            cookie: lookup("DATAVIEW_COOKIE").filter(|c| !c.is_empty()),
            csrf_cookie_name: lookup("DATAVIEW_CSRF_COOKIE").unwrap_or(defaults.csrf_cookie_name),
            timeout: lookup("DATAVIEW_TIMEOUT_SECS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// The request-forgery token, read from the configured cookie.
    pub fn csrf_token(&self) -> Result<String, Error> {
        self.cookie
            .as_deref()
            .and_then(|cookie| get_cookie(cookie, &self.csrf_cookie_name))
            .ok_or_else(|| {
                Error::Config(format!("no '{}' cookie configured", self.csrf_cookie_name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.csrf_token().is_err());
    }

    #[test]
    fn test_lookup_overrides() {
        let env = HashMap::from([
            ("DATAVIEW_BASE_URL", "https://data.example.org"),
            ("DATAVIEW_COOKIE", "sessionid=s; xsrf=abc%21"),
            ("DATAVIEW_CSRF_COOKIE", "xsrf"),
            ("DATAVIEW_TIMEOUT_SECS", "5"),
        ]);
        let settings = Settings::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.base_url, "https://data.example.org");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.csrf_token(), Ok("abc!".to_string()));
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let settings = Settings::from_lookup(|key| {
            (key == "DATAVIEW_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }
}
