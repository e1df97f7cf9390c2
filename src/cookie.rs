use percent_encoding::percent_decode_str;

/// Read a named value from a `Cookie` header string (`a=1; b=2`).
///
/// The first cookie with a matching name wins. Values are percent-decoded;
/// a value that does not decode to UTF-8 is returned as-is.
pub fn get_cookie(header: &str, name: &str) -> Option<String> {
    if header.is_empty() {
        return None;
    }
    header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| match percent_decode_str(raw).decode_utf8() {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_named_cookie() {
        let header = "sessionid=abc; csrftoken=t0k3n; theme=dark";
        assert_eq!(get_cookie(header, "csrftoken"), Some("t0k3n".to_string()));
        assert_eq!(get_cookie(header, "theme"), Some("dark".to_string()));
    }

    #[test]
    fn test_missing_cookie() {
        assert_eq!(get_cookie("", "csrftoken"), None);
        assert_eq!(get_cookie("sessionid=abc", "csrftoken"), None);
    }

    #[test]
    fn test_prefix_name_does_not_match() {
        // `csrftokenx` must not satisfy a lookup for `csrftoken`
        assert_eq!(get_cookie("csrftokenx=1; csrftoken=2", "csrftoken"), Some("2".to_string()));
    }

    #[test]
    fn test_value_is_percent_decoded() {
        assert_eq!(
            get_cookie("note=a%20b%3Dc", "note"),
            Some("a b=c".to_string())
        );
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(get_cookie("k=first; k=second", "k"), Some("first".to_string()));
    }
}
