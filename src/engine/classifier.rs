//! Line classification for ABP-style block lists.
//!
//! Each decoded line maps to exactly one [`Classification`]. Lines that do
//! not follow one of the handled shapes are `Unknown` and get dropped by the
//! builder.

use percent_encoding::percent_decode_str;
use std::net::IpAddr;
use tracing::debug;
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Unknown,
    Ip(String),
    Domain(String),
    DomainKeyword(String),
}

/// Host component pulled out of a URL-shaped value, before any reduction.
enum ParsedHost {
    Ip(String),
    Domain(String),
}

pub fn classify(line: &str) -> Classification {
    let line = line.trim();

    match line.chars().next() {
        // Comment, header, regex rule or allowlist exception.
        None | Some('!' | '[' | '/' | '@') => return Classification::Unknown,
        _ => {}
    }

    if let Some(rest) = line.strip_prefix('|').filter(|rest| !rest.starts_with('|')) {
        // `|http://host/...` anchors the exact host.
        return extract_host(strip_scheme(rest), true);
    }

    if let Some(rest) = line.strip_prefix("||") {
        return extract_host(strip_scheme(rest), false);
    }

    if line.starts_with("http://") {
        return extract_host(strip_scheme(line), false);
    }

    if line.starts_with('.') {
        return classify_dotted(line.trim_start_matches('.'));
    }

    if line.contains('.') {
        return extract_host(line, true);
    }

    if line.parse::<IpAddr>().is_ok() {
        return Classification::Ip(line.to_string());
    }

    Classification::Unknown
}

/// `.host` rules. A trailing wildcard label turns the rule into a keyword
/// match on its first label (`.google.*` -> `google`).
fn classify_dotted(value: &str) -> Classification {
    match parse_host(value) {
        Some(ParsedHost::Domain(host)) => {
            let reduced = last_two_labels(&host);
            if reduced.ends_with('*') {
                let keyword = reduced.split('.').next().unwrap_or("").trim_matches('*');
                if keyword.is_empty() {
                    return Classification::Unknown;
                }
                return Classification::DomainKeyword(keyword.to_string());
            }
            domain(reduced)
        }
        Some(ParsedHost::Ip(ip)) => Classification::Ip(ip),
        None => Classification::Unknown,
    }
}

/// Extracts the host of a URL-shaped value. With `full_host` unset the
/// domain is reduced to its last two labels.
pub fn extract_host(value: &str, full_host: bool) -> Classification {
    match parse_host(value) {
        Some(ParsedHost::Ip(ip)) => Classification::Ip(ip),
        Some(ParsedHost::Domain(host)) if full_host => domain(&host),
        Some(ParsedHost::Domain(host)) => domain(last_two_labels(&host)),
        None => Classification::Unknown,
    }
}

/// Wildcards are dropped along with the dot that joined them to the host,
/// so `*.example.*` becomes `example`.
fn domain(host: &str) -> Classification {
    let host = host.trim_matches(|c| c == '*' || c == '.');
    if host.is_empty() {
        Classification::Unknown
    } else {
        Classification::Domain(host.to_string())
    }
}

fn parse_host(value: &str) -> Option<ParsedHost> {
    // `^` is the ABP separator and `$` starts the option list; neither is
    // part of the address.
    let value = match value.find(['^', '$']) {
        Some(idx) => &value[..idx],
        None => value,
    };

    let candidate = if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    };
    let candidate = percent_decode_str(&candidate).decode_utf8_lossy();

    // Only a literal address counts as an IP; the URL parser would also
    // accept shorthand, octal and hex IPv4 forms.
    let raw = raw_host(&candidate);
    if let Ok(addr) = raw.parse::<IpAddr>() {
        return Some(ParsedHost::Ip(addr.to_string()));
    }

    match Url::parse(&candidate) {
        Ok(url) => match url.host() {
            Some(Host::Domain(host)) if !host.is_empty() => {
                return Some(ParsedHost::Domain(host.to_string()));
            }
            Some(Host::Domain(_)) | None => {
                debug!("url {} has no host", candidate);
                return None;
            }
            // Numeric-looking host that is not a literal address.
            Some(Host::Ipv4(_) | Host::Ipv6(_)) => {}
        },
        Err(e) => debug!("parse {} as url failed, {}", candidate, e),
    }

    if is_plain_host(raw) {
        Some(ParsedHost::Domain(raw.to_ascii_lowercase()))
    } else {
        None
    }
}

/// Host text of a URL-shaped value: after the scheme and userinfo, before
/// any port, path, query or fragment.
fn raw_host(value: &str) -> &str {
    let rest = value.split_once("://").map_or(value, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    if let Some(bracketed) = authority.strip_prefix('[') {
        return bracketed.split_once(']').map_or("", |(host, _)| host);
    }
    authority.split(':').next().unwrap_or("")
}

fn is_plain_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '*'))
}

/// Removes one literal `http://` or `https://` prefix.
fn strip_scheme(value: &str) -> &str {
    value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
        .unwrap_or(value)
}

fn last_two_labels(host: &str) -> &str {
    match host.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &host[idx + 1..],
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(v: &str) -> Classification {
        Classification::Domain(v.to_string())
    }

    fn ip(v: &str) -> Classification {
        Classification::Ip(v.to_string())
    }

    #[test]
    fn test_skipped_prefixes() {
        for line in [
            "! comment",
            "[AutoProxy 0.2.9]",
            "/^https?:\\/\\/[^\\/]+blogspot\\.(.*)/",
            "@@||example.com",
            "",
            "   ",
        ] {
            assert_eq!(classify(line), Classification::Unknown, "line: {:?}", line);
        }
    }

    #[test]
    fn test_bare_ip() {
        assert_eq!(classify("1.2.3.4"), ip("1.2.3.4"));
        assert_eq!(classify("2001:db8::1"), ip("2001:db8::1"));
    }

    #[test]
    fn test_leading_dot_reduces_to_two_labels() {
        assert_eq!(classify(".ads.example.com"), domain("example.com"));
        assert_eq!(classify("...example.com"), domain("example.com"));
    }

    #[test]
    fn test_double_pipe_reduces_to_two_labels() {
        assert_eq!(classify("||tracker.example.org^"), domain("example.org"));
        assert_eq!(classify("||ads.example.net^$third-party"), domain("example.net"));
        assert_eq!(classify("||https://cdn.example.com/x"), domain("example.com"));
        assert_eq!(classify("||*.example.com"), domain("example.com"));
        assert_eq!(classify("||Media.Example.COM"), domain("example.com"));
    }

    #[test]
    fn test_double_pipe_ip() {
        assert_eq!(classify("||1.2.3.4"), ip("1.2.3.4"));
        assert_eq!(classify("||[2001:db8::1]/path"), ip("2001:db8::1"));
    }

    #[test]
    fn test_http_prefix_reduces_to_two_labels() {
        assert_eq!(classify("http://www.example.com/foo"), domain("example.com"));
        assert_eq!(classify("http://8.8.8.8/dns"), ip("8.8.8.8"));
    }

    #[test]
    fn test_single_pipe_keeps_full_host() {
        assert_eq!(classify("|http://a.b.example.com/path"), domain("a.b.example.com"));
        assert_eq!(classify("|https://secure.example.com"), domain("secure.example.com"));
        assert_eq!(classify("|http://85.17.73.31/"), ip("85.17.73.31"));
    }

    #[test]
    fn test_prefix_is_stripped_literally() {
        // Character-class trimming would eat the leading "tp".
        assert_eq!(classify("|tp.example.com"), domain("tp.example.com"));
        assert_eq!(classify("||http.example.com"), domain("example.com"));
    }

    #[test]
    fn test_url_like_line_keeps_full_host() {
        assert_eq!(classify("www.example.com/path"), domain("www.example.com"));
        assert_eq!(classify("sub.a.com"), domain("sub.a.com"));
        assert_eq!(classify("https://news.example.org/a"), domain("news.example.org"));
    }

    #[test]
    fn test_percent_encoded_value() {
        assert_eq!(classify("||example.com%2Fpath"), domain("example.com"));
    }

    #[test]
    fn test_wildcard_suffix_becomes_keyword() {
        assert_eq!(
            classify(".google.*"),
            Classification::DomainKeyword("google".to_string())
        );
        assert_eq!(
            classify(".*.example.*"),
            Classification::DomainKeyword("example".to_string())
        );
    }

    #[test]
    fn test_wildcard_edges_drop_the_joining_dot() {
        assert_eq!(classify("||*.example.*"), domain("example"));
        assert_eq!(classify("|http://*.example.com"), domain("example.com"));
        assert_eq!(classify("*.cdn.example.com/path"), domain("cdn.example.com"));
    }

    #[test]
    fn test_only_literal_addresses_are_ips() {
        // Octal, shorthand and hex forms stay domains with their text intact.
        assert_eq!(classify("010.10.10.10"), domain("010.10.10.10"));
        assert_eq!(classify("1.2.3"), domain("1.2.3"));
        assert_eq!(classify("0x7f.1"), domain("0x7f.1"));
        assert_eq!(classify("||0x7f.1"), domain("0x7f.1"));
        assert_eq!(classify("|http://010.10.10.10/"), domain("010.10.10.10"));
    }

    #[test]
    fn test_numeric_last_label_is_still_a_domain() {
        assert_eq!(classify("example.123"), domain("example.123"));
        assert_eq!(classify("|http://1.2.3.4.5/"), domain("1.2.3.4.5"));
        assert_eq!(classify("||ads.example.123^"), domain("example.123"));
    }

    #[test]
    fn test_literal_address_with_port() {
        assert_eq!(classify("|http://1.2.3.4:8080/x"), ip("1.2.3.4"));
        assert_eq!(classify("||[2001:db8::1]:443"), ip("2001:db8::1"));
    }

    #[test]
    fn test_raw_host() {
        assert_eq!(raw_host("http://user@host.com:80/p?q#f"), "host.com");
        assert_eq!(raw_host("http://[::1]/x"), "::1");
        assert_eq!(raw_host("http://[::1"), "");
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert_eq!(classify("google"), Classification::Unknown);
        assert_eq!(classify("|http://[::1"), Classification::Unknown);
        assert_eq!(classify("|http://exa mple.com"), Classification::Unknown);
        assert_eq!(classify("||*"), Classification::Unknown);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let lines = ["||a.example.com", ".b.example.com", "1.1.1.1", "|c.example.com"];
        for line in lines {
            assert_eq!(classify(line), classify(line));
        }
    }

    #[test]
    fn test_last_two_labels() {
        assert_eq!(last_two_labels("a.b.c.d"), "c.d");
        assert_eq!(last_two_labels("c.d"), "c.d");
        assert_eq!(last_two_labels("localhost"), "localhost");
    }
}
