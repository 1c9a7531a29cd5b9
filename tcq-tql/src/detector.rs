//! Indicator type detection.
//!
//! Every predicate matches from the start of the input, so trailing text after
//! a recognisable indicator does not prevent a match. Detection order is fixed
//! and the first predicate that matches wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tcq_core::indicator_types;

/// Indicator types that can be inferred from a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    File,
    Url,
    EmailAddress,
    Address,
    Host,
}

impl IndicatorKind {
    /// Backend type name, as used in `typeName in (...)` clauses.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::File => indicator_types::FILE,
            IndicatorKind::Url => indicator_types::URL,
            IndicatorKind::EmailAddress => indicator_types::EMAIL_ADDRESS,
            IndicatorKind::Address => indicator_types::ADDRESS,
            IndicatorKind::Host => indicator_types::HOST,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

const OCTET: &str = r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";

static MD5: Lazy<Regex> = Lazy::new(|| compile(r"^[a-fA-F0-9]{32}\b"));
static SHA1: Lazy<Regex> = Lazy::new(|| compile(r"^[a-fA-F0-9]{40}\b"));
static SHA256: Lazy<Regex> = Lazy::new(|| compile(r"^[a-fA-F0-9]{64}\b"));

static IPV4: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^{o}\.{o}\.{o}\.{o}\b", o = OCTET)));

// Full eight-group form, or a compressed form with `::`. The trailing group
// stands in for "not followed by another address character".
static IPV6: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"^(?:(?:[a-fA-F0-9]{1,4}:){7}[a-fA-F0-9]{1,4}|(?:(?:[a-fA-F0-9]{1,4}:){1,7}|:)(?:(?::[a-fA-F0-9]{1,4}){1,7}|:))(?:$|[^a-zA-Z0-9:])",
    )
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)^[a-z0-9!#$%\&'*+/=?^_`{|}\~\-]+(?:\.[a-z0-9!#$%\&'*+/=?^_`{|}\~\-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])",
    )
});

// Scheme, then a lowercase domain whose last label is 2-24 chars starting and
// ending with a letter, or a dotted quad.
static URL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^(?:https?|s?ftp|tcp|file)://(?:(?:[a-z0-9_-]{{1,63}}\.)*[a-z][-a-z0-9]{{0,22}}[a-z]|(?:{o}\.){{3}}{o})\b",
        o = OCTET
    ))
});

static HOST_LABEL: Lazy<Regex> =
    Lazy::new(|| compile(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\."));
static HOST_TLD: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)^(?:xn--[a-zA-Z0-9]{2,22}|[a-zA-Z]{2,13})"));

/// A would-be top-level label starting with one of these reads as a file
/// extension or a sandbox artefact, not a domain.
const EXCLUDED_TLD_PREFIXES: &[&str] = &[
    "apk", "apt", "arpa", "asp", "bat", "bdoda", "bin", "bsspx", "cer", "cfg", "cgi", "class",
    "close", "cpl", "cpp", "crl", "css", "dll", "doc", "docx", "dyn", "exe", "fl", "gz", "hlp",
    "htm", "html", "ico", "ini", "ioc", "jar", "jpg", "js", "jxr", "lco", "lnk", "loader", "log",
    "lxdns", "mdb", "mp4", "odt", "pcap", "pdb", "pdf", "php", "plg", "plist", "png", "ppt",
    "pptx", "quit", "rar", "rtf", "scr", "sleep", "ssl", "torproject", "tmp", "txt", "vbp", "vbs",
    "w32", "wav", "xls", "xlsx", "xml", "xpi",
];

/// Excluded only when nothing else follows them.
const EXCLUDED_TLD_WORDS: &[&str] = &["dat", "gif"];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

// ============================================================================
// PREDICATES
// ============================================================================

pub fn is_md5(value: &str) -> bool {
    MD5.is_match(value)
}

pub fn is_sha1(value: &str) -> bool {
    SHA1.is_match(value)
}

pub fn is_sha256(value: &str) -> bool {
    SHA256.is_match(value)
}

/// Shortest authority-plus-path accepted after the scheme separator.
const MIN_URL_REMAINDER: usize = 4;

pub fn is_url(value: &str) -> bool {
    let long_enough = value
        .split_once("://")
        .is_some_and(|(_, rest)| rest.chars().count() >= MIN_URL_REMAINDER);
    long_enough && URL.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub fn is_ipv6(value: &str) -> bool {
    IPV6.is_match(value)
}

pub fn is_ipv4(value: &str) -> bool {
    IPV4.is_match(value)
}

/// One or more DNS labels followed by a top-level label that does not look
/// like a file extension, with no `@` after it.
///
/// Candidates are tried from the most labels to the fewest, so
/// `sub.report.pdf` still matches as the host `sub.report`.
pub fn is_host(value: &str) -> bool {
    let mut offset = 0;
    let mut tld_starts = Vec::new();
    while let Some(label) = HOST_LABEL.find(&value[offset..]) {
        offset += label.end();
        tld_starts.push(offset);
    }

    tld_starts.iter().rev().any(|&start| {
        let rest = &value[start..];
        if is_excluded_tld(rest) {
            return false;
        }
        match HOST_TLD.find(rest) {
            Some(tld) => {
                let tail = &rest[tld.end()..];
                let tail_line = tail.split('\n').next().unwrap_or_default();
                !tail_line.contains('@')
            }
            None => false,
        }
    })
}

fn is_excluded_tld(rest: &str) -> bool {
    let lower = rest.to_ascii_lowercase();
    if EXCLUDED_TLD_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    let at_end = |word: &str| {
        lower == word
            || lower.strip_prefix(word).is_some_and(|tail| tail == "\n" || tail.starts_with("\r\n"))
    };
    EXCLUDED_TLD_WORDS.iter().any(|w| at_end(w)) || lower == "xn" || lower == "xn\n"
}

type Predicate = fn(&str) -> bool;

/// Most specific first. Hashes precede everything so a 64-hex digest is never
/// read as a hostname; URLs precede hosts for the same reason.
const DETECTION_ORDER: &[(Predicate, IndicatorKind)] = &[
    (is_sha256, IndicatorKind::File),
    (is_sha1, IndicatorKind::File),
    (is_md5, IndicatorKind::File),
    (is_url, IndicatorKind::Url),
    (is_email, IndicatorKind::EmailAddress),
    (is_ipv6, IndicatorKind::Address),
    (is_ipv4, IndicatorKind::Address),
    (is_host, IndicatorKind::Host),
];

/// Classify a raw indicator value. `None` means no pattern matched.
pub fn detect_indicator_type(value: &str) -> Option<IndicatorKind> {
    DETECTION_ORDER
        .iter()
        .find(|(matches, _)| matches(value))
        .map(|(_, kind)| *kind)
}

const TQL_KEYWORDS: &[&str] = &[
    "typename",
    "summary",
    "rating",
    "confidence",
    " in ",
    " and ",
    " or ",
    "dateadded",
];

/// Heuristic: does free text already read like TQL?
pub fn looks_like_tql(query: &str) -> bool {
    let lower = query.to_lowercase();
    TQL_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MD5_HEX: &str = "5d41402abc4b2a76b9719d911017c592";
    const SHA1_HEX: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
    const SHA256_HEX: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_hashes_are_files() {
        assert_eq!(detect_indicator_type(MD5_HEX), Some(IndicatorKind::File));
        assert_eq!(detect_indicator_type(SHA1_HEX), Some(IndicatorKind::File));
        assert_eq!(detect_indicator_type(SHA256_HEX), Some(IndicatorKind::File));
        assert_eq!(
            detect_indicator_type(&SHA256_HEX.to_uppercase()),
            Some(IndicatorKind::File)
        );
    }

    #[test]
    fn test_hash_lengths_are_exact() {
        assert!(is_md5(MD5_HEX));
        assert!(!is_md5(SHA1_HEX));
        assert!(!is_sha1(SHA256_HEX));
        assert!(!is_md5(&MD5_HEX[..31]));
    }

    #[test]
    fn test_ipv4() {
        assert_eq!(detect_indicator_type("192.168.1.1"), Some(IndicatorKind::Address));
        assert!(is_ipv4("255.255.255.255"));
        assert!(is_ipv4("0.0.0.0"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("192.168.1"));
        assert!(!is_ipv4("192.168.1.1abc"));
    }

    #[test]
    fn test_ipv6() {
        assert!(is_ipv6("2001:0db8:85a3:0000:0000:8a2e:0370:7334"));
        assert!(is_ipv6("2001:db8::1"));
        assert!(is_ipv6("::1"));
        assert!(!is_ipv6("2001:db8::1g"));
        assert!(!is_ipv6("evil.com"));
        assert_eq!(detect_indicator_type("fe80::1"), Some(IndicatorKind::Address));
    }

    #[test]
    fn test_email() {
        assert_eq!(
            detect_indicator_type("test@example.com"),
            Some(IndicatorKind::EmailAddress)
        );
        assert!(is_email("first.last+tag@mail.example.org"));
        assert!(!is_email("no-at-sign.example.com"));
    }

    #[test]
    fn test_url_precedes_host() {
        assert_eq!(
            detect_indicator_type("http://evil.com/payload.exe"),
            Some(IndicatorKind::Url)
        );
        assert_eq!(
            detect_indicator_type("https://10.0.0.5:8443/login"),
            Some(IndicatorKind::Url)
        );
        assert!(is_url("ftp://files.example.net"));
        assert!(is_url("tcp://c2.example.io"));
        assert!(!is_url("evil.com"));
        assert!(!is_url("gopher://evil.com"));
    }

    #[test]
    fn test_url_needs_four_chars_after_scheme() {
        assert!(!is_url("http://ab"));
        assert!(!is_url("ftp://abc"));
        assert_eq!(detect_indicator_type("http://ab"), None);
        assert!(is_url("http://abcd"));
        assert!(is_url("http://ab/x"));
    }

    #[test]
    fn test_host() {
        assert_eq!(detect_indicator_type("evil.com"), Some(IndicatorKind::Host));
        assert_eq!(detect_indicator_type("mail.bad-domain.co.uk"), Some(IndicatorKind::Host));
        assert!(is_host("xn--80ak6aa92e.xn--p1ai"));
        assert!(!is_host("-evil.com"));
        assert!(!is_host("localhost"));
    }

    #[test]
    fn test_file_names_are_not_hosts() {
        assert!(!is_host("report.pdf"));
        assert!(!is_host("dropper.exe"));
        assert!(!is_host("index.html"));
        assert!(!is_host("image.gif"));
        assert_eq!(detect_indicator_type("report.pdf"), None);
    }

    #[test]
    fn test_excluded_words_only_at_end() {
        assert!(!is_host("dump.dat"));
        assert!(is_host("server.data"));
    }

    #[test]
    fn test_host_falls_back_to_fewer_labels() {
        // "pdf" is rejected as the last label, "report" is accepted.
        assert!(is_host("sub.report.pdf"));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(detect_indicator_type("not-a-valid-anything-###"), None);
        assert_eq!(detect_indicator_type("APT29"), None);
        assert_eq!(detect_indicator_type(""), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(IndicatorKind::Address.as_str(), "Address");
        assert_eq!(IndicatorKind::Url.to_string(), "URL");
        assert_eq!(IndicatorKind::EmailAddress.as_str(), "EmailAddress");
    }

    #[test]
    fn test_looks_like_tql() {
        assert!(looks_like_tql(r#"typeName in ("Host")"#));
        assert!(looks_like_tql("RATING >= 3"));
        assert!(looks_like_tql("fancy bear and cozy bear"));
        assert!(!looks_like_tql("evil.com"));
        assert!(!looks_like_tql("APT29"));
    }
}
