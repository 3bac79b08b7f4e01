//! Pure content predicates over strings.
//!
//! Each predicate returns a list of human-readable problems; an empty list
//! means the value is acceptable. Predicates know nothing about field paths
//! or operations, which keeps them reusable from any validator.

use std::sync::OnceLock;

use regex::Regex;

const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";

/// A DNS label's max length (RFC 1123).
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

fn dns_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).expect("static pattern"))
}

/// Returns the canonical message for a string that exceeds `max` characters.
pub fn max_len_error(max: i64) -> String {
    format!("must be no more than {max} characters")
}

/// Returns the canonical message for an integer below `min`.
pub fn min_error(min: i64) -> String {
    format!("must be greater than or equal to {min}")
}

/// Checks that `value` parses as a label per the DNS RFC 1123 definition:
/// non-empty, at most 63 characters, lower-case alphanumerics and dashes,
/// starting and ending with an alphanumeric.
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.chars().count() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(max_len_error(DNS1123_LABEL_MAX_LENGTH as i64));
    }
    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let first_ok = value.chars().next().is_some_and(is_alnum);
    let last_ok = value.chars().last().is_some_and(is_alnum);
    if !first_ok || !last_ok {
        errs.push("must start and end with lower-case alphanumeric characters".to_string());
    }
    if !dns_label_regex().is_match(value) {
        errs.push("must consist of lower-case alphanumeric characters or '-'".to_string());
    }
    errs
}

/// Checks that `value` is an IP address, accepting IPv4 octets with leading
/// zeros. The exact acceptance set is a compatibility boundary; callers
/// dispatch to this predicate through the format-name lookup so it can be
/// swapped without touching the tag surface.
pub fn is_ip_sloppy(value: &str) -> Vec<String> {
    if value.parse::<std::net::IpAddr>().is_ok() {
        return Vec::new();
    }
    if parse_sloppy_ipv4(value) {
        return Vec::new();
    }
    vec!["must be a valid IP address".to_string()]
}

// Accepts dotted-quad IPv4 where each octet may carry leading zeros but is
// still interpreted as decimal.
fn parse_sloppy_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    if octets.len() != 4 {
        return false;
    }
    octets.iter().all(|o| {
        !o.is_empty()
            && o.len() <= 3
            && o.chars().all(|c| c.is_ascii_digit())
            && o.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
    })
}
