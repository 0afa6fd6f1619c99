//! Masking for values that may carry personal data or secrets before they
//! reach the logs.

use std::fmt;

use lazy_regex::{lazy_regex, Lazy, Regex};

static EMAIL: Lazy<Regex> = lazy_regex!(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b");
static OPAQUE_TOKEN: Lazy<Regex> = lazy_regex!(r"\b[A-Za-z0-9+/]{24,}={0,2}\b");

/// Keeps the first character of an email's local part and the domain;
/// replaces long opaque runs (JWTs, secrets) with `[REDACTED_TOKEN]`.
pub fn redact(input: &str) -> String {
    let emails = EMAIL.replace_all(input, |caps: &lazy_regex::regex::Captures| {
        let full = &caps[0];
        match full.find('@') {
            Some(0) | None => full.to_string(),
            Some(at) => format!("{}***{}", &full[..1], &full[at..]),
        }
    });
    OPAQUE_TOKEN
        .replace_all(&emails, "[REDACTED_TOKEN]")
        .into_owned()
}

/// Display wrapper that redacts on format.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
