//! Built-in predicates.
//!
//! Every predicate takes the argument list built by the engine: the field's
//! value first, then the resolved rule parameters. Missing arguments read as
//! `null`.

use crate::rule::Predicate;
use crate::value::{loose_eq, parse_numeric, text_form, NULL};
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};

// Pre-compiled regex patterns
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static FILENAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        // RFC 5322 simplified, with a mandatory dotted domain
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
        ).expect("email pattern is valid")
    })
}

fn alpha_regex() -> &'static Regex {
    ALPHA_REGEX.get_or_init(|| Regex::new(r"^[a-zA-ZÀ-ÖØ-öø-ÿ]+$").expect("alpha pattern is valid"))
}

fn alpha_numeric_regex() -> &'static Regex {
    ALPHA_NUMERIC_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-ZÀ-ÖØ-öø-ÿ0-9]+$").expect("alpha_numeric pattern is valid"))
}

fn filename_regex() -> &'static Regex {
    FILENAME_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z]+$").expect("filename pattern is valid"))
}

/// Answers whether a path names an existing directory.
///
/// `isdir` and `is_path` go through this so the filesystem can be swapped out.
pub trait DirectoryProbe: Send + Sync {
    fn is_dir(&self, path: &str) -> bool;
}

/// [`DirectoryProbe`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl DirectoryProbe for FsProbe {
    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn matches_text(value: &Value, regex: &Regex) -> bool {
    text_form(value).map_or(false, |text| regex.is_match(&text))
}

/// Non-null and, once trimmed, non-empty. Empty arrays and objects and
/// `false` fail; numbers (zero included) pass.
pub fn required(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

pub fn numeric(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::Number(_) => true,
        Value::String(s) => parse_numeric(s).is_some(),
        _ => false,
    }
}

/// Integers, integral floats inside the `i64` range, and strings that parse
/// as `i64`.
pub fn integer(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                return true;
            }
            n.as_f64().map_or(false, |f| {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
            })
        }
        Value::String(s) => s.parse::<i64>().is_ok(),
        _ => false,
    }
}

pub fn float(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::Number(_) => true,
        Value::String(s) => s.parse::<f64>().map_or(false, f64::is_finite),
        _ => false,
    }
}

pub fn alpha(args: &[Value]) -> bool {
    matches_text(arg(args, 0), alpha_regex())
}

pub fn alpha_numeric(args: &[Value]) -> bool {
    matches_text(arg(args, 0), alpha_numeric_regex())
}

pub fn email(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::String(s) => {
            let local = s.split('@').next().unwrap_or_default();
            email_regex().is_match(s)
                && !local.starts_with('.')
                && !local.ends_with('.')
                && !local.contains("..")
        }
        _ => false,
    }
}

pub fn ip(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::String(s) => s.parse::<IpAddr>().is_ok(),
        _ => false,
    }
}

/// Schemes that are valid without a host.
const HOSTLESS_SCHEMES: &[&str] = &["mailto", "news", "file"];

/// Any scheme is accepted. The text must parse as an absolute URL, contain no
/// whitespace and name a host unless the scheme is in [`HOSTLESS_SCHEMES`].
pub fn url(args: &[Value]) -> bool {
    match arg(args, 0) {
        Value::String(s) if !s.chars().any(char::is_whitespace) => ::url::Url::parse(s)
            .map_or(false, |parsed| {
                parsed.has_host() || HOSTLESS_SCHEMES.contains(&parsed.scheme())
            }),
        _ => false,
    }
}

fn length_of(value: &Value) -> Option<usize> {
    text_form(value).map(|text| text.chars().count())
}

/// The limit compares numerically, so `3.0` and `"3"` both work.
fn length_limit(rule: &str, param: &Value) -> Option<f64> {
    let limit = match param {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    };
    if limit.is_none() {
        tracing::warn!(rule, param = %param, "Length rule needs a numeric limit");
    }
    limit
}

fn compare_length(rule: &str, args: &[Value], cmp: fn(f64, f64) -> bool) -> bool {
    match (length_of(arg(args, 0)), length_limit(rule, arg(args, 1))) {
        (Some(len), Some(limit)) => cmp(len as f64, limit),
        _ => false,
    }
}

pub fn max_length(args: &[Value]) -> bool {
    compare_length("max_length", args, |len, limit| len <= limit)
}

pub fn min_length(args: &[Value]) -> bool {
    compare_length("min_length", args, |len, limit| len >= limit)
}

pub fn exact_length(args: &[Value]) -> bool {
    compare_length("exact_length", args, |len, limit| len == limit)
}

pub fn equals(args: &[Value]) -> bool {
    loose_eq(arg(args, 0), arg(args, 1))
}

/// `name.ext`: word characters or hyphens, one dot, alphabetic extension.
pub fn is_filename(args: &[Value]) -> bool {
    matches_text(arg(args, 0), filename_regex())
}

/// Arrays and objects.
pub fn isarray(args: &[Value]) -> bool {
    matches!(arg(args, 0), Value::Array(_) | Value::Object(_))
}

fn directory_predicate(probe: Arc<dyn DirectoryProbe>) -> Predicate {
    Arc::new(move |args: &[Value]| match arg(args, 0) {
        Value::String(path) if !path.is_empty() => probe.is_dir(path),
        _ => false,
    })
}

/// Pure built-ins, keyed by rule id.
const PURE_BUILTINS: [(&str, fn(&[Value]) -> bool); 15] = [
    ("required", required),
    ("numeric", numeric),
    ("integer", integer),
    ("float", float),
    ("alpha", alpha),
    ("alpha_numeric", alpha_numeric),
    ("email", email),
    ("ip", ip),
    ("url", url),
    ("max_length", max_length),
    ("min_length", min_length),
    ("exact_length", exact_length),
    ("equals", equals),
    ("is_filename", is_filename),
    ("isarray", isarray),
];

/// The full built-in predicate table, directory rules included.
pub(crate) fn builtins(probe: Arc<dyn DirectoryProbe>) -> Vec<(&'static str, Predicate)> {
    let isdir = directory_predicate(probe);
    let mut table: Vec<(&'static str, Predicate)> = PURE_BUILTINS
        .into_iter()
        .map(|(id, predicate)| (id, Arc::new(predicate) as Predicate))
        .collect();
    table.push(("is_path", Arc::clone(&isdir)));
    table.push(("isdir", isdir));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(predicate: fn(&[Value]) -> bool, value: Value) -> bool {
        predicate(&[value])
    }

    #[test]
    fn required_values() {
        assert!(!check(required, json!(null)));
        assert!(!check(required, json!("")));
        assert!(!check(required, json!("   ")));
        assert!(!check(required, json!([])));
        assert!(check(required, json!("0")));
        assert!(check(required, json!(0.0)));
        assert!(check(required, json!(" x ")));
        assert!(check(required, json!(true)));
        assert!(!check(required, json!(false)));
        assert!(!required(&[]));
    }

    #[test]
    fn numeric_values() {
        assert!(check(numeric, json!(12)));
        assert!(check(numeric, json!("-1.5")));
        assert!(check(numeric, json!("1e10")));
        assert!(!check(numeric, json!("12abc")));
        assert!(!check(numeric, json!("0x1A")));
        assert!(!check(numeric, json!(null)));
    }

    #[test]
    fn integer_values() {
        assert!(check(integer, json!(15)));
        assert!(check(integer, json!("15")));
        assert!(check(integer, json!(-15)));
        assert!(check(integer, json!(0x1A)));
        assert!(check(integer, json!(0o123)));
        assert!(check(integer, json!(15.0)));
        assert!(!check(integer, json!(15.5)));
        assert!(!check(integer, json!("test12")));
        assert!(!check(integer, json!(9e19)));
        assert!(!check(integer, json!(-9e19)));
        assert!(!check(integer, json!("")));
        assert!(!check(integer, json!(null)));
    }

    #[test]
    fn float_values() {
        assert!(check(float, json!(1.5)));
        assert!(check(float, json!(3)));
        assert!(check(float, json!("2.25")));
        assert!(!check(float, json!("inf")));
        assert!(!check(float, json!("NaN")));
        assert!(!check(float, json!("abc")));
    }

    #[test]
    fn alpha_values() {
        assert!(check(alpha, json!("ABCDE")));
        assert!(check(alpha, json!("Crème")));
        assert!(!check(alpha, json!("ABCDE123")));
        assert!(!check(alpha, json!("ABCDE123?!@")));
        assert!(!check(alpha, json!("")));
        assert!(check(alpha_numeric, json!("ABCDE123")));
        assert!(!check(alpha_numeric, json!("ABC DE")));
    }

    #[test]
    fn latin1_signs_are_not_letters() {
        assert!(check(alpha, json!("ÀØàøÿ")));
        assert!(!check(alpha, json!("a÷b")));
        assert!(!check(alpha, json!("a×b")));
        assert!(check(alpha_numeric, json!("Øre42")));
        assert!(!check(alpha_numeric, json!("4×2")));
    }

    #[test]
    fn email_values() {
        assert!(check(email, json!("geliscan@gmail.com")));
        assert!(check(email, json!("user.name+tag@domain.co.uk")));
        assert!(!check(email, json!("formcheck")));
        assert!(!check(email, json!("user@localhost")));
        assert!(!check(email, json!(".user@example.com")));
        assert!(!check(email, json!("us..er@example.com")));
        assert!(!check(email, json!("")));
        assert!(!check(email, json!(null)));
    }

    #[test]
    fn ip_values() {
        assert!(check(ip, json!("89.250.130.65")));
        assert!(check(ip, json!("2a03:2880:10:1f02:face:b00c::25")));
        assert!(!check(ip, json!("89.300.130.65")));
        assert!(!check(ip, json!("Simple Validator")));
    }

    #[test]
    fn url_values() {
        assert!(check(url, json!("http://www.google.com")));
        assert!(check(url, json!("mailto:geliscan@gmail.com")));
        assert!(check(url, json!("ldap://[2001:db8::7]/c=GB?objectClass?one")));
        assert!(check(url, json!("telnet://melvyl.ucop.example.edu/")));
        assert!(!check(url, json!("www.google.com")));
        assert!(!check(url, json!("geliscan@gmail.com")));
        assert!(!check(url, json!("simple validator")));
        assert!(!check(url, json!("http://")));
        assert!(check(url, json!("news:comp.lang.rust")));
        assert!(check(url, json!("file:///etc/hosts")));
    }

    #[test]
    fn length_boundaries() {
        let ten = json!("abcdefghij");
        let eleven = json!("abcdefghijk");
        let limit = json!("10");
        assert!(max_length(&[ten.clone(), limit.clone()]));
        assert!(min_length(&[ten.clone(), limit.clone()]));
        assert!(exact_length(&[ten, limit.clone()]));
        assert!(!max_length(&[eleven.clone(), limit.clone()]));
        assert!(min_length(&[eleven.clone(), limit.clone()]));
        assert!(!exact_length(&[eleven, limit]));
    }

    #[test]
    fn length_counts_characters() {
        assert!(exact_length(&[json!("àèì"), json!(3)]));
        assert!(exact_length(&[json!(12345), json!("5")]));
    }

    #[test]
    fn length_without_limit_fails() {
        assert!(!max_length(&[json!("abc")]));
        assert!(!max_length(&[json!("abc"), json!("ten")]));
        assert!(!max_length(&[json!(["a"]), json!(3)]));
        assert!(!max_length(&[json!("abc"), json!(null)]));
    }

    #[test]
    fn length_limit_is_numeric() {
        assert!(max_length(&[json!("ab"), json!(3.0)]));
        assert!(max_length(&[json!("abc"), json!("3.0")]));
        assert!(!max_length(&[json!("abcd"), json!(3.5)]));
        assert!(min_length(&[json!("abcd"), json!(3.5)]));
        assert!(exact_length(&[json!("abc"), json!(3.0)]));
        assert!(!exact_length(&[json!("abc"), json!(2.5)]));
    }

    #[test]
    fn host_required_unless_scheme_allows_none() {
        for text in ["localhost:8080", "www.google.com:443", "foo:bar", "C:\\Windows", "user:pass"] {
            assert!(!check(url, json!(text)), "{text} should not be a URL");
        }
    }

    #[test]
    fn equals_is_loose() {
        assert!(equals(&[json!("foo"), json!("foo")]));
        assert!(!equals(&[json!("foo"), json!("foo2")]));
        assert!(!equals(&[json!("foo"), json!(null)]));
        assert!(!equals(&[json!("foo"), json!("")]));
        assert!(equals(&[json!(3), json!("3")]));
    }

    #[test]
    fn filename_values() {
        assert!(check(is_filename, json!("report_2024-final.pdf")));
        assert!(!check(is_filename, json!("archive.tar.gz")));
        assert!(!check(is_filename, json!("noext")));
        assert!(!check(is_filename, json!("file.mp3")));
    }

    #[test]
    fn isarray_values() {
        assert!(check(isarray, json!([1, 2])));
        assert!(check(isarray, json!({"a": 1})));
        assert!(!check(isarray, json!("a,b")));
    }

    struct OnlyTmp;

    impl DirectoryProbe for OnlyTmp {
        fn is_dir(&self, path: &str) -> bool {
            path == "/tmp"
        }
    }

    #[test]
    fn directory_predicate_uses_probe() {
        let isdir = directory_predicate(Arc::new(OnlyTmp));
        assert!(isdir(&[json!("/tmp")]));
        assert!(!isdir(&[json!("/etc")]));
        assert!(!isdir(&[json!("")]));
        assert!(!isdir(&[json!(5)]));
    }

    #[test]
    fn fs_probe_sees_real_directories() {
        let dir = std::env::temp_dir();
        assert!(FsProbe.is_dir(dir.to_str().unwrap()));
        assert!(!FsProbe.is_dir("/definitely/not/a/dir/formcheck"));
    }
}
