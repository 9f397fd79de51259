//! Runtime option set for the `varnishd` command line.
//!
//! Options are deduplicated by a hashing key: the flag alone for single-value
//! flags, the whole option for `-p`, `-a` and `-s`, which may legitimately
//! repeat with different arguments. Later insertions replace earlier ones
//! under the same key. Enumeration puts `-j` (jail) first and sorts the rest
//! lexicographically.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

/// Flags whose argument lists repeat rather than replace each other.
const MULTI_VALUE_FLAGS: [&str; 3] = ["-p", "-a", "-s"];

/// Flag that must precede every other option.
const JAIL_FLAG: &str = "-j";

/// Ordered, deduplicated collection of escaped runtime options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptionSet {
    entries: BTreeMap<String, String>,
}

impl RuntimeOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `option`, replacing any entry with the same hashing key.
    ///
    /// Options without a leading `-<letter|digit>` flag are dropped silently.
    pub fn add(&mut self, option: &str) -> &mut Self {
        let (Some(key), Some(escaped)) = (hashing_key(option), escape(option)) else {
            trace!(option, "dropping malformed runtime option");
            return self;
        };
        self.entries.insert(key, escaped);
        self
    }

    /// Remove the entry sharing `option`'s hashing key. Returns whether one existed.
    pub fn delete(&mut self, option: &str) -> bool {
        hashing_key(option).is_some_and(|key| self.entries.remove(&key).is_some())
    }

    /// Whether an entry shares `option`'s hashing key.
    pub fn contains(&self, option: &str) -> bool {
        hashing_key(option).is_some_and(|key| self.entries.contains_key(&key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Escaped options in enumeration order.
    pub fn to_vec(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.values().collect();
        values.sort_by(|a, b| jail_first(a, b));
        values
    }

    pub fn iter(&self) -> std::vec::IntoIter<&str> {
        self.to_vec().into_iter()
    }

    /// Option at `index` in enumeration order.
    ///
    /// Sorts the whole set on each call; iterate [`to_vec`](Self::to_vec)
    /// instead of indexing in a loop.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.to_vec().get(index).copied()
    }

    /// First option in enumeration order, found in one linear pass.
    pub fn first(&self) -> Option<&str> {
        self.values().min_by(|a, b| jail_first(a, b))
    }

    /// Last option in enumeration order, found in one linear pass.
    pub fn last(&self) -> Option<&str> {
        self.values().max_by(|a, b| jail_first(a, b))
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Space-joined startup argument string.
    pub fn to_args_string(&self) -> String {
        self.to_vec().join(" ")
    }
}

impl fmt::Display for RuntimeOptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args_string())
    }
}

impl<S: AsRef<str>> Extend<S> for RuntimeOptionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for option in iter {
            self.add(option.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for RuntimeOptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a RuntimeOptionSet {
    type Item = &'a str;
    type IntoIter = std::vec::IntoIter<&'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn jail_first(a: &str, b: &str) -> Ordering {
    match (a.starts_with(JAIL_FLAG), b.starts_with(JAIL_FLAG)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    }
}

/// Identity of `option` within the set. `None` for blank input.
fn hashing_key(option: &str) -> Option<String> {
    let option = option.trim();
    if option.is_empty() {
        return None;
    }
    if MULTI_VALUE_FLAGS.iter().any(|flag| option.starts_with(flag)) {
        return Some(option.to_string());
    }
    option.split_whitespace().next().map(str::to_string)
}

/// Escaped form `<flag>[ <arg>]`, or `None` if the flag is malformed.
fn escape(option: &str) -> Option<String> {
    let cleaned: String = option
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .collect();

    let (flag, rest) = match cleaned.find(char::is_whitespace) {
        Some(idx) => (&cleaned[..idx], Some(cleaned[idx..].trim_start())),
        None => (cleaned.as_str(), None),
    };

    let mut chars = flag.chars();
    if chars.next() != Some('-') || !chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(match rest {
        None => flag.to_string(),
        Some(rest) => match rest.split_once('=') {
            Some((key, value)) => format!(
                "{flag} {}={}",
                shell_escape(key.trim_end()),
                shell_escape(value.trim_start())
            ),
            None => format!("{flag} {}", shell_escape(rest)),
        },
    })
}

/// Escape `word` for a POSIX shell by backslash-prefixing every character
/// outside `[A-Za-z0-9_\-.,:+/@]`. Empty input becomes `''`.
pub fn shell_escape(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    let mut escaped = String::with_capacity(word.len() * 2);
    for c in word.chars() {
        match c {
            '\n' => escaped.push_str("'\n'"),
            c if c.is_ascii_alphanumeric() || "_-.,:+/@".contains(c) => escaped.push(c),
            c => {
                escaped.push('\\');
                escaped.push(c);
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_key_single_value_flag() {
        assert_eq!(hashing_key("  -b 0 ").as_deref(), Some("-b"));
        assert_eq!(hashing_key("-c").as_deref(), Some("-c"));
        assert_eq!(hashing_key("-j unix,user=a").as_deref(), Some("-j"));
    }

    #[test]
    fn test_hashing_key_multi_value_flag() {
        assert_eq!(hashing_key(" -a 1,2,3 ").as_deref(), Some("-a 1,2,3"));
        assert_eq!(hashing_key("-p a=b").as_deref(), Some("-p a=b"));
        assert_eq!(hashing_key("-s malloc,1g").as_deref(), Some("-s malloc,1g"));
    }

    #[test]
    fn test_hashing_key_blank() {
        assert_eq!(hashing_key(""), None);
        assert_eq!(hashing_key(" \t "), None);
    }

    #[test]
    fn test_escape_forms() {
        assert_eq!(escape("-c").as_deref(), Some("-c"));
        assert_eq!(escape("-a 1,2,3").as_deref(), Some("-a 1,2,3"));
        assert_eq!(escape("-p thread_pools = 4").as_deref(), Some("-p thread_pools=4"));
        assert_eq!(escape("-j unix,user=vcache").as_deref(), Some("-j unix,user=vcache"));
        assert_eq!(escape("-d hello world").as_deref(), Some("-d hello\\ world"));
        assert_eq!(escape("-p cc_command=").as_deref(), Some("-p cc_command=''"));
    }

    #[test]
    fn test_escape_strips_quotes() {
        assert_eq!(escape("-d 'e'").as_deref(), Some("-d e"));
        assert_eq!(escape("\"-f /etc/varnish/default.vcl\"").as_deref(), Some("-f /etc/varnish/default.vcl"));
    }

    #[test]
    fn test_escape_rejects_malformed_flag() {
        assert_eq!(escape("b 0"), None);
        assert_eq!(escape("--"), None);
        assert_eq!(escape("-"), None);
        assert_eq!(escape(""), None);
    }

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape(""), "''");
        assert_eq!(shell_escape("abc/def.1:2,3+4@5_-"), "abc/def.1:2,3+4@5_-");
        assert_eq!(shell_escape("a b"), "a\\ b");
        assert_eq!(shell_escape("$HOME;"), "\\$HOME\\;");
        assert_eq!(shell_escape("a\nb"), "a'\n'b");
    }

    #[test]
    fn test_jail_sorts_first() {
        let mut set = RuntimeOptionSet::new();
        set.add("-a :6081").add("-j unix,user=vcache").add("-F");
        assert_eq!(set.to_vec(), vec!["-j unix,user=vcache", "-F", "-a :6081"]);
    }

    #[test]
    fn test_iteration_apis_agree() {
        let set: RuntimeOptionSet = ["-b 0", "-a 1,2,3", "-c"].into_iter().collect();
        assert_eq!(set.first(), Some("-a 1,2,3"));
        assert_eq!(set.get(1), Some("-b 0"));
        assert_eq!(set.last(), Some("-c"));
        assert_eq!(set.get(3), None);
        let collected: Vec<&str> = (&set).into_iter().collect();
        assert_eq!(collected, set.to_vec());
        assert_eq!(set.to_string(), "-a 1,2,3 -b 0 -c");
    }

    #[test]
    fn test_first_and_last_match_sorted_order() {
        let set: RuntimeOptionSet = ["-s malloc,1g", "-F", "-j none", "-a :80", "-T :6082"]
            .into_iter()
            .collect();
        let sorted = set.to_vec();
        assert_eq!(sorted[0], "-j none");
        assert_eq!(set.first(), sorted.first().copied());
        assert_eq!(set.last(), sorted.last().copied());
        assert_eq!(set.last(), Some("-s malloc,1g"));

        let empty = RuntimeOptionSet::new();
        assert_eq!(empty.first(), None);
        assert_eq!(empty.last(), None);
        assert_eq!(empty.get(0), None);
    }
}
