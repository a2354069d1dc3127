//! Named-capture helpers over the `regex` crate.
//!
//! The config and query parsers lean heavily on named capture groups;
//! these helpers surface each match as a `group name -> text` map so the
//! callers never index captures positionally.

use std::collections::HashMap;

use regex::{Captures, Regex};

/// Named capture groups of a single match. Groups that did not participate
/// in the match are present with an empty value.
pub type Groups = HashMap<String, String>;

fn groups_of(re: &Regex, caps: &Captures<'_>) -> Groups {
    re.capture_names()
        .flatten()
        .map(|name| {
            let text = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
            (name.to_string(), text.to_string())
        })
        .collect()
}

/// Return the text of the first match, if any.
pub fn find_match<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.find(text).map(|m| m.as_str())
}

/// Return the text of every match.
pub fn find_all_matches(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Return the named groups of the first match, if any.
pub fn find_groups(re: &Regex, text: &str) -> Option<Groups> {
    re.captures(text).map(|caps| groups_of(re, &caps))
}

/// Return the named groups of every match.
pub fn find_all_groups(re: &Regex, text: &str) -> Vec<Groups> {
    re.captures_iter(text)
        .map(|caps| groups_of(re, &caps))
        .collect()
}

/// Replace every match with the value produced by `replace`, which receives
/// the match's named groups.
pub fn replace_all_groups<F>(re: &Regex, text: &str, mut replace: F) -> String
where
    F: FnMut(&Groups) -> String,
{
    re.replace_all(text, |caps: &Captures<'_>| replace(&groups_of(re, caps)))
        .into_owned()
}
