//! Parsing of `messages.out` entries.
//!
//! A key is a bare alias. The template is free text in which `$prop` and
//! `$prop.sub.sub` reference fields of the decoded message; `\$` escapes a
//! literal dollar. Property paths are recorded and rewritten to template
//! variables with dots replaced by underscores.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::raw::OutMessageConfig;
use crate::tmpl::{Template, prop_to_template_param};
use crate::{ConfigError, OutMessage};

static ALIAS_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());
// a `$` can be escaped with `\$` (`\\$` inside a JSON string)
static TPL_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<prefix>[^\\]|^)\$(?P<prop>(\w+\.)*\w+)").unwrap());

pub(crate) fn parse(
    entries: &HashMap<String, OutMessageConfig>,
) -> Result<HashMap<String, OutMessage>, ConfigError> {
    let mut res = HashMap::with_capacity(entries.len());
    for (alias, entry) in entries {
        let message = parse_message(alias, entry)?;
        // the alias regex admits no whitespace, so distinct keys can never
        // collapse into the same alias here
        res.insert(message.alias.clone(), message);
    }
    Ok(res)
}

fn parse_message(raw_alias: &str, entry: &OutMessageConfig) -> Result<OutMessage, ConfigError> {
    let alias = parse_alias(raw_alias)?;
    let (template, props) = parse_template(&alias, &entry.template)?;
    Ok(OutMessage {
        alias,
        name: entry.name.clone(),
        template,
        props,
    })
}

fn parse_alias(alias: &str) -> Result<String, ConfigError> {
    pbq_rx::find_match(&ALIAS_RX, alias)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidOutAlias(alias.to_string()))
}

fn parse_template(alias: &str, tpl: &str) -> Result<(Template, BTreeSet<String>), ConfigError> {
    let mut props = BTreeSet::new();
    let rewritten = pbq_rx::replace_all_groups(&TPL_RX, tpl, |groups| {
        let prop = &groups["prop"];
        props.insert(prop.clone());
        format!("{}{{{{ {} }}}}", groups["prefix"], prop_to_template_param(prop))
    });
    // unescape any `\$`s once the rewrite is done
    let rewritten = rewritten.replace(r"\$", "$");
    let template =
        Template::compile(alias, &rewritten).map_err(|source| ConfigError::BadTemplate {
            alias: alias.to_string(),
            source,
        })?;
    Ok((template, props))
}
