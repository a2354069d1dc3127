//! Parsing of `messages.in` entries.
//!
//! A key has the shape `alias(p1, p2, ...)`. The template value is an
//! arbitrary JSON document in which string values of the form `"$param"`
//! mark interpolation points; they are rewritten to template variables with
//! the enclosing quotes stripped, so numeric and boolean argument literals
//! land in the JSON unquoted.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::raw::InMessageConfig;
use crate::tmpl::Template;
use crate::{ConfigError, InMessage};

static ALIAS_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<alias>\w+)\s*\((?P<params>((\s*\w+\s*,)*\s*\w+\s*)|)\)$").unwrap()
});
static PARAM_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static TPL_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r#":\s*"\$(?P<varname>\w+)""#).unwrap());

pub(crate) fn parse(
    entries: &HashMap<String, InMessageConfig>,
) -> Result<HashMap<String, InMessage>, ConfigError> {
    let mut res = HashMap::with_capacity(entries.len());
    for (alias_with_params, entry) in entries {
        let message = parse_message(alias_with_params, entry)?;
        // Differently-spelled keys (whitespace, param names) can collapse to
        // the same alias; identical keys were already deduplicated by the
        // JSON parser, last one winning.
        if res.contains_key(&message.alias) {
            return Err(ConfigError::DuplicateInAlias(message.alias));
        }
        res.insert(message.alias.clone(), message);
    }
    Ok(res)
}

fn parse_message(
    alias_with_params: &str,
    entry: &InMessageConfig,
) -> Result<InMessage, ConfigError> {
    let (alias, alias_params) = parse_alias(alias_with_params)?;
    let (params, param_lookup) = parse_alias_params(&alias, &alias_params)?;
    let template = parse_template(&alias, &entry.template, &param_lookup)?;
    Ok(InMessage {
        alias,
        name: entry.name.clone(),
        template,
        params,
    })
}

fn parse_alias(alias_with_params: &str) -> Result<(String, String), ConfigError> {
    let groups = pbq_rx::find_groups(&ALIAS_RX, alias_with_params)
        .ok_or_else(|| ConfigError::InvalidInAlias(alias_with_params.to_string()))?;
    Ok((groups["alias"].clone(), groups["params"].clone()))
}

fn parse_alias_params(
    alias: &str,
    alias_params: &str,
) -> Result<(Vec<String>, HashSet<String>), ConfigError> {
    // an empty () is fine, the macro then takes no arguments
    let params = pbq_rx::find_all_matches(&PARAM_RX, alias_params);
    let mut lookup = HashSet::with_capacity(params.len());
    for param in &params {
        if !lookup.insert(param.clone()) {
            return Err(ConfigError::DuplicateParam {
                alias: alias.to_string(),
                param: param.clone(),
            });
        }
    }
    Ok((params, lookup))
}

fn parse_template(
    alias: &str,
    template: &serde_json::Value,
    param_lookup: &HashSet<String>,
) -> Result<Template, ConfigError> {
    // marshal the JSON value back to a string so the rewrite can work on
    // the canonical text form
    let tpl = serde_json::to_string(template)?;
    for groups in pbq_rx::find_all_groups(&TPL_RX, &tpl) {
        let var = &groups["varname"];
        if !param_lookup.contains(var) {
            return Err(ConfigError::UnknownTemplateVar {
                alias: alias.to_string(),
                var: var.clone(),
            });
        }
    }
    let tpl = TPL_RX.replace_all(&tpl, ":{{ ${varname} }}");
    Template::compile(alias, &tpl).map_err(|source| ConfigError::BadTemplate {
        alias: alias.to_string(),
        source,
    })
}
