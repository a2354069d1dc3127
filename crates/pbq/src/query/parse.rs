//! SQL macro rewriting.
//!
//! Two macro grammars live inside the incoming SQL:
//!
//! - in-macros, `$alias('lit', 2, true)`, at argument positions: each one
//!   is encoded to protobuf bytes and replaced with the driver's positional
//!   placeholder;
//! - out-markers, `$alias:col [[AS] colAlias]`, at column positions: each
//!   one binds a stringifier under the output column name and is stripped
//!   down to the bare column expression.
//!
//! In-macros are rewritten first; their replacement can shift text around
//! out-markers but never the other way around. Text that matches neither
//! grammar, including bare `$word`s, passes through untouched.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use pbq_config::{InMessage, OutMessage};
use pbq_proto::{Registry, Stringifier};
use regex::{Captures, Regex};

use crate::Error;

static IN_QUERY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$(?P<alias>\w+)\((?P<args>((\s*('(\\'|[^'])*'|\d+(\.\d+)?|true|false)\s*,)*(\s*('(\\'|[^'])*'|\d+(\.\d+)?|true|false)\s*))|)\)",
    )
    .unwrap()
});
static IN_ARG_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(\\'|[^'])*'|\d+(\.\d+)?|true|false").unwrap());
// detects single-quoted literals, including any \' inside
static ARG_NORM_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"'((\\'|[^'])*)'").unwrap());
// cols can be bare words or "double quoted"; the trailing delimiter of the
// alias clause is whitespace, a comma, or end of string
static OUT_QUERY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\$(?P<alias>\w+):(?P<col>\w+|"(\w+\s*)+")(?P<full_col_alias>(\s+[aA][sS])?\s+(?P<col_alias>\w+|"(\w+\s*)+")(\s|,|$))?"#,
    )
    .unwrap()
});

/// The compilation result for one query.
#[derive(Debug)]
pub struct ParsedQuery {
    /// SQL with in-macros replaced by placeholders and out-markers stripped.
    pub sql: String,
    /// Protobuf-encoded argument bytes, one per in-macro, in textual order.
    pub args: Vec<Vec<u8>>,
    /// Stringifiers keyed by output column name or alias.
    pub stringifiers: HashMap<String, Stringifier>,
}

/// Positional-placeholder dialect of the configured driver.
#[derive(Debug, Clone, Copy)]
enum Driver {
    Postgres,
}

impl Driver {
    fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "postgres" => Ok(Self::Postgres),
            other => Err(Error::UnknownDriver(other.to_string())),
        }
    }

    fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
        }
    }
}

/// Rewrites macro-bearing SQL into executable SQL plus per-query side data.
#[derive(Debug)]
pub struct QueryParser {
    driver: Driver,
    registry: Registry,
    in_messages: HashMap<String, InMessage>,
    out_messages: HashMap<String, OutMessage>,
    auto_map: bool,
}

impl QueryParser {
    pub fn new(
        driver: &str,
        registry: Registry,
        in_messages: HashMap<String, InMessage>,
        out_messages: HashMap<String, OutMessage>,
        auto_map: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            driver: Driver::from_name(driver)?,
            registry,
            in_messages,
            out_messages,
            auto_map,
        })
    }

    pub fn parse(&self, sql: &str) -> Result<ParsedQuery, Error> {
        let (sql, args) = self.parse_in_messages(sql)?;
        let (sql, stringifiers) = self.parse_out_messages(&sql)?;
        Ok(ParsedQuery {
            sql,
            args,
            stringifiers,
        })
    }

    fn parse_in_messages(&self, sql: &str) -> Result<(String, Vec<Vec<u8>>), Error> {
        let mut args = Vec::new();
        for caps in IN_QUERY_RX.captures_iter(sql) {
            let alias = &caps["alias"];
            let message = self
                .in_messages
                .get(alias)
                .ok_or_else(|| Error::UnknownAlias(alias.to_string()))?;
            // the arg list shape was verified by the outer regex; an empty
            // list yields no matches here
            let raw_args: Vec<String> = IN_ARG_RX
                .find_iter(&caps["args"])
                .map(|m| m.as_str().to_string())
                .collect();
            let json = message.json(&normalize_args(raw_args))?;
            args.push(pbq_proto::encode(&self.registry, &message.name, &json)?);
        }

        let mut counter = 0;
        let sql = IN_QUERY_RX
            .replace_all(sql, |_: &Captures<'_>| {
                counter += 1;
                self.driver.placeholder(counter)
            })
            .into_owned();
        Ok((sql, args))
    }

    fn parse_out_messages(
        &self,
        sql: &str,
    ) -> Result<(String, HashMap<String, Stringifier>), Error> {
        let mut stringifiers = HashMap::new();
        if self.auto_map {
            for (alias, message) in &self.out_messages {
                stringifiers.insert(alias.clone(), Stringifier::new(&self.registry, message)?);
            }
        }

        let mut first_err: Option<Error> = None;
        let sql = OUT_QUERY_RX
            .replace_all(sql, |caps: &Captures<'_>| {
                if first_err.is_some() {
                    return String::new();
                }
                let alias = &caps["alias"];
                let col = &caps["col"];
                let col_alias = caps.name("col_alias").map_or("", |m| m.as_str());
                let Some(message) = self.out_messages.get(alias) else {
                    first_err = Some(Error::UnknownAlias(alias.to_string()));
                    return String::new();
                };

                // mapping is by col name or alias; a col alias that is
                // really the FROM keyword means the greedy alias group ate
                // the next clause, so fall back to the col itself
                let key = if !col_alias.is_empty() && !col_alias.eq_ignore_ascii_case("from") {
                    col_alias
                } else {
                    col
                };
                match Stringifier::new(&self.registry, message) {
                    Ok(stringifier) => {
                        stringifiers.insert(key.to_string(), stringifier);
                    }
                    Err(err) => {
                        first_err = Some(err.into());
                        return String::new();
                    }
                }
                format!(
                    "{col}{}",
                    caps.name("full_col_alias").map_or("", |m| m.as_str())
                )
            })
            .into_owned();

        if let Some(err) = first_err {
            return Err(err);
        }
        Ok((sql, stringifiers))
    }
}

/// Turn quoted SQL literals into JSON ones: `'A string'` becomes
/// `"A string"`, `'O\'Reilly'` becomes `"O'Reilly"`. Numbers and booleans
/// pass through.
fn normalize_args(args: Vec<String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if ARG_NORM_RX.is_match(&arg) {
                ARG_NORM_RX
                    .replace_all(&arg, "\"$1\"")
                    .replace(r"\'", "'")
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pbq_config::{Config, ConfigError, Overrides};
    use pbq_proto::testing;

    use super::*;

    fn parser(auto_map: bool) -> QueryParser {
        let doc = format!(
            r#"{{
                "db": {{"driver": "postgres", "host": "localhost", "port": 5432,
                        "name": "shop", "userName": "app"}},
                "messages": {{
                    "in": {{
                        "o(id, text)": {{"name": "shop.Order",
                                         "template": {{"id": "$id", "text": "$text"}}}},
                        "latest()": {{"name": "shop.Order", "template": {{}}}}
                    }},
                    "out": {{
                        "o": {{"name": "shop.Order", "template": "order $id: $text"}},
                        "c": {{"name": "shop.Customer", "template": "$name"}}
                    }},
                    "autoMap": {auto_map}
                }}
            }}"#
        );
        let cfg = Config::load(Some(doc.as_bytes()), &Overrides::default()).unwrap();
        QueryParser::new(
            "postgres",
            testing::registry(),
            cfg.in_messages,
            cfg.out_messages,
            cfg.auto_map,
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_driver() {
        let res = QueryParser::new(
            "mysql",
            testing::registry(),
            HashMap::new(),
            HashMap::new(),
            false,
        );
        assert!(matches!(res.err(), Some(Error::UnknownDriver(d)) if d == "mysql"));
    }

    #[test]
    fn test_identity_rewrite() {
        let p = parser(false);
        let sql = "select * from orders where id = 1";
        let parsed = p.parse(sql).unwrap();
        assert_eq!(parsed.sql, sql);
        assert!(parsed.args.is_empty());
        assert!(parsed.stringifiers.is_empty());
    }

    #[test]
    fn test_in_macro_expansion() {
        let p = parser(false);
        let parsed = p
            .parse("select * from t where c = $o(1, 'hi')")
            .unwrap();
        assert_eq!(parsed.sql, "select * from t where c = $1");
        let expected =
            pbq_proto::encode(&testing::registry(), "shop.Order", r#"{"id":1,"text":"hi"}"#)
                .unwrap();
        assert_eq!(parsed.args, vec![expected]);
    }

    #[test]
    fn test_in_macro_escaped_quote() {
        let p = parser(false);
        let parsed = p.parse(r"select * from t where c = $o(1, 'O\'Reilly')").unwrap();
        assert_eq!(parsed.sql, "select * from t where c = $1");
        let expected = pbq_proto::encode(
            &testing::registry(),
            "shop.Order",
            r#"{"id":1,"text":"O'Reilly"}"#,
        )
        .unwrap();
        assert_eq!(parsed.args, vec![expected]);
    }

    #[test]
    fn test_in_macro_placeholder_numbering() {
        let p = parser(false);
        let parsed = p
            .parse("select * from t where a = $o(1, 'x') or b = $latest() or c = $o(2, 'y')")
            .unwrap();
        assert_eq!(
            parsed.sql,
            "select * from t where a = $1 or b = $2 or c = $3"
        );
        assert_eq!(parsed.args.len(), 3);
    }

    #[test]
    fn test_in_macro_empty_args() {
        let p = parser(false);
        let parsed = p.parse("select * from t where c = $latest()").unwrap();
        assert_eq!(parsed.sql, "select * from t where c = $1");
        assert_eq!(parsed.args.len(), 1);
    }

    #[test]
    fn test_in_macro_arity_error() {
        let p = parser(false);
        let res = p.parse("select * from t where c = $o(1)");
        assert!(matches!(
            res.err(),
            Some(Error::Config(ConfigError::Arity { .. }))
        ));
    }

    #[test]
    fn test_in_macro_unknown_alias() {
        let p = parser(false);
        let res = p.parse("select * from t where c = $zzz(1)");
        assert!(matches!(res.err(), Some(Error::UnknownAlias(a)) if a == "zzz"));
    }

    #[test]
    fn test_malformed_in_macro_passes_through() {
        let p = parser(false);
        let sql = "select * from t where c = $o(1, unquoted)";
        let parsed = p.parse(sql).unwrap();
        assert_eq!(parsed.sql, sql);
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_out_marker_plain_col() {
        let p = parser(false);
        let parsed = p.parse("select $o:dat from t").unwrap();
        assert_eq!(parsed.sql, "select dat from t");
        assert!(parsed.stringifiers.contains_key("dat"));
        assert_eq!(parsed.stringifiers.len(), 1);
    }

    #[test]
    fn test_out_marker_with_as_alias() {
        let p = parser(false);
        let parsed = p.parse("select $o:dat as d from t").unwrap();
        assert_eq!(parsed.sql, "select dat as d from t");
        assert!(parsed.stringifiers.contains_key("d"));
    }

    #[test]
    fn test_out_marker_with_uppercase_as() {
        let p = parser(false);
        let parsed = p.parse("select $o:dat AS d from t").unwrap();
        assert_eq!(parsed.sql, "select dat AS d from t");
        assert!(parsed.stringifiers.contains_key("d"));
    }

    #[test]
    fn test_out_marker_with_bare_alias() {
        let p = parser(false);
        let parsed = p.parse("select $o:dat d from t").unwrap();
        assert_eq!(parsed.sql, "select dat d from t");
        assert!(parsed.stringifiers.contains_key("d"));
    }

    #[test]
    fn test_out_marker_at_end_of_string() {
        let p = parser(false);
        let parsed = p.parse("select $o:dat as d").unwrap();
        assert_eq!(parsed.sql, "select dat as d");
        assert!(parsed.stringifiers.contains_key("d"));
    }

    #[test]
    fn test_out_marker_followed_by_comma() {
        let p = parser(false);
        let parsed = p.parse("select $o:a, $c:b from t").unwrap();
        assert_eq!(parsed.sql, "select a, b from t");
        assert!(parsed.stringifiers.contains_key("a"));
        assert!(parsed.stringifiers.contains_key("b"));
    }

    #[test]
    fn test_out_marker_from_is_not_an_alias() {
        let p = parser(false);
        // the greedy alias group captures `from`; the parser must fall back
        // to the col name
        let parsed = p.parse("select $o:dat from t").unwrap();
        assert_eq!(parsed.sql, "select dat from t");
        assert!(parsed.stringifiers.contains_key("dat"));
        assert!(!parsed.stringifiers.contains_key("from"));
    }

    #[test]
    fn test_out_marker_quoted_col() {
        let p = parser(false);
        let parsed = p.parse(r#"select $o:"dat col" from t"#).unwrap();
        assert_eq!(parsed.sql, r#"select "dat col" from t"#);
        assert!(parsed.stringifiers.contains_key(r#""dat col""#));
    }

    #[test]
    fn test_out_marker_unknown_alias() {
        let p = parser(false);
        let res = p.parse("select $zzz:c from t");
        assert!(matches!(res.err(), Some(Error::UnknownAlias(a)) if a == "zzz"));
    }

    #[test]
    fn test_auto_map_seeds_all_aliases() {
        let p = parser(true);
        let parsed = p.parse("select * from t").unwrap();
        assert_eq!(parsed.stringifiers.len(), 2);
        assert!(parsed.stringifiers.contains_key("o"));
        assert!(parsed.stringifiers.contains_key("c"));
    }

    #[test]
    fn test_out_marker_overrides_auto_map_entry() {
        let p = parser(true);
        // binds the Customer stringifier under the col name `o`, on top of
        // the auto-mapped Order entry for the same key
        let parsed = p.parse("select $c:o from t").unwrap();
        assert_eq!(parsed.sql, "select o from t");
        assert_eq!(parsed.stringifiers.len(), 2);
        let customer_bytes = pbq_proto::encode(
            &testing::registry(),
            "shop.Customer",
            r#"{"name":"Ada"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.stringifiers["o"].stringify(&customer_bytes).unwrap(),
            "Ada"
        );
    }

    #[test]
    fn test_bare_dollar_words_pass_through() {
        let p = parser(false);
        for sql in ["select $foo", "select $foo:", "select $foo: word", "select 100$"] {
            let parsed = p.parse(sql).unwrap();
            assert_eq!(parsed.sql, sql, "{sql:?} should be a no-op");
            assert!(parsed.args.is_empty());
            assert!(parsed.stringifiers.is_empty());
        }
    }

    #[test]
    fn test_in_and_out_together() {
        let p = parser(false);
        let parsed = p
            .parse("select $o:dat as d from t where c = $o(1, 'hi')")
            .unwrap();
        assert_eq!(parsed.sql, "select dat as d from t where c = $1");
        assert_eq!(parsed.args.len(), 1);
        assert!(parsed.stringifiers.contains_key("d"));
    }

    #[test]
    fn test_normalize_args() {
        let args = vec![
            "'A string'".to_string(),
            r"'O\'Reilly'".to_string(),
            "42".to_string(),
            "1.5".to_string(),
            "true".to_string(),
        ];
        assert_eq!(
            normalize_args(args),
            vec![
                "\"A string\"".to_string(),
                "\"O'Reilly\"".to_string(),
                "42".to_string(),
                "1.5".to_string(),
                "true".to_string(),
            ]
        );
    }
}
