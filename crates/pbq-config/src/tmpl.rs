//! Thin wrapper around minijinja.
//!
//! Each compiled template owns its environment, so templates can be stored
//! in long-lived config structs and rendered from anywhere. Undefined
//! variables render as empty strings.

use minijinja::Environment;
use serde::Serialize;

/// A compiled text template with `{{ name }}` interpolation.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    env: Environment<'static>,
}

impl Template {
    /// Compile `source` under `name`. Syntax errors surface here, not at
    /// render time.
    pub fn compile(name: &str, source: &str) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template_owned(name.to_string(), source.to_string())?;
        Ok(Self {
            name: name.to_string(),
            env,
        })
    }

    /// Render with the given context.
    pub fn render(&self, ctx: impl Serialize) -> Result<String, minijinja::Error> {
        self.env.get_template(&self.name)?.render(ctx)
    }
}

/// Replace every `.` in a dotted property path with `_` so the path can be
/// used as a template variable name.
pub fn prop_to_template_param(prop: &str) -> String {
    prop.replace('.', "_")
}
