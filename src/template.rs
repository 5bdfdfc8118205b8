//! `{{ name }}` substitution for dotfiles marked `template = true`.
use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::error::TemplateError;

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// User variables plus the built-ins `host` and `home`.
///
/// User definitions win over built-ins of the same name.
#[must_use]
pub fn variables(user: &BTreeMap<String, String>, host: &str, home: &Path) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::from([
        ("host".to_string(), host.to_string()),
        ("home".to_string(), home.to_string_lossy().to_string()),
    ]);
    vars.extend(user.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}

/// Replace every `{{ name }}` in `source` with its value from `vars`.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownVariable`] for the first placeholder with
/// no value.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use dotctl::template::render;
///
/// let vars = BTreeMap::from([("email".to_string(), "me@example.com".to_string())]);
/// let out = render("[user]\n  email = {{ email }}\n", &vars).unwrap();
/// assert_eq!(out, "[user]\n  email = me@example.com\n");
/// ```
pub fn render(source: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let pattern = Regex::new(PLACEHOLDER)?;
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for caps in pattern.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = vars
            .get(name.as_str())
            .ok_or_else(|| TemplateError::UnknownVariable {
                name: name.as_str().to_string(),
            })?;
        out.push_str(source.get(last..whole.start()).unwrap_or_default());
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(source.get(last..).unwrap_or_default());
    Ok(out)
}
