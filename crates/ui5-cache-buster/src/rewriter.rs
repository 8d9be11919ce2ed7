//! Resource roots rewriting
//!
//! Substitutes a new JSON mapping for the value of every resource roots
//! attribute. Only the attribute value changes; surrounding markup, other
//! attributes and whitespace are preserved byte for byte.

use crate::error::{BustError, Result};
use crate::markup::{self, Quote};
use crate::resource_roots::RESOURCE_ROOTS_ATTRIBUTE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the rewritten resource roots point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RootValueStyle {
    /// The bare hash token, e.g. `{"app1":"XDBq1b7n"}`
    #[default]
    Hash,
    /// The declared path with its directory name replaced, e.g.
    /// `{"app1":"./webapps/XDBq1b7n"}`
    Path,
}

/// Replace every resource roots attribute value in `html` with `roots`.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, Value};
/// use ui5_cache_buster::rewriter::rewrite_resource_roots;
///
/// let html = r#"<script data-sap-ui-resourceroots='{"app1": "./webapps/my-app"}'></script>"#;
/// let mut roots = Map::new();
/// roots.insert("app1".to_string(), Value::from("XDBq1b7n"));
///
/// let rewritten = rewrite_resource_roots(html, &roots)?;
/// assert_eq!(
///     rewritten,
///     r#"<script data-sap-ui-resourceroots='{"app1":"XDBq1b7n"}'></script>"#
/// );
/// # Ok::<(), ui5_cache_buster::BustError>(())
/// ```
pub fn rewrite_resource_roots(html: &str, roots: &Map<String, Value>) -> Result<String> {
    let attributes = markup::find_attributes(html, RESOURCE_ROOTS_ATTRIBUTE);
    if attributes.is_empty() {
        return Err(BustError::ResourceRootsNotFound {
            attribute: RESOURCE_ROOTS_ATTRIBUTE,
        });
    }

    let json = serde_json::to_string(roots).map_err(BustError::Serialize)?;
    let mut rewritten = String::with_capacity(html.len() + json.len());
    let mut last = 0;

    for attribute in &attributes {
        rewritten.push_str(&html[last..attribute.value_span.start]);

        let quote = match attribute.quote {
            Quote::Double => Quote::Double,
            Quote::Single | Quote::None => Quote::Single,
        };
        let delimiter = quote.as_char().unwrap_or('\'');
        if attribute.value.is_none() {
            rewritten.push('=');
        }
        rewritten.push(delimiter);
        rewritten.push_str(&markup::encode_attribute_value(&json, quote));
        rewritten.push(delimiter);

        last = attribute.value_span.end;
    }

    rewritten.push_str(&html[last..]);
    Ok(rewritten)
}
