//! UI5 resource roots declared in the bootstrap tag
//!
//! The bootstrap script tag of a UI5 application page carries a JSON object
//! mapping module namespaces to directories:
//!
//! ```html
//! <script id="sap-ui-bootstrap"
//!     src="resources/sap-ui-core.js"
//!     data-sap-ui-resourceroots='{"my.app": "./webapps/my-app"}'>
//! </script>
//! ```

use crate::error::{BustError, Result};
use crate::markup;
use serde_json::{Map, Value};

/// Attribute holding the resource roots JSON
pub const RESOURCE_ROOTS_ATTRIBUTE: &str = "data-sap-ui-resourceroots";

/// Element the UI5 bootstrap configuration lives on
const BOOTSTRAP_ELEMENT: &str = "script";

/// A single application name and the directory it is served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoot {
    /// Application (module namespace) name
    pub name: String,
    /// Directory path relative to the HTML document
    pub path: String,
}

/// Ordered resource roots as declared in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRoots {
    roots: Vec<ResourceRoot>,
}

impl ResourceRoots {
    /// Extract the resource roots from the marker attribute in `html`.
    ///
    /// The first marker on a `<script>` element (the UI5 bootstrap tag) wins;
    /// without one, the first marker on any element is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use ui5_cache_buster::ResourceRoots;
    ///
    /// let html = r#"<script data-sap-ui-resourceroots='{"app1": "./webapps/my-app"}'></script>"#;
    /// let roots = ResourceRoots::extract(html)?;
    /// assert_eq!(roots.len(), 1);
    /// assert_eq!(roots.get("app1"), Some("./webapps/my-app"));
    /// # Ok::<(), ui5_cache_buster::BustError>(())
    /// ```
    pub fn extract(html: &str) -> Result<Self> {
        let attributes = markup::find_attributes(html, RESOURCE_ROOTS_ATTRIBUTE);
        let attribute = attributes
            .iter()
            .find(|attribute| attribute.tag == BOOTSTRAP_ELEMENT)
            .or_else(|| attributes.first())
            .ok_or(BustError::ResourceRootsNotFound {
                attribute: RESOURCE_ROOTS_ATTRIBUTE,
            })?;

        // A valueless attribute parses as empty JSON and fails below
        Self::parse(attribute.value.as_deref().unwrap_or_default())
    }

    /// Parse a resource roots JSON object.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(BustError::InvalidResourceRoots)?;
        let Value::Object(object) = value else {
            return Err(BustError::NotAnObject {
                found: json_type_name(&value),
            });
        };
        Self::from_map(object)
    }

    fn from_map(object: Map<String, Value>) -> Result<Self> {
        let roots = object
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(path) => Ok(ResourceRoot { name, path }),
                _ => Err(BustError::NonStringPath { app: name }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { roots })
    }

    /// Look up the declared path of an application
    pub fn get(&self, name: &str) -> Option<&str> {
        self.roots
            .iter()
            .find(|root| root.name == name)
            .map(|root| root.path.as_str())
    }

    /// Iterate roots in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceRoot> {
        self.roots.iter()
    }

    /// Number of declared roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether no roots are declared
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResourceRoots {
    type Item = &'a ResourceRoot;
    type IntoIter = std::slice::Iter<'a, ResourceRoot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
