//! Per-file extraction records produced by the HTML and JS/JSX extractors.
//!
//! Field names follow the extractors' camelCase JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::AggregationError;

/// Where an HTML class usage was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlContext
{
    pub tag_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub depth: u32,
}

impl HtmlContext
{
    /// Whitespace-separated class list of the element, if recorded
    pub fn class_list(&self) -> Option<&str>
    {
        self.attributes
            .get("class")
            .or_else(|| {
                self.attributes
                    .get("className")
            })
            .map(String::as_str)
    }
}

/// One class as reported for one HTML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlClassUsage
{
    pub class_name: String,
    pub frequency: u64,
    #[serde(default)]
    pub contexts: Vec<HtmlContext>,
    /// Joint counts the extractor already computed
    #[serde(default)]
    pub co_occurrences: BTreeMap<String, u64>,
}

/// Where a JS/JSX class usage was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsxContext
{
    /// The class string literal as written in source
    pub pattern: String,
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub extraction_type: Option<String>,
}

/// One class as reported for one JS/JSX file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsxClassUsage
{
    pub class_name: String,
    pub frequency: u64,
    #[serde(default)]
    pub contexts: Vec<JsxContext>,
    #[serde(default)]
    pub co_occurrences: BTreeMap<String, u64>,
}

/// All HTML class records for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlExtraction
{
    pub file_path: String,
    #[serde(default)]
    pub classes: Vec<HtmlClassUsage>,
}

/// All JS/JSX class records for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsxExtraction
{
    pub file_path: String,
    #[serde(default)]
    pub classes: Vec<JsxClassUsage>,
}

/// A serialized batch of extraction output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionBundle
{
    #[serde(default)]
    pub html: Vec<HtmlExtraction>,
    #[serde(default)]
    pub jsx: Vec<JsxExtraction>,
}

impl ExtractionBundle
{
    pub fn is_empty(&self) -> bool
    {
        self.html
            .is_empty()
            && self
                .jsx
                .is_empty()
    }

    /// Append another bundle's files
    pub fn extend(
        &mut self,
        other: ExtractionBundle,
    )
    {
        self.html
            .extend(other.html);
        self.jsx
            .extend(other.jsx);
    }
}

/// Parse a JSON extraction bundle
pub fn load_bundle(text: &str) -> Result<ExtractionBundle, AggregationError>
{
    serde_json::from_str(text).map_err(|e| AggregationError::Malformed {
        message: e.to_string(),
        cause: e,
    })
}

/// Split a class attribute or literal into its class tokens
pub fn split_classes(list: &str) -> impl Iterator<Item = &str>
{
    list.split_whitespace()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn bundle_parses_camel_case_fields()
    {
        let json = r#"{
            "html": [{
                "filePath": "index.html",
                "classes": [{
                    "className": "flex",
                    "frequency": 2,
                    "contexts": [{ "tagName": "div", "attributes": { "class": "flex p-4" }, "depth": 1 }]
                }]
            }],
            "jsx": [{
                "filePath": "App.jsx",
                "classes": [{
                    "className": "p-4",
                    "frequency": 1,
                    "contexts": [{ "pattern": "p-4 flex", "lineNumber": 3, "framework": "react", "extractionType": "className" }]
                }]
            }]
        }"#;

        let bundle = load_bundle(json).unwrap();
        assert_eq!(bundle.html[0].classes[0].class_name, "flex");
        assert_eq!(bundle.html[0].classes[0].contexts[0].class_list(), Some("flex p-4"));
        assert_eq!(bundle.jsx[0].classes[0].contexts[0].line_number, 3);
    }

    #[test]
    fn missing_required_field_is_malformed()
    {
        let json = r#"{ "html": [{ "filePath": "a.html", "classes": [{ "frequency": 1 }] }] }"#;
        let err = load_bundle(json).unwrap_err();
        assert!(matches!(err, AggregationError::Malformed { .. }));
    }

    #[test]
    fn empty_document_is_an_empty_bundle()
    {
        let bundle = load_bundle("{}").unwrap();
        assert!(bundle.is_empty());
    }
}
