use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single meme template as published by the catalog endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Human readable title, e.g. "Drake Hotline Bling".
    pub title: String,
    /// Canonical template URL on the API.
    pub url: String,
    /// Short identifier used in commands, e.g. "drake".
    pub name: String,
}

/// Every known template, keyed by its short name. Built wholesale from one fetch.
pub type Catalog = BTreeMap<String, TemplateEntry>;

/// One outbound render call: template key plus two caption lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub template: String,
    pub line1: String,
    /// Empty when the user only gave one caption line.
    pub line2: String,
}

impl RenderRequest {
    /// Splits logical arguments into template and captions. Needs at least two.
    pub fn from_args(args: &[String]) -> Option<Self> {
        match args {
            [template, line1, rest @ ..] => Some(Self {
                template: template.clone(),
                line1: line1.clone(),
                line2: rest.first().cloned().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// Helper struct for deserializing the render endpoint's JSON body.
#[derive(Debug, Deserialize)]
pub struct RenderResponse {
    pub direct: RenderLinks,
}

#[derive(Debug, Deserialize)]
pub struct RenderLinks {
    /// Public URL of the rendered image.
    pub masked: String,
}
