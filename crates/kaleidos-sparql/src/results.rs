//! SPARQL 1.1 JSON result documents.

use std::collections::HashMap;

use serde::Deserialize;

use crate::StoreError;

/// Kind of RDF term bound to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    /// Virtuoso still emits the SPARQL 1.0 name for datatyped literals.
    TypedLiteral,
    Bnode,
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang")]
    pub lang: Option<String>,
}

/// One solution of a SELECT query, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Row(HashMap<String, Term>);

impl Row {
    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|t| t.value.as_str())
    }

    /// Value bound to `name` when it is an IRI.
    pub fn uri(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .filter(|t| t.kind == TermKind::Uri)
            .map(|t| t.value.as_str())
    }

    /// Full term bound to `name`.
    pub fn term(&self, name: &str) -> Option<&Term> {
        self.0.get(name)
    }

    /// Build a row of IRI bindings; used by in-memory stores.
    pub fn from_uris<'a>(bindings: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            bindings
                .into_iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        Term {
                            kind: TermKind::Uri,
                            value: value.to_string(),
                            datatype: None,
                            lang: None,
                        },
                    )
                })
                .collect(),
        )
    }

    /// Add a plain literal binding.
    pub fn with_literal(mut self, name: &str, value: &str) -> Self {
        self.0.insert(
            name.to_string(),
            Term {
                kind: TermKind::Literal,
                value: value.to_string(),
                datatype: None,
                lang: None,
            },
        );
        self
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SelectDocument {
    results: Option<SelectResults>,
}

#[derive(Debug, Deserialize)]
struct SelectResults {
    bindings: Vec<Row>,
}

/// Parse an `application/sparql-results+json` document into rows.
pub fn parse_select_results(body: &str) -> Result<Vec<Row>, StoreError> {
    let document: SelectDocument = serde_json::from_str(body)?;
    let results = document.results.ok_or_else(|| {
        StoreError::InvalidResponse("result document has no `results` member".to_string())
    })?;
    Ok(results.bindings)
}
