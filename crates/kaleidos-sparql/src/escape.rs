//! Escaping of values interpolated into SPARQL text.
//!
//! Every value that ends up inside a query string goes through one of these
//! functions. The output is a complete SPARQL term (`<iri>`, `"literal"`,
//! `"true"^^<xsd:boolean>`), never a fragment.

use crate::error::InvalidIri;

/// XML Schema namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Whether `ch` may not appear in an `IRIREF`.
fn forbidden_in_iriref(ch: char) -> bool {
    matches!(
        ch,
        '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\u{0}'..='\u{20}'
    )
}

/// Write an IRI as a SPARQL `IRIREF`.
///
/// IRIs containing characters an `IRIREF` does not allow are rejected.
/// `\uXXXX` escapes are no way out: SPARQL decodes them before tokenizing,
/// so an escaped `>` still ends the IRI.
///
/// ```
/// use kaleidos_sparql::escape::escape_uri;
///
/// assert_eq!(
///     escape_uri("http://example.org/a").unwrap(),
///     "<http://example.org/a>"
/// );
/// assert!(escape_uri("http://example.org/a b").is_err());
/// ```
pub fn escape_uri(uri: &str) -> Result<String, InvalidIri> {
    match uri.chars().find(|c| forbidden_in_iriref(*c)) {
        Some(ch) => Err(InvalidIri {
            iri: uri.to_string(),
            ch,
        }),
        None => Ok(format!("<{}>", uri)),
    }
}

/// Escape a string as a double-quoted SPARQL literal.
///
/// ```
/// use kaleidos_sparql::escape::escape_string;
///
/// assert_eq!(escape_string(r#"say "hi""#), r#""say \"hi\"""#);
/// ```
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape a boolean as an `xsd:boolean` typed literal.
pub fn escape_bool(value: bool) -> String {
    format!("\"{}\"^^<{}boolean>", value, XSD)
}

/// Render a list of IRIs, each escaped, joined by `separator`.
///
/// Used for `VALUES` clauses; callers must not render an empty list.
pub fn join_uris<S: AsRef<str>>(uris: &[S], separator: &str) -> Result<String, InvalidIri> {
    let escaped = uris
        .iter()
        .map(|u| escape_uri(u.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(escaped.join(separator))
}
