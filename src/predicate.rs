//! Search predicates for the document search endpoint.

use std::fmt;

/// A single search predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match of `path` against `value`.
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Documents of the given content type.
    pub fn document_type(content_type: &str) -> Self {
        Self::at("document.type", content_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                write!(f, "at({},{})", path, quote(value))
            }
        }
    }
}

/// Renders predicates as the `q` query parameter, `[[p1][p2]...]`.
pub fn render_query(predicates: &[Predicate]) -> String {
    let mut out = String::from("[");
    for predicate in predicates {
        out.push('[');
        out.push_str(&predicate.to_string());
        out.push(']');
    }
    out.push(']');
    out
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_query() {
        let q = render_query(&[Predicate::document_type("blog-post")]);
        assert_eq!(q, r#"[[at(document.type,"blog-post")]]"#);
    }

    #[test]
    fn test_multiple_predicates() {
        let q = render_query(&[
            Predicate::document_type("page"),
            Predicate::at("document.id", "d1"),
        ]);
        assert_eq!(q, r#"[[at(document.type,"page")][at(document.id,"d1")]]"#);
    }

    #[test]
    fn test_quotes_are_escaped() {
        let p = Predicate::document_type(r#"a"b"#);
        assert_eq!(p.to_string(), r#"at(document.type,"a\"b")"#);
    }
}
