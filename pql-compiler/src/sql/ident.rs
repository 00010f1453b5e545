//! SQL identifier quoting (all identifiers emitted to SQL
//! are quoted with double quotes; embedded double quotes are doubled.").

use pql_ast::QualifiedIdent;

/// Double-quotes `name`, doubling any embedded `"`.
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Renders a (possibly dotted) identifier as `"a"."b"."c"`.
pub fn quote_qualified(ident: &QualifiedIdent) -> String {
    ident
        .parts
        .iter()
        .map(|p| quote(&p.name))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote(r#"a"b"#), r#""a""b""#);
    }

    #[test]
    fn plain_identifier() {
        assert_eq!(quote("State"), "\"State\"");
    }
}
