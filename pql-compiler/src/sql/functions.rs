//! Translation of the scalar function whitelist into SQL.
//! Anything outside the whitelist passes through as a plain call, letting
//! the target engine reject or accept it on its own terms.

pub fn translate_call(func: &str, args: &[String]) -> String {
    // PQL function names are ordinary identifiers; the whitelist matches
    // case-insensitively so `endsWith` and `endswith` both translate.
    let lower = func.to_ascii_lowercase();
    match (lower.as_str(), args) {
        ("strcat", args) if !args.is_empty() => args.join(" || "),
        ("tolower", [a]) => format!("LOWER({a})"),
        ("toupper", [a]) => format!("UPPER({a})"),
        ("strlen", [a]) | ("length", [a]) => format!("LENGTH({a})"),
        ("startswith", [a, b]) => format!("{a} LIKE {b} || '%'"),
        ("endswith", [a, b]) => format!("{a} LIKE '%' || {b}"),
        ("iif", [cond, t, f]) => format!("CASE WHEN {cond} THEN {t} ELSE {f} END"),
        ("isnull", [a]) => format!("{a} IS NULL"),
        ("isnull", [a, b]) => format!("COALESCE({a}, {b})"),
        ("count", []) => "COUNT(*)".to_string(),
        (_, args) => format!("{func}({})", args.join(", ")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strcat_joins_with_concat_operator() {
        assert_eq!(
            translate_call("strcat", &["\"a\"".into(), "'-'".into(), "\"b\"".into()]),
            "\"a\" || '-' || \"b\""
        );
    }

    #[test]
    fn startswith_becomes_like_prefix() {
        assert_eq!(
            translate_call("startswith", &["\"FileName\"".into(), "'foo'".into()]),
            "\"FileName\" LIKE 'foo' || '%'"
        );
    }

    #[test]
    fn unknown_function_passes_through() {
        assert_eq!(translate_call("sum", &["\"x\"".into()]), "sum(\"x\")");
    }
}
