//! The literal pipeline → SQL scenarios from the test corpus, plus the
//! evaluator scenario that accompanies them.

use std::collections::HashMap;

use pql_compiler::compile;
use pql_compiler::eval::{eval, Table};

fn compile_ok(source: &str) -> String {
    compile(source).unwrap_or_else(|diags| panic!("expected `{source}` to compile, got diagnostics: {diags:?}"))
}

#[test]
fn count_wraps_a_single_cte() {
    assert_eq!(
        compile_ok("StormEvents | count"),
        r#"WITH "__subquery0" AS (SELECT COUNT(*) AS "count()" FROM "StormEvents") SELECT * FROM "__subquery0";"#
    );
}

#[test]
fn bare_take_has_no_cte() {
    assert_eq!(
        compile_ok("StormEvents | take 5"),
        r#"SELECT * FROM "StormEvents" LIMIT 5;"#
    );
}

#[test]
fn where_and_take_fold_into_one_stage() {
    assert_eq!(
        compile_ok("StormEvents | where State == 'TEXAS' | take 3"),
        r#"SELECT * FROM "StormEvents" WHERE "State" = 'TEXAS' LIMIT 3;"#
    );
}

#[test]
fn summarize_then_sort_is_a_two_stage_cte() {
    let sql = compile_ok(
        "SourceFiles | summarize TotalLines=sum(LineCount) by Directory, IsTest=endsWith(FileName,'_test.go') \
         | sort by Directory asc, IsTest asc",
    );
    let expected = concat!(
        r#"WITH "__subquery0" AS (SELECT "Directory" AS "Directory", "#,
        r#""FileName" LIKE '%' || '_test.go' AS "IsTest", sum("LineCount") AS "TotalLines" "#,
        r#"FROM "SourceFiles" GROUP BY "Directory", "FileName" LIKE '%' || '_test.go'), "#,
        r#""__subquery1" AS (SELECT * FROM "__subquery0" ORDER BY "Directory" ASC NULLS FIRST, "#,
        r#""IsTest" ASC NULLS FIRST) SELECT * FROM "__subquery1";"#,
    );
    assert_eq!(sql, expected);
}

#[test]
fn project_then_extend_fold_into_one_stage() {
    assert_eq!(
        compile_ok("T | project A=x+1, B=y | extend C=A*2"),
        r#"SELECT "x"+1 AS "A", "y" AS "B", "A"*2 AS "C" FROM "T";"#
    );
}

#[test]
fn evaluator_filters_on_bare_column_truthiness() {
    let mut tables = HashMap::new();
    tables.insert(
        "T".to_string(),
        Table::new(
            vec!["a".into(), "b".into()],
            vec![
                vec!["1".into(), "2".into()],
                vec!["3".into(), "0".into()],
                vec!["5".into(), "4".into()],
            ],
        ),
    );
    let result = eval("T | where b | take 5", &tables).unwrap();
    assert_eq!(result.columns, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        result.rows,
        vec![vec!["1".to_string(), "2".to_string()], vec!["5".to_string(), "4".to_string()]]
    );
}

#[test]
fn summarize_with_zero_aggregates_and_zero_group_keys_is_rejected() {
    assert!(compile("T | summarize").is_err());
}

#[test]
fn duplicate_column_name_in_project_is_rejected() {
    assert!(compile("T | project a=x, a=y").is_err());
}

#[test]
fn diagnostics_suppress_sql_entirely() {
    assert!(compile("T | nonsense(").is_err());
}

#[test]
fn take_before_sort_flushes_into_its_own_stage() {
    assert_eq!(
        compile_ok("T | take 5 | sort by X"),
        concat!(
            r#"WITH "__subquery0" AS (SELECT * FROM "T" LIMIT 5), "#,
            r#""__subquery1" AS (SELECT * FROM "__subquery0" ORDER BY "X" ASC NULLS FIRST) "#,
            r#"SELECT * FROM "__subquery1";"#,
        )
    );
}

#[test]
fn take_after_take_composes_as_minimum() {
    assert_eq!(
        compile_ok("T | take 10 | take 5"),
        r#"SELECT * FROM "T" LIMIT 5;"#
    );
}

#[test]
fn as_alias_is_visible_to_a_later_qualified_reference() {
    assert_eq!(
        compile_ok("T | as U | where U.x == 1"),
        r#"SELECT * FROM "T" AS "U" WHERE "U"."x" = 1;"#
    );
}

#[test]
fn top_accepts_a_non_literal_row_count() {
    assert_eq!(
        compile_ok("T | top n by X"),
        concat!(
            r#"WITH "__subquery0" AS (SELECT * FROM "T" ORDER BY "X" ASC NULLS FIRST LIMIT "n") "#,
            r#"SELECT * FROM "__subquery0";"#,
        )
    );
}
