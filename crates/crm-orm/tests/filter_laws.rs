//! Cross-module checks for the filter grammar's documented laws: implicit
//! `and` between adjacent triplets, and a leading `not` negating only the
//! triplet right after it.

use crm_orm::{Dialect, FilterParser, ParamList};
use serde_json::json;

fn render(expr: &serde_json::Value) -> (String, usize) {
    let parser = FilterParser::new(Dialect::Postgres);
    let mut params = ParamList::new();
    let sql = parser.parse(expr, &mut params).expect("valid filter expression");
    (sql, params.len())
}

#[test]
fn adjacent_triplets_with_no_operator_are_implicit_and() {
    let explicit = json!([["age", ">", 18], "and", ["status", "=", "active"]]);
    let implicit = json!([["age", ">", 18], ["status", "=", "active"]]);

    let (explicit_sql, explicit_params) = render(&explicit);
    let (implicit_sql, implicit_params) = render(&implicit);

    assert_eq!(explicit_sql, implicit_sql);
    assert_eq!(explicit_params, implicit_params);
}

#[test]
fn leading_not_negates_only_the_next_triplet() {
    let expr = json!([["not", ["status", "=", "banned"]], "and", ["age", ">", 18]]);
    let (sql, params) = render(&expr);

    assert_eq!(sql, "NOT (\"status\" = $1) AND \"age\" > $2");
    assert_eq!(params, 2);
}

#[test]
fn or_has_lower_precedence_than_the_implicit_and_chain() {
    let expr = json!([["a", "=", 1], "or", ["b", "=", 2], ["c", "=", 3]]);
    let (sql, params) = render(&expr);

    assert!(sql.to_uppercase().contains("OR"));
    assert!(sql.to_uppercase().contains("AND"));
    assert_eq!(params, 3);
}
