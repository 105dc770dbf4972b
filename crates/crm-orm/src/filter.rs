//! Filter expression parser.
//!
//! Filters arrive over the wire as a JSON array mixing three kinds of
//! elements: a triplet `[field, op, value]`, a logical operator `"and"` /
//! `"or"`, and a nested array (itself a filter expression). A two-element
//! array whose first element is the literal `"not"` negates its single
//! argument. Two consecutive conditions with no operator between them are
//! joined with an implicit `AND`.
//!
//! This mirrors the grammar and operator set of the original filter parser
//! exactly — including the `like`/`ilike` wildcard wrapping and the
//! NULL-aware behavior of `=`/`!=` — so that a filter built against the
//! original system parses identically here.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::params::ParamList;
use crate::value::Value;
use serde_json::Value as Json;

pub struct FilterParser {
    dialect: Dialect,
}

impl FilterParser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Parse a filter expression into a SQL boolean clause, pushing bind
    /// values onto `params` as they're encountered. Returns an empty clause
    /// (`"TRUE"`) for an empty top-level expression.
    pub fn parse(&self, expr: &Json, params: &mut ParamList) -> OrmResult<String> {
        let Json::Array(items) = expr else {
            return Err(OrmError::filter("filter expression must be a JSON array"));
        };
        if items.is_empty() {
            return Ok("TRUE".to_string());
        }
        self.parse_array(items, params)
    }

    fn is_triplet(items: &[Json]) -> bool {
        items.len() == 3 && items[0].is_string()
    }

    /// A bare triplet or a `not` node already parenthesizes itself (or needs
    /// no parens at all), so `parse_array` shouldn't wrap it again — only a
    /// nested `and`/`or` group needs the extra parens to preserve precedence.
    fn is_self_contained(items: &[Json]) -> bool {
        Self::is_triplet(items) || (items.len() == 2 && items[0].as_str() == Some("not"))
    }

    fn parse_node(&self, node: &Json, params: &mut ParamList) -> OrmResult<String> {
        let Json::Array(items) = node else {
            return Err(OrmError::filter("filter element must be an array"));
        };

        if items.len() == 2 && items[0].as_str() == Some("not") {
            let clause = self.parse_node_or_group(&items[1], params)?;
            return Ok(format!("NOT ({clause})"));
        }

        if Self::is_triplet(items) {
            return self.parse_triplet(items, params);
        }

        self.parse_array(items, params)
    }

    /// A "not" payload and top-level groups can both be either a triplet or
    /// a nested array; dispatch accordingly without double-wrapping.
    fn parse_node_or_group(&self, node: &Json, params: &mut ParamList) -> OrmResult<String> {
        if let Json::Array(items) = node {
            if Self::is_triplet(items) {
                return self.parse_triplet(items, params);
            }
        }
        self.parse_node(node, params)
    }

    fn parse_triplet(&self, items: &[Json], params: &mut ParamList) -> OrmResult<String> {
        let field = items[0]
            .as_str()
            .ok_or_else(|| OrmError::filter("triplet field must be a string"))?;
        let op = items[1]
            .as_str()
            .ok_or_else(|| OrmError::filter("triplet operator must be a string"))?
            .to_ascii_lowercase();
        let value = &items[2];
        let escaped = self.dialect.escape_identifier(field);

        match op.as_str() {
            "in" | "not in" => {
                let Json::Array(list) = value else {
                    return Err(OrmError::filter(format!(
                        "operator '{op}' requires a list value"
                    )));
                };
                if list.is_empty() {
                    // An empty IN-list can never match; an empty NOT IN
                    // always matches. Short-circuit instead of emitting
                    // invalid SQL ("IN ()").
                    return Ok(if op == "in" {
                        "FALSE".to_string()
                    } else {
                        "TRUE".to_string()
                    });
                }
                let placeholders: Vec<String> = list
                    .iter()
                    .map(|v| {
                        let idx = params.push(Value::from_json(v));
                        self.dialect.make_placeholder(idx)
                    })
                    .collect();
                let kw = if op == "in" { "IN" } else { "NOT IN" };
                Ok(format!("{escaped} {kw} ({})", placeholders.join(", ")))
            }
            "like" | "ilike" | "=like" | "=ilike" | "not like" | "not ilike" => {
                let text = value
                    .as_str()
                    .ok_or_else(|| OrmError::filter(format!("operator '{op}' requires a string value")))?;
                let wrapped = if op.starts_with('=') {
                    text.to_string()
                } else {
                    format!("%{text}%")
                };
                let sql_op = op.trim_start_matches('=').to_ascii_uppercase();
                let idx = params.push(Value::Text(wrapped));
                Ok(format!("{escaped} {sql_op} {}", self.dialect.make_placeholder(idx)))
            }
            "=" | "!=" | ">" | "<" | ">=" | "<=" => {
                if value.is_null() {
                    return match op.as_str() {
                        "=" => Ok(format!("{escaped} IS NULL")),
                        "!=" => Ok(format!("{escaped} IS NOT NULL")),
                        _ => Err(OrmError::filter(format!(
                            "operator '{op}' cannot be used with null"
                        ))),
                    };
                }
                let idx = params.push(Value::from_json(value));
                Ok(format!("{escaped} {op} {}", self.dialect.make_placeholder(idx)))
            }
            "is null" => Ok(format!("{escaped} IS NULL")),
            "is not null" => Ok(format!("{escaped} IS NOT NULL")),
            "between" | "not between" => {
                let Json::Array(bounds) = value else {
                    return Err(OrmError::filter(format!(
                        "operator '{op}' requires a two-element list"
                    )));
                };
                if bounds.len() != 2 {
                    return Err(OrmError::filter(format!(
                        "operator '{op}' requires exactly two bounds"
                    )));
                }
                let lo = params.push(Value::from_json(&bounds[0]));
                let hi = params.push(Value::from_json(&bounds[1]));
                let kw = if op == "between" { "BETWEEN" } else { "NOT BETWEEN" };
                Ok(format!(
                    "{escaped} {kw} {} AND {}",
                    self.dialect.make_placeholder(lo),
                    self.dialect.make_placeholder(hi)
                ))
            }
            other => Err(OrmError::filter(format!("unsupported operator: {other}"))),
        }
    }

    fn parse_array(&self, items: &[Json], params: &mut ParamList) -> OrmResult<String> {
        #[derive(Clone)]
        enum Part {
            Expr { clause: String, wrap: bool },
            Op(&'static str),
        }

        let mut parts = Vec::new();
        let mut i = 0;
        while i < items.len() {
            let item = &items[i];
            match item {
                Json::Array(_) => {
                    let wrap = !matches!(item, Json::Array(inner) if Self::is_self_contained(inner));
                    let clause = self.parse_node(item, params)?;
                    parts.push(Part::Expr { clause, wrap });
                    i += 1;
                }
                Json::String(s) if s.eq_ignore_ascii_case("and") => {
                    parts.push(Part::Op("AND"));
                    i += 1;
                }
                Json::String(s) if s.eq_ignore_ascii_case("or") => {
                    parts.push(Part::Op("OR"));
                    i += 1;
                }
                other => {
                    return Err(OrmError::filter(format!(
                        "invalid filter element at position {i}: {other}"
                    )));
                }
            }
        }

        let mut normalized = Vec::with_capacity(parts.len());
        for (idx, part) in parts.iter().enumerate() {
            if idx > 0 {
                if let (Part::Expr { .. }, Some(Part::Expr { .. })) =
                    (part, parts.get(idx - 1))
                {
                    normalized.push(Part::Op("AND"));
                }
            }
            normalized.push(part.clone());
        }

        let mut sql = String::new();
        for (idx, part) in normalized.iter().enumerate() {
            if idx > 0 {
                sql.push(' ');
            }
            match part {
                Part::Expr { clause, wrap } => {
                    if *wrap {
                        sql.push('(');
                        sql.push_str(clause);
                        sql.push(')');
                    } else {
                        sql.push_str(clause);
                    }
                }
                Part::Op(op) => sql.push_str(op),
            }
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(expr: Json) -> (String, ParamList) {
        let mut params = ParamList::new();
        let clause = FilterParser::new(Dialect::Postgres)
            .parse(&expr, &mut params)
            .unwrap();
        (clause, params)
    }

    #[test]
    fn simple_equality() {
        let (clause, params) = parse(json!([["name", "=", "acme"]]));
        assert_eq!(clause, "\"name\" = $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn implicit_and_between_triplets() {
        let (clause, _) = parse(json!([["a", "=", 1], ["b", "=", 2]]));
        assert_eq!(clause, "\"a\" = $1 AND \"b\" = $2");
    }

    #[test]
    fn explicit_or() {
        let (clause, _) = parse(json!([["active", "=", true], "or", ["role", "=", "admin"]]));
        assert_eq!(clause, "\"active\" = $1 OR \"role\" = $2");
    }

    #[test]
    fn nested_group_is_wrapped() {
        let (clause, _) = parse(json!([
            ["a", "=", 1],
            "and",
            [["b", "=", 2], "or", ["c", "=", 3]]
        ]));
        assert_eq!(clause, "\"a\" = $1 AND (\"b\" = $2 OR \"c\" = $3)");
    }

    #[test]
    fn not_wraps_single_condition_only() {
        let (clause, _) = parse(json!([["not", ["a", "=", 1]]]));
        assert_eq!(clause, "NOT (\"a\" = $1)");
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (clause, params) = parse(json!([["deleted_at", "=", null]]));
        assert_eq!(clause, "\"deleted_at\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn not_equal_null_becomes_is_not_null() {
        let (clause, _) = parse(json!([["deleted_at", "!=", null]]));
        assert_eq!(clause, "\"deleted_at\" IS NOT NULL");
    }

    #[test]
    fn comparison_cannot_use_null() {
        let mut params = ParamList::new();
        let err = FilterParser::new(Dialect::Postgres)
            .parse(&json!([["age", ">", null]]), &mut params)
            .unwrap_err();
        assert!(matches!(err, OrmError::Filter(_)));
    }

    #[test]
    fn like_wraps_value_in_wildcards() {
        let (clause, params) = parse(json!([["email", "ilike", "acme"]]));
        assert_eq!(clause, "\"email\" ILIKE $1");
        assert_eq!(params.values()[0].to_json(), json!("%acme%"));
    }

    #[test]
    fn equals_like_does_not_wrap() {
        let (_, params) = parse(json!([["email", "=ilike", "acme"]]));
        assert_eq!(params.values()[0].to_json(), json!("acme"));
    }

    #[test]
    fn in_list_empty_short_circuits_false() {
        let (clause, params) = parse(json!([["id", "in", []]]));
        assert_eq!(clause, "FALSE");
        assert!(params.is_empty());
    }

    #[test]
    fn not_in_empty_short_circuits_true() {
        let (clause, _) = parse(json!([["id", "not in", []]]));
        assert_eq!(clause, "TRUE");
    }

    #[test]
    fn between_requires_two_bounds() {
        let mut params = ParamList::new();
        let err = FilterParser::new(Dialect::Postgres)
            .parse(&json!([["age", "between", [1, 2, 3]]]), &mut params)
            .unwrap_err();
        assert!(matches!(err, OrmError::Filter(_)));
    }

    #[test]
    fn empty_expression_is_true() {
        let (clause, params) = parse(json!([]));
        assert_eq!(clause, "TRUE");
        assert!(params.is_empty());
    }

    #[test]
    fn unsupported_operator_errors() {
        let mut params = ParamList::new();
        let err = FilterParser::new(Dialect::Postgres)
            .parse(&json!([["a", "~=", 1]]), &mut params)
            .unwrap_err();
        assert!(matches!(err, OrmError::Filter(_)));
    }
}
