//! Value expression model for flow-spec match conditions.
//!
//! Numeric match conditions (ports, protocols, packet lengths, ...) mirror
//! the wire encoding of flow-spec rules: an ordered list of
//! `(operator, operand)` terms where runs of AND-combined terms form one
//! conjunctive clause and each OR-combined term starts a new clause. The
//! whole expression is a disjunction of those clauses.
//!
//! ```text
//! =40,=50,=60,>=70&<=80   =>   [=40] | [=50] | [=60] | [>=70 & <=80]
//! ```
//!
//! TCP-flag and fragment conditions are a single `(mask, negate)` pair; the
//! engine normalizes the vendor spelling without re-deriving per-bit
//! semantics.

use crate::error::ExtractError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Comparison operator of a single numeric match term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl NumericOp {
    /// The operator token as vendors print it and as the canonical form
    /// renders it.
    pub fn token(&self) -> &'static str {
        match self {
            NumericOp::Eq => "=",
            NumericOp::Ne => "!=",
            NumericOp::Lt => "<",
            NumericOp::Le => "<=",
            NumericOp::Gt => ">",
            NumericOp::Ge => ">=",
        }
    }
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How a term combines with the one before it. `Or` starts a new clause,
/// `And` extends the current one. The first term's combinator is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Or,
    And,
}

/// One `(operator, operand, combinator)` term of a numeric expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericTerm {
    pub op: NumericOp,
    pub operand: u64,
    pub combinator: Combinator,
}

/// A numeric match condition as a disjunction of conjunctive clauses.
///
/// An empty term list means "unconstrained"; recognizers leave the record
/// field absent instead of storing an empty expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumericValue {
    pub terms: Vec<NumericTerm>,
}

impl NumericValue {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for NumericValue {
    /// Canonical rendering: clause terms joined by `&`, clauses by `|`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(match term.combinator {
                    Combinator::Or => "|",
                    Combinator::And => "&",
                })?;
            }
            write!(f, "{}{}", term.op, term.operand)?;
        }
        Ok(())
    }
}

impl Serialize for NumericValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A TCP-flag or fragment-flag match condition as printed by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmaskValue {
    pub mask: u64,
    pub negate: bool,
}

impl fmt::Display for BitmaskValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("!")?;
        }
        write!(f, "0x{:x}", self.mask)
    }
}

impl Serialize for BitmaskValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a multi-term numeric expression such as `=40,=50,>=70&<=80`.
///
/// Both `,` and `|` separate clauses, so re-parsing a canonical rendering
/// yields an equal expression. `&` joins terms inside a clause. Every term
/// must be one of the six operator tokens followed by an unsigned integer.
pub fn parse_numeric_expression(text: &str) -> Result<NumericValue, ExtractError> {
    let mut terms = Vec::new();

    for clause in text.split([',', '|']) {
        let mut combinator = Combinator::Or;

        for term in clause.split('&') {
            let (op, operand_text) = split_operator(term)
                .ok_or_else(|| ExtractError::InvalidOperator(term.to_string()))?;
            let operand = operand_text
                .parse::<u64>()
                .map_err(|_| ExtractError::InvalidOperator(term.to_string()))?;

            terms.push(NumericTerm {
                op,
                operand,
                combinator,
            });
            combinator = Combinator::And;
        }
    }

    Ok(NumericValue { terms })
}

/// Split a term into its operator token and the operand text.
/// Two-character tokens are tried before their one-character prefixes.
fn split_operator(term: &str) -> Option<(NumericOp, &str)> {
    for (token, op) in [
        (">=", NumericOp::Ge),
        ("<=", NumericOp::Le),
        ("!=", NumericOp::Ne),
        (">", NumericOp::Gt),
        ("<", NumericOp::Lt),
        ("=", NumericOp::Eq),
    ] {
        if let Some(rest) = term.strip_prefix(token) {
            return Some((op, rest));
        }
    }
    None
}

/// Parse a bitmask literal in the caller's radix (hex for Cisco and Juniper
/// flag fields, decimal for Arista). The negation marker is recognized by
/// the caller before the numeric parse.
pub fn parse_bitmask(text: &str, radix: u32, negate: bool) -> Result<BitmaskValue, ExtractError> {
    let mask = u64::from_str_radix(text, radix)
        .map_err(|_| ExtractError::InvalidBitmask(text.to_string()))?;
    Ok(BitmaskValue { mask, negate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_equality() {
        let value = parse_numeric_expression("=443").unwrap();
        assert_eq!(
            value.terms,
            vec![NumericTerm {
                op: NumericOp::Eq,
                operand: 443,
                combinator: Combinator::Or,
            }]
        );
    }

    #[test]
    fn test_parse_clause_grouping() {
        let value = parse_numeric_expression("=40,=50,=60,>=70&<=80").unwrap();
        let ops: Vec<(NumericOp, u64, Combinator)> = value
            .terms
            .iter()
            .map(|t| (t.op, t.operand, t.combinator))
            .collect();
        assert_eq!(
            ops,
            vec![
                (NumericOp::Eq, 40, Combinator::Or),
                (NumericOp::Eq, 50, Combinator::Or),
                (NumericOp::Eq, 60, Combinator::Or),
                (NumericOp::Ge, 70, Combinator::Or),
                (NumericOp::Le, 80, Combinator::And),
            ]
        );
    }

    #[test]
    fn test_render_canonical_form() {
        let value = parse_numeric_expression("=40,=50,=60,>=70&<=80").unwrap();
        assert_eq!(value.to_string(), "=40|=50|=60|>=70&<=80");
    }

    #[test]
    fn test_parse_render_roundtrip_is_idempotent() {
        for text in ["=6", ">=1026&<=65499", "=40,=50,=60,>=70&<=80", "!=0,<5"] {
            let parsed = parse_numeric_expression(text).unwrap();
            let reparsed = parse_numeric_expression(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "roundtrip differs for '{}'", text);
        }
    }

    #[test]
    fn test_invalid_operator_token() {
        let err = parse_numeric_expression("~443").unwrap_err();
        assert_eq!(err, ExtractError::InvalidOperator("~443".to_string()));

        let err = parse_numeric_expression("=40,@50").unwrap_err();
        assert_eq!(err, ExtractError::InvalidOperator("@50".to_string()));
    }

    #[test]
    fn test_operator_without_operand() {
        let err = parse_numeric_expression(">=").unwrap_err();
        assert_eq!(err, ExtractError::InvalidOperator(">=".to_string()));
    }

    #[test]
    fn test_parse_bitmask_hex_and_decimal() {
        assert_eq!(
            parse_bitmask("18", 16, false).unwrap(),
            BitmaskValue {
                mask: 0x18,
                negate: false,
            }
        );
        assert_eq!(
            parse_bitmask("18", 10, true).unwrap(),
            BitmaskValue {
                mask: 18,
                negate: true,
            }
        );
    }

    #[test]
    fn test_parse_bitmask_rejects_non_numeric() {
        let err = parse_bitmask("zz", 16, false).unwrap_err();
        assert_eq!(err, ExtractError::InvalidBitmask("zz".to_string()));
    }

    #[test]
    fn test_bitmask_rendering() {
        let mask = BitmaskValue {
            mask: 0x18,
            negate: false,
        };
        assert_eq!(mask.to_string(), "0x18");

        let negated = BitmaskValue {
            mask: 0x02,
            negate: true,
        };
        assert_eq!(negated.to_string(), "!0x2");
    }
}
