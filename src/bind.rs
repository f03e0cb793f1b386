//! Named-to-positional parameter translation.
//!
//! Templates use `:identifier` placeholders; PostgreSQL wants `$1, $2, ...`
//! with a value list. `bind_named` rewrites the template and collects values
//! in first-occurrence order. A name referenced more than once is bound to a
//! single positional slot and that slot is reused at every occurrence, so
//! `WHERE a = :x OR b = :x` binds one value, not two.
//!
//! `::type` casts and text inside single-quoted literals are left untouched.

use crate::error::{SqlError, SqlResult};
use crate::value::{Params, SqlValue};
use std::collections::HashMap;

/// A template rewritten to positional form, with its ordered value list.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl BoundStatement {
    /// A statement whose parameters are already positional.
    pub fn positional(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Rewrite a named template to positional form.
///
/// Every `:identifier` placeholder must have an entry in `params`; a missing
/// name fails with [`SqlError::MissingParameter`] before anything reaches
/// the driver.
pub fn bind_named(template: &str, params: &Params) -> SqlResult<BoundStatement> {
    let bytes = template.as_bytes();
    let mut sql = String::with_capacity(template.len());
    let mut values: Vec<SqlValue> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    // Plain text is copied in whole slices; slicing only happens at ASCII
    // boundaries, so multi-byte content passes through untouched.
    let mut segment_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                // Skip the quoted literal, honoring '' escapes.
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            b':' if i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                // A cast, not a placeholder. Skip the type name too.
                i += 2;
                while i < bytes.len() && is_ident_char(bytes[i]) {
                    i += 1;
                }
            }
            b':' if i + 1 < bytes.len() && is_ident_start(bytes[i + 1]) => {
                sql.push_str(&template[segment_start..i]);
                let name_start = i + 1;
                let mut name_end = name_start + 1;
                while name_end < bytes.len() && is_ident_char(bytes[name_end]) {
                    name_end += 1;
                }
                let name = &template[name_start..name_end];
                let position = match positions.get(name) {
                    Some(position) => *position,
                    None => {
                        let value = params
                            .get(name)
                            .ok_or_else(|| SqlError::missing_parameter(name))?;
                        values.push(value.clone());
                        positions.insert(name, values.len());
                        values.len()
                    }
                };
                sql.push('$');
                sql.push_str(&position.to_string());
                i = name_end;
                segment_start = i;
            }
            _ => i += 1,
        }
    }
    sql.push_str(&template[segment_start..]);

    Ok(BoundStatement { sql, values })
}

/// Build a positional placeholder list `"$1, $2, ..."` of the given length.
///
/// The escape hatch for hand-built `IN (...)` clauses, used together with
/// pre-positioned query generators.
pub fn positional_list(count: usize) -> String {
    let mut out = String::new();
    for i in 1..=count {
        if i > 1 {
            out.push_str(", ");
        }
        out.push('$');
        out.push_str(&i.to_string());
    }
    out
}
