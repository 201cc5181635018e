//! Statement builders. Identifiers come only from `ResourceDef`; every value
//! is a positional placeholder cast to the field's column type.

use serde_json::Value;

use crate::registry::{FieldDef, ResourceDef};
use crate::store::{quote_identifier, Statement};

fn placeholder(index: usize, field: &FieldDef) -> String {
    format!("CAST(${} AS {})", index, field.column_type.to_sql())
}

pub fn select_all(def: &ResourceDef) -> Statement {
    Statement::new(
        format!(
            "SELECT * FROM {} ORDER BY {}",
            quote_identifier(def.table),
            quote_identifier(def.key)
        ),
        vec![],
    )
}

pub fn select_where(def: &ResourceDef, field: &FieldDef, value: Value) -> Statement {
    Statement::new(
        format!(
            "SELECT * FROM {} WHERE {} = {} ORDER BY {}",
            quote_identifier(def.table),
            quote_identifier(field.name),
            placeholder(1, field),
            quote_identifier(def.key)
        ),
        vec![value],
    )
}

/// Multi-row insert over `columns`; each row supplies one value per column in order.
pub fn insert(def: &ResourceDef, columns: &[&FieldDef], rows: Vec<Vec<Value>>) -> Statement {
    let column_list = columns
        .iter()
        .map(|f| quote_identifier(f.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params = Vec::with_capacity(rows.len() * columns.len());
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let mut slots = Vec::with_capacity(columns.len());
        for (field, value) in columns.iter().zip(row) {
            params.push(value);
            slots.push(placeholder(params.len(), field));
        }
        tuples.push(format!("({})", slots.join(", ")));
    }

    Statement::new(
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_identifier(def.table),
            column_list,
            tuples.join(", ")
        ),
        params,
    )
}

pub fn update(def: &ResourceDef, assignments: Vec<(&FieldDef, Value)>, id: i64) -> Statement {
    let mut params = Vec::with_capacity(assignments.len() + 1);
    let mut sets = Vec::with_capacity(assignments.len());
    for (field, value) in assignments {
        params.push(value);
        sets.push(format!("{} = {}", quote_identifier(field.name), placeholder(params.len(), field)));
    }
    params.push(Value::from(id));

    Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            quote_identifier(def.table),
            sets.join(", "),
            quote_identifier(def.key),
            params.len()
        ),
        params,
    )
}

pub fn delete(def: &ResourceDef, id: i64) -> Statement {
    Statement::new(
        format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_identifier(def.table),
            quote_identifier(def.key)
        ),
        vec![Value::from(id)],
    )
}
