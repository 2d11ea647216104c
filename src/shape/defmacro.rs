//! DEFMACRO: one macro definition per result column.

use crate::backend::ResultTable;
use crate::errors::{Result, SpError};
use crate::reformat::Reformat;

/// A macro name, taken from the column name, and its formatted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub value: String,
}

/// Build the definitions from a single-row result.
pub fn collect(table: &ResultTable, reformat: &Reformat) -> Result<Vec<MacroDef>> {
    if table.num_rows() != 1 {
        return Err(SpError::shape(
            "DEFMACRO",
            format!("query returned {} rows, expected exactly one", table.num_rows()),
        ));
    }

    Ok((0..table.num_cols())
        .map(|j| MacroDef {
            name: table.col_name(j).to_string(),
            value: reformat.format(0, j, table.text(0, j)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_definition_per_column() {
        let table = ResultTable::new(
            "SELECT",
            vec!["total".into(), "avg".into()],
            vec![vec![Some("42".into()), Some("3.14159".into())]],
        );
        let reformat = Reformat::parse_format("col 1=(round=2)").unwrap();
        let defs = collect(&table, &reformat).unwrap();
        assert_eq!(
            defs,
            vec![
                MacroDef { name: "total".into(), value: "42".into() },
                MacroDef { name: "avg".into(), value: "3.14".into() },
            ]
        );
    }

    #[test]
    fn test_requires_exactly_one_row() {
        let empty = ResultTable::new("SELECT", vec!["a".into()], vec![]);
        assert!(matches!(
            collect(&empty, &Reformat::default()),
            Err(SpError::Shape { .. })
        ));
    }
}
