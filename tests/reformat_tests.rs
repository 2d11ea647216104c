use sqlplot::backend::ResultTable;
use sqlplot::reformat::{parse_numbers, Reformat};

fn grid(rows: &[&[&str]]) -> ResultTable {
    let cols = rows.first().map_or(0, |r| r.len());
    ResultTable::new(
        "SELECT",
        (0..cols).map(|j| format!("c{}", j)).collect(),
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect(),
    )
}

fn formatted(format: &str, table: &ResultTable) -> Vec<Vec<String>> {
    let mut reformat = Reformat::parse_format(format).unwrap();
    reformat.prepare(table);
    (0..table.num_rows())
        .map(|i| {
            (0..table.num_cols())
                .map(|j| reformat.format(i, j, table.text(i, j)))
                .collect()
        })
        .collect()
}

#[test]
fn test_number_ranges() {
    let set = parse_numbers("3,4 - 7,10").unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7, 10]);
    assert!(parse_numbers("7-4").is_err());
    assert!(parse_numbers("a").is_err());
}

#[test]
fn test_column_selection_lists() {
    let table = grid(&[&["1.234", "2.345", "3.456"]]);
    let out = formatted("cols 0,2=(precision=1)", &table);
    assert_eq!(out[0], vec!["1.2", "2.345", "3.5"]);
}

#[test]
fn test_column_minimum_and_row_maximum() {
    let table = grid(&[&["5", "1", "9"], &["2", "8", "3"]]);
    let out = formatted("min=bold row 1=(max=emph)", &table);
    assert_eq!(out[0], vec!["5", "\\textbf{1}", "9"]);
    assert_eq!(out[1], vec!["\\textbf{2}", "\\emph{8}", "\\textbf{3}"]);
}

#[test]
fn test_highlight_none_disables_inherited_style() {
    let table = grid(&[&["1", "2"], &["3", "4"]]);
    let out = formatted("max=bold col 1=(max=none)", &table);
    assert_eq!(out[1], vec!["\\textbf{3}", "4"]);
}

#[test]
fn test_adaptive_digits() {
    let table = grid(&[&["0.1234", "12.345", "1234.4"]]);
    let out = formatted("digits=3", &table);
    assert_eq!(out[0], vec!["0.123", "12.3", "1234"]);
}

#[test]
fn test_text_cells_pass_through() {
    let table = grid(&[&["quick_sort", "", "7"]]);
    let out = formatted("round=1", &table);
    assert_eq!(out[0], vec!["quick_sort", "", "7.0"]);
}

#[test]
fn test_query_clause_with_nested_parentheses() {
    let (reformat, query) = Reformat::parse_query(
        "REFORMAT(group=(\\,) col 1=(round=2)) SELECT COUNT(*), AVG(t) FROM (SELECT 1 AS t)",
    )
    .unwrap();
    assert_eq!(query, "SELECT COUNT(*), AVG(t) FROM (SELECT 1 AS t)");
    assert_eq!(reformat.format(0, 0, "1234567"), "1\\,234\\,567");
    assert_eq!(reformat.format(0, 1, "3.14159"), "3.14");
}
