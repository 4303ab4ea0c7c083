//! Plain-text rendering of query results.

use queryhunt_core::store::QueryOutput;
use serde_json::Value;

/// Widest a single cell may print before it is cut with `…`.
const MAX_CELL_WIDTH: usize = 40;

/// Render `output` as a boxed ASCII table followed by a row count.
pub fn table(output: &QueryOutput) -> String {
  if output.columns.is_empty() {
    return "(no columns)\n".to_string();
  }

  let cells: Vec<Vec<String>> = output
    .rows
    .iter()
    .map(|row| row.iter().map(cell).collect())
    .collect();

  let mut widths: Vec<usize> = output.columns.iter().map(|c| c.chars().count()).collect();
  for row in &cells {
    for (i, c) in row.iter().enumerate() {
      if let Some(w) = widths.get_mut(i) {
        *w = (*w).max(c.chars().count());
      }
    }
  }

  let rule: String = {
    let mut s = String::from("+");
    for w in &widths {
      s.push_str(&"-".repeat(w + 2));
      s.push('+');
    }
    s
  };

  let mut out = String::new();
  out.push_str(&rule);
  out.push('\n');
  out.push_str(&line(&output.columns, &widths));
  out.push_str(&rule);
  out.push('\n');
  for row in &cells {
    out.push_str(&line(row, &widths));
  }
  if !cells.is_empty() {
    out.push_str(&rule);
    out.push('\n');
  }

  let n = output.rows.len();
  out.push_str(&format!("{n} row{}", if n == 1 { "" } else { "s" }));
  if output.truncated {
    out.push_str(" (truncated)");
  }
  out.push('\n');
  out
}

fn line(values: &[String], widths: &[usize]) -> String {
  let mut s = String::from("|");
  for (i, w) in widths.iter().enumerate() {
    let v = values.get(i).map(String::as_str).unwrap_or("");
    let pad = w - v.chars().count().min(*w);
    s.push(' ');
    s.push_str(v);
    s.push_str(&" ".repeat(pad));
    s.push_str(" |");
  }
  s.push('\n');
  s
}

fn cell(value: &Value) -> String {
  let text = match value {
    Value::Null => "NULL".to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  };
  let text = text.replace(['\n', '\r'], " ");
  if text.chars().count() > MAX_CELL_WIDTH {
    let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    format!("{cut}…")
  } else {
    text
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn output(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryOutput {
    QueryOutput {
      columns: columns.iter().map(|c| c.to_string()).collect(),
      rows,
      truncated: false,
    }
  }

  #[test]
  fn pads_columns_to_widest_cell() {
    let out = table(&output(
      &["suspect_id", "name"],
      vec![vec![json!(1), json!("Jane Doe")], vec![json!(2), json!(null)]],
    ));
    let expected = "\
+------------+----------+
| suspect_id | name     |
+------------+----------+
| 1          | Jane Doe |
| 2          | NULL     |
+------------+----------+
2 rows
";
    assert_eq!(out, expected);
  }

  #[test]
  fn empty_result_keeps_header() {
    let out = table(&output(&["name"], vec![]));
    assert_eq!(out, "+------+\n| name |\n+------+\n0 rows\n");
  }

  #[test]
  fn long_cells_are_cut() {
    let long = "x".repeat(100);
    let out = table(&output(&["motive"], vec![vec![json!(long)]]));
    let row = out.lines().nth(3).unwrap();
    assert!(row.ends_with("… |"), "{row}");
    assert_eq!(row.chars().count(), MAX_CELL_WIDTH + 4);
  }

  #[test]
  fn truncation_is_flagged() {
    let mut o = output(&["n"], vec![vec![json!(1.5)]]);
    o.truncated = true;
    assert!(table(&o).ends_with("1 row (truncated)\n"));
  }
}
