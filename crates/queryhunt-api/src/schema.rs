//! `GET /schema`: the six game tables and their DDL.

use axum::Json;
use queryhunt_core::tables::GameTable;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TableInfo {
  pub name:       &'static str,
  /// Tables this one holds foreign keys into.
  pub references: Vec<&'static str>,
  pub ddl:        &'static str,
}

/// `GET /schema`: tables in creation order.
pub async fn handler() -> Json<Vec<TableInfo>> {
  let tables = GameTable::CREATION_ORDER
    .into_iter()
    .map(|table| TableInfo {
      name:       table.name(),
      references: table.references().iter().map(|t| t.name()).collect(),
      ddl:        table.ddl(),
    })
    .collect();
  Json(tables)
}
