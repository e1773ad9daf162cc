use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::quote_identifier;
use crate::database::table::TableSchema;
use duckdb::params;
use duckdb::Connection;
use tracing::debug;
use tracing::info;

/// Renders the `CREATE TABLE` statement for a schema.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|column| format!("{} {}", quote_identifier(&column.name), column.kind.storage_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(&schema.name))
}

/// Replaces any table with the same name by a new, empty one.
///
/// The drop is idempotent. If the create fails after the drop, the table is
/// simply absent and a later attempt starts clean.
pub fn create_table(connection: &Connection, schema: &TableSchema) -> Result<(), duckdb::Error> {
    let drop = format!("DROP TABLE IF EXISTS {}", quote_identifier(&schema.name));
    debug!(sql = %drop, "dropping table");
    connection.execute_batch(&drop)?;

    let create = create_table_sql(schema);
    debug!(sql = %create, "creating table");
    connection.execute_batch(&create)?;

    info!(table = %schema.name, columns = schema.column_count(), "created table");
    Ok(())
}

/// Reads a table definition back from the catalog, in column order.
/// Returns `None` if the table does not exist.
pub fn describe_table(connection: &Connection, name: &str) -> Result<Option<TableSchema>, duckdb::Error> {
    let mut statement = connection.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_schema = 'main' AND table_name = ? ORDER BY ordinal_position",
    )?;
    let rows = statement.query_map(params![name], |row| {
        let name: String = row.get(0)?;
        let data_type: String = row.get(1)?;
        Ok(Column::new(name, ColumnType::from_catalog(&data_type)))
    })?;

    let mut columns = Vec::new();
    for column in rows {
        columns.push(column?);
    }

    if columns.is_empty() {
        Ok(None)
    } else {
        Ok(Some(TableSchema {
            name: name.to_owned(),
            columns,
        }))
    }
}
