//! SQL DDL for the additive schema of a model.
//! SQLite-first; identifiers are validated at declaration and quoted here.

use crate::model::{FieldDeclaration, PRIMARY_KEY};

/// Double-quotes an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Bare table with only the primary key; every other column is added one by one.
pub fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY NOT NULL)",
        quote_ident(table),
        quote_ident(PRIMARY_KEY)
    )
}

/// `ALTER TABLE .. ADD COLUMN`; columns are nullable so existing rows stay valid.
/// Timestamps and dates are stored as TEXT (RFC3339 / `YYYY-MM-DD`).
pub fn add_column(table: &str, field: &FieldDeclaration) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {} NULL",
        quote_ident(table),
        quote_ident(&field.name),
        field.ty.sql_type()
    )
}

pub const TABLE_COLUMNS: &str = "SELECT name FROM pragma_table_info(?)";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Access, ValueType};

    #[test]
    fn builds_quoted_ddl() {
        assert_eq!(
            create_table("users"),
            r#"CREATE TABLE IF NOT EXISTS "users" ("id" INTEGER PRIMARY KEY NOT NULL)"#
        );
        let field = FieldDeclaration::column("originality", ValueType::Float, Access::Accessible);
        assert_eq!(
            add_column("ideas", &field),
            r#"ALTER TABLE "ideas" ADD COLUMN "originality" REAL NULL"#
        );
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }
}
