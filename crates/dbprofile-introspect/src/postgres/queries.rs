use sqlx::PgPool;

use dbprofile_core::{Error, ExtractOptions, Result};

pub(crate) const CURSOR_NAME: &str = "dbprofile_values";

pub async fn fetch_database_name(pool: &PgPool) -> Result<String> {
    let name = sqlx::query_scalar::<_, String>("select current_database()::text")
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    Ok(name)
}

pub async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind in ('r','p','v','m','f')
        order by c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select a.attname::text
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

/// `select` statement streaming one column as text, honouring the extraction options.
pub fn value_query(schema: &str, table: &str, column: &str, options: &ExtractOptions) -> String {
    let mut sql = String::from("select ");
    if options.distinct {
        sql.push_str("distinct ");
    }
    sql.push_str(&format!(
        "{} from {}.{}",
        column_text(column),
        quote_ident(schema),
        quote_ident(table)
    ));

    let filter = options
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|filter| !filter.is_empty());
    if let Some(filter) = filter {
        sql.push_str(&format!(" where {filter}"));
    }
    if let Some(limit) = options.row_limit() {
        sql.push_str(&format!(" limit {limit}"));
    }
    sql
}

/// Text rendering of `column`. An empty `bytea` renders as `''` instead of `\x`
/// so it still counts as an empty value.
fn column_text(column: &str) -> String {
    let column = quote_ident(column);
    format!(
        "case when pg_typeof({column}) = 'bytea'::regtype and {column}::text = '\\x' \
         then '' else {column}::text end"
    )
}

pub fn declare_cursor(query: &str) -> String {
    format!("declare {CURSOR_NAME} no scroll cursor for {query}")
}

pub fn fetch_batch(batch_size: usize) -> String {
    format!("fetch forward {batch_size} from {CURSOR_NAME}")
}

pub fn close_cursor() -> String {
    format!("close {CURSOR_NAME}")
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn plain_value_query() {
        let sql = value_query("public", "users", "email", &ExtractOptions::default());
        assert_eq!(
            sql,
            r#"select case when pg_typeof("email") = 'bytea'::regtype and "email"::text = '\x' then '' else "email"::text end from "public"."users""#
        );
    }

    #[test]
    fn value_query_applies_options() {
        let options = ExtractOptions {
            limit: Some(100),
            filter: Some("  created_at > now() - interval '1 day' ".to_string()),
            distinct: true,
        };
        let sql = value_query("app", "events", "kind", &options);
        assert_eq!(
            sql,
            format!(
                "select distinct {} from \"app\".\"events\" \
                 where created_at > now() - interval '1 day' limit 100",
                column_text("kind")
            )
        );
    }

    #[test]
    fn zero_limit_and_blank_filter_are_dropped() {
        let options = ExtractOptions {
            limit: Some(0),
            filter: Some("   ".to_string()),
            distinct: false,
        };
        let sql = value_query("s", "t", "c", &options);
        assert_eq!(sql, format!("select {} from \"s\".\"t\"", column_text("c")));
    }

    #[test]
    fn cursor_statements_share_a_name() {
        assert_eq!(
            declare_cursor("select 1"),
            "declare dbprofile_values no scroll cursor for select 1"
        );
        assert_eq!(fetch_batch(500), "fetch forward 500 from dbprofile_values");
        assert_eq!(close_cursor(), "close dbprofile_values");
    }
}
