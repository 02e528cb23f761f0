//! MySQL / MariaDB schema builder against a recording executor.

mod common;

use common::{mysql_column, MockExecutor};
use strata_core::metadata::{
    Column, ColumnOptions, ColumnType, ForeignKey, ForeignKeyAction, ForeignKeyOptions,
};
use strata_core::MetadataError;
use strata_schema::prelude::*;

fn column(options: ColumnOptions) -> Column {
    Column::new(options).unwrap()
}

fn user_columns() -> Vec<Column> {
    vec![
        column(ColumnOptions::new("id", ColumnType::Integer).primary().auto_increment()),
        column(ColumnOptions::new("email", ColumnType::VarChar).not_null().unique()),
        column(ColumnOptions::new("age", ColumnType::Integer)),
    ]
}

// =============================================================================
// DDL
// =============================================================================

#[tokio::test]
async fn create_table_runs_single_statement() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    builder.create_table("users", &user_columns()).await.unwrap();

    assert_eq!(
        mock.executed(),
        vec![
            "CREATE TABLE `users` (\n    \
             `id` INT(11) NOT NULL AUTO_INCREMENT,\n    \
             `email` VARCHAR(255) NOT NULL,\n    \
             `age` INT(11) NULL,\n    \
             PRIMARY KEY (`id`),\n    \
             UNIQUE KEY `uniq_email` (`email`)\n)"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn create_table_without_columns_fails_before_execution() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    let err = builder.create_table("empty", &[]).await.unwrap_err();
    assert!(matches!(err, SchemaError::NoColumns(ref t) if t == "empty"));
    assert!(mock.executed().is_empty());
}

#[tokio::test]
async fn add_and_rename_columns() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    let nickname = column(
        ColumnOptions::new("nickname", ColumnType::VarChar)
            .length(32)
            .unique()
            .comment("shown publicly"),
    );
    builder.add_column("users", &nickname).await.unwrap();
    builder.rename_column("users", "nick", &nickname).await.unwrap();

    assert_eq!(
        mock.executed(),
        vec![
            "ALTER TABLE `users` ADD COLUMN `nickname` VARCHAR(32) NULL UNIQUE COMMENT 'shown publicly'",
            "ALTER TABLE `users` CHANGE COLUMN `nick` `nickname` VARCHAR(32) NULL COMMENT 'shown publicly'",
        ]
    );
}

#[tokio::test]
async fn create_index_names_and_kinds() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    builder
        .create_index("users", None, &["email", "age"], None)
        .await
        .unwrap();
    builder
        .create_index("posts", Some("ft_body"), &["body"], Some(IndexKind::Fulltext))
        .await
        .unwrap();
    builder.add_unique_key("users", None, &["email"]).await.unwrap();

    assert_eq!(
        mock.executed(),
        vec![
            "CREATE INDEX `idx_email_age` ON `users` (`email`, `age`)",
            "CREATE FULLTEXT INDEX `ft_body` ON `posts` (`body`)",
            "ALTER TABLE `users` ADD CONSTRAINT `uniq_email` UNIQUE (`email`)",
        ]
    );
}

#[tokio::test]
async fn invalid_names_never_reach_the_executor() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    let err = builder
        .create_index("users; DROP TABLE users", None, &["email"], None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidName { role: "table", .. }));

    let err = builder.drop_column("users", "bio`").await.unwrap_err();
    assert!(matches!(err, SchemaError::InvalidName { role: "column", .. }));

    let err = builder.get_table_columns("").await.unwrap_err();
    assert!(matches!(err, SchemaError::InvalidName { .. }));

    assert!(mock.executed().is_empty());
}

#[tokio::test]
async fn add_foreign_key_with_actions() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    let fk = ForeignKey::new(
        ForeignKeyOptions::new("orders", ["customer_id"], "customers", ["id"])
            .name("fk_orders_customer")
            .on_delete(ForeignKeyAction::Cascade),
    )
    .unwrap();
    builder.add_foreign_key(&fk).await.unwrap();

    assert_eq!(
        mock.executed(),
        vec![
            "ALTER TABLE `orders` ADD CONSTRAINT `fk_orders_customer` FOREIGN KEY (`customer_id`) \
             REFERENCES `customers` (`id`) ON DELETE CASCADE"
        ]
    );
}

#[tokio::test]
async fn deserialized_foreign_key_is_revalidated() {
    let mock = MockExecutor::mysql("8.0.34");
    let builder = MySqlSchemaBuilder::new(&mock);

    let fk: ForeignKey = serde_json::from_str(
        r#"{
            "table": "orders",
            "columns": ["customer_id", "region_id"],
            "referenced_table": "customers",
            "referenced_columns": ["id"]
        }"#,
    )
    .unwrap();

    let err = builder.add_foreign_key(&fk).await.unwrap_err();
    assert!(matches!(
        err,
        SchemaError::Metadata(MetadataError::CardinalityMismatch {
            columns: 2,
            referenced: 1
        })
    ));
    assert!(mock.executed().is_empty());
}

// =============================================================================
// Existence guards
// =============================================================================

#[tokio::test]
async fn mysql_drops_columns_without_guard() {
    let mock = MockExecutor::mysql("8.0.34-0ubuntu0.22.04.1");
    let builder = MySqlSchemaBuilder::new(&mock);

    let dropped = builder.drop_column("users", "bio").await.unwrap();

    assert!(!dropped);
    assert_eq!(
        mock.executed(),
        vec![
            "SELECT VERSION() AS version",
            "ALTER TABLE `users` DROP COLUMN `bio`",
        ]
    );
}

#[tokio::test]
async fn mariadb_guards_by_version() {
    let mock = MockExecutor::mysql("10.1.3-MariaDB");
    let builder = MySqlSchemaBuilder::new(&mock);

    builder.drop_column("users", "bio").await.unwrap();
    builder.drop_index("users", "idx_bio").await.unwrap();
    builder.drop_foreign_key("orders", "fk_1").await.unwrap();
    builder.drop_table("users").await.unwrap();

    assert_eq!(
        mock.ddl(),
        vec![
            "ALTER TABLE `users` DROP COLUMN IF EXISTS `bio`",
            "ALTER TABLE `users` DROP INDEX `idx_bio`",
            "ALTER TABLE `orders` DROP FOREIGN KEY IF EXISTS `fk_1`",
            "DROP TABLE IF EXISTS `users`",
        ]
    );
}

#[tokio::test]
async fn drop_reports_affected_rows() {
    let mock = MockExecutor::mysql("10.6.12-MariaDB").with_default(QueryResult::affected(1));
    let builder = MySqlSchemaBuilder::new(&mock);

    assert!(builder.drop_unique_key("users", "uniq_email").await.unwrap());
    assert_eq!(
        mock.ddl(),
        vec!["ALTER TABLE `users` DROP INDEX IF EXISTS `uniq_email`"]
    );
}

#[tokio::test]
async fn unparseable_version_aborts_drop() {
    let mock = MockExecutor::mysql("unknown");
    let builder = MySqlSchemaBuilder::new(&mock);

    let err = builder.drop_table("users").await.unwrap_err();
    assert!(matches!(err, SchemaError::UnknownVersion(ref v) if v == "unknown"));
    assert!(mock.ddl().is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn driver_errors_carry_context() {
    let mock = MockExecutor::mysql("8.0.34").fail_on("ADD COLUMN", "Duplicate column name 'bio'");
    let builder = MySqlSchemaBuilder::new(&mock);

    let bio = column(ColumnOptions::new("bio", ColumnType::Text));
    let err = builder.add_column("users", &bio).await.unwrap_err();

    match &err {
        SchemaError::QueryFailed { context, source } => {
            assert_eq!(context, "adding column 'bio' to 'users'");
            assert_eq!(source.to_string(), "Duplicate column name 'bio'");
        }
        other => panic!("Expected QueryFailed, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Query failed while adding column 'bio' to 'users': Duplicate column name 'bio'"
    );
}

#[tokio::test]
async fn version_query_failure_is_wrapped() {
    let mock = MockExecutor::new().fail_on("VERSION()", "connection reset");
    let builder = MySqlSchemaBuilder::new(&mock);

    let err = builder.drop_table("users").await.unwrap_err();
    assert!(matches!(
        err,
        SchemaError::QueryFailed { ref context, .. } if context == "reading server version"
    ));
}

// =============================================================================
// Introspection
// =============================================================================

fn live_users() -> QueryResult {
    QueryResult::with_rows(vec![
        mysql_column("id", "int", "int(11)", false, "PRI", None),
        mysql_column("email", "varchar", "varchar(128)", false, "UNI", Some(128)),
        mysql_column("age", "bigint", "bigint(20)", true, "", None),
    ])
}

#[tokio::test]
async fn table_columns_are_decoded() {
    let mock = MockExecutor::mysql("8.0.34").respond("information_schema.COLUMNS", live_users());
    let builder = MySqlSchemaBuilder::new(&mock);

    let columns = builder.get_table_columns("users").await.unwrap();

    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].name, "id");
    assert!(columns[0].primary);
    assert!(columns[0].auto_increment);
    assert!(!columns[0].nullable);
    assert_eq!(columns[0].length, Some(11));
    assert!(columns[1].unique);
    assert_eq!(columns[1].length, Some(128));
    assert!(columns[2].nullable);

    let sql = &mock.executed()[0];
    assert!(sql.starts_with("SELECT COLUMN_NAME, DATA_TYPE, COLUMN_TYPE"));
    assert!(sql.contains("FROM information_schema.COLUMNS WHERE TABLE_SCHEMA = DATABASE()"));
    assert!(sql.contains("AND TABLE_NAME = 'users'"));
    assert!(sql.ends_with("ORDER BY ORDINAL_POSITION ASC"));
}

#[tokio::test]
async fn changed_columns_against_live_schema() {
    let mock = MockExecutor::mysql("8.0.34").respond("information_schema.COLUMNS", live_users());
    let builder = MySqlSchemaBuilder::new(&mock);

    let changed = builder
        .get_changed_columns("users", &user_columns())
        .await
        .unwrap();

    assert_eq!(
        changed,
        vec![
            ChangedColumn {
                name: "email".into(),
                is_primary: false,
            },
            ChangedColumn {
                name: "age".into(),
                is_primary: false,
            },
        ]
    );
}

#[tokio::test]
async fn primary_key_and_single_column_lookup() {
    let mock = MockExecutor::mysql("8.0.34").respond("information_schema.COLUMNS", live_users());
    let builder = MySqlSchemaBuilder::new(&mock);

    assert_eq!(builder.get_primary_key("users").await.unwrap(), vec!["id"]);
    let email = builder.get_column_definition("users", "email").await.unwrap();
    assert_eq!(email.map(|c| c.column_type), Some("varchar(128)".to_string()));
    assert!(builder
        .get_column_definition("users", "missing")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unique_constraint_names_are_distinct() {
    let rows = QueryResult::with_rows(vec![
        Row::new()
            .with("CONSTRAINT_NAME", "uniq_name")
            .with("COLUMN_NAME", "first_name"),
        Row::new()
            .with("CONSTRAINT_NAME", "uniq_name")
            .with("COLUMN_NAME", "last_name"),
        Row::new()
            .with("CONSTRAINT_NAME", "uniq_email")
            .with("COLUMN_NAME", "email"),
    ]);
    let mock = MockExecutor::mysql("8.0.34").respond("CONSTRAINT_TYPE = 'UNIQUE'", rows);
    let builder = MySqlSchemaBuilder::new(&mock);

    assert_eq!(
        builder.get_unique_constraint_names("users").await.unwrap(),
        vec!["uniq_name", "uniq_email"]
    );
    let sql = &mock.executed()[0];
    assert!(sql.contains(
        "FROM information_schema.TABLE_CONSTRAINTS tc INNER JOIN information_schema.KEY_COLUMN_USAGE kcu ON"
    ));
    assert!(sql.contains("tc.TABLE_NAME = 'users'"));
}

#[tokio::test]
async fn indexes_and_foreign_keys() {
    let indexes = QueryResult::with_rows(vec![Row::new()
        .with("INDEX_NAME", "idx_email")
        .with("COLUMN_NAME", "email")
        .with("NON_UNIQUE", 1_i64)
        .with("INDEX_TYPE", "BTREE")]);
    let fks = QueryResult::with_rows(vec![Row::new()
        .with("CONSTRAINT_NAME", "fk_orders_customer")
        .with("COLUMN_NAME", "customer_id")
        .with("REFERENCED_TABLE_NAME", "customers")
        .with("REFERENCED_COLUMN_NAME", "id")]);
    let mock = MockExecutor::mysql("8.0.34")
        .respond("information_schema.STATISTICS", indexes)
        .respond("REFERENCED_TABLE_NAME IS NOT NULL", fks);
    let builder = MySqlSchemaBuilder::new(&mock);

    let idx = builder.get_table_indexes("orders").await.unwrap();
    assert_eq!(idx.len(), 1);
    assert!(!idx[0].unique);
    assert_eq!(idx[0].kind, "BTREE");

    let keys = builder.get_foreign_keys("orders").await.unwrap();
    assert_eq!(
        keys,
        vec![ForeignKeyInfo {
            constraint_name: "fk_orders_customer".into(),
            column: "customer_id".into(),
            referenced_table: "customers".into(),
            referenced_column: "id".into(),
        }]
    );
}

#[tokio::test]
async fn tables_existence_and_definition() {
    let tables = QueryResult::with_rows(vec![
        Row::new().with("TABLE_NAME", "orders"),
        Row::new().with("TABLE_NAME", "users"),
    ]);
    let count = QueryResult::with_rows(vec![Row::new().with("total", 1_i64)]);
    let definition = QueryResult::with_rows(vec![Row::new()
        .with("Table", "users")
        .with("Create Table", "CREATE TABLE `users` (`id` int NOT NULL)")]);
    let mock = MockExecutor::mysql("8.0.34")
        .respond("COUNT(*) AS total", count)
        .respond("TABLE_TYPE = 'BASE TABLE'", tables)
        .respond("SHOW CREATE TABLE", definition);
    let builder = MySqlSchemaBuilder::new(&mock);

    assert_eq!(builder.get_tables().await.unwrap(), vec!["orders", "users"]);
    assert!(builder.has_table("users").await.unwrap());
    assert_eq!(
        builder.get_table_definition("users").await.unwrap(),
        "CREATE TABLE `users` (`id` int NOT NULL)"
    );
    assert!(mock
        .executed()
        .contains(&"SHOW CREATE TABLE `users`".to_string()));
}

#[tokio::test]
async fn missing_table_reports_false() {
    let mock = MockExecutor::mysql("8.0.34")
        .respond("COUNT(*) AS total", QueryResult::with_rows(vec![Row::new().with("total", 0_i64)]));
    let builder = MySqlSchemaBuilder::new(&mock);

    assert!(!builder.has_table("ghosts").await.unwrap());
}

#[tokio::test]
async fn server_version_is_parsed() {
    let mock = MockExecutor::mysql("10.6.12-MariaDB-1:10.6.12+maria~ubu2004");
    let builder = MySqlSchemaBuilder::new(&mock);

    let version = builder.get_database_version().await.unwrap();
    assert_eq!(version, DatabaseVersion::new(Flavor::MariaDb, 10, 6, 12));
}
