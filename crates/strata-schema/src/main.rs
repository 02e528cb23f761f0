//! strata CLI
//!
//! Command-line tool for inspecting and diffing database schemas.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strata_schema::prelude::*;

/// Inspect, diff and render relational schemas.
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (`mysql://...` or `postgres://...`).
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// SQL dialect. Inferred from the database URL when omitted.
    #[arg(long, value_enum, env = "STRATA_DIALECT")]
    dialect: Option<DialectArg>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of the current schema.
    Tables,

    /// Show columns, indexes and keys of a table as JSON.
    Describe {
        /// Table name.
        table: String,
    },

    /// Compare a declaration file with the live schema.
    Diff {
        /// JSON declaration file.
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Print CREATE TABLE statements for a declaration file. Needs no
    /// connection.
    Ddl {
        /// JSON declaration file.
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Show the server version.
    Version,
}

fn select_dialect(explicit: Option<DialectArg>, url: Option<&str>) -> DialectArg {
    explicit.unwrap_or_else(|| match url {
        Some(url) if url.starts_with("postgres") => DialectArg::Postgres,
        _ => DialectArg::Mysql,
    })
}

fn load_schema(path: &Path) -> anyhow::Result<Vec<TableDeclaration>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_schema(&json).with_context(|| format!("parsing {}", path.display()))
}

fn render_ddl<D: DdlDialect>(dialect: &D, tables: &[TableDeclaration]) -> anyhow::Result<()> {
    for table in tables {
        for sql in dialect.create_table(&table.name, &table.columns)? {
            println!("{sql};\n");
        }
    }
    // Foreign keys last, so referenced tables already exist.
    for fk in tables.iter().flat_map(|t| &t.foreign_keys) {
        println!("{};\n", dialect.add_foreign_key(fk));
    }
    Ok(())
}

async fn describe<B: SchemaBuilder>(builder: &B, table: &str) -> anyhow::Result<()> {
    if !builder.has_table(table).await? {
        anyhow::bail!("table '{table}' does not exist");
    }
    let description = serde_json::json!({
        "table": table,
        "columns": builder.get_table_columns(table).await?,
        "indexes": builder.get_table_indexes(table).await?,
        "foreign_keys": builder.get_foreign_keys(table).await?,
        "unique_constraints": builder.get_unique_constraints(table).await?,
    });
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

async fn diff<B: SchemaBuilder>(builder: &B, tables: &[TableDeclaration]) -> anyhow::Result<()> {
    let mut differences = 0_usize;
    for table in tables {
        if !builder.has_table(&table.name).await? {
            println!("+ {} (table missing)", table.name);
            differences += 1;
            continue;
        }
        let live = builder.get_table_columns(&table.name).await?;
        for name in missing_columns(&table.columns, &live) {
            println!("+ {}.{name} (column missing)", table.name);
            differences += 1;
        }
        for changed in builder.get_changed_columns(&table.name, &table.columns).await? {
            let marker = if changed.is_primary { " [primary key]" } else { "" };
            println!("~ {}.{}{marker}", table.name, changed.name);
            differences += 1;
        }
    }
    info!(tables = tables.len(), differences, "Diff complete");
    Ok(())
}

async fn run<B: SchemaBuilder>(builder: &B, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Tables => {
            for table in builder.get_tables().await? {
                println!("{table}");
            }
        }
        Commands::Describe { table } => describe(builder, &table).await?,
        Commands::Diff { schema } => diff(builder, &load_schema(&schema)?).await?,
        Commands::Version => {
            println!("{}", builder.get_database_version().await?);
        }
        Commands::Ddl { schema } => render_ddl(builder.dialect(), &load_schema(&schema)?)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dialect = select_dialect(cli.dialect, cli.database.as_deref());

    if let Commands::Ddl { schema } = &cli.command {
        let tables = load_schema(schema)?;
        return match dialect {
            DialectArg::Mysql => render_ddl(&MySqlDialect::new(), &tables),
            DialectArg::Postgres => render_ddl(&PostgresDialect::new(), &tables),
        };
    }

    let url = cli
        .database
        .context("a database URL is required (--database or DATABASE_URL)")?;
    sqlx::any::install_default_drivers();
    let executor = AnyExecutor::connect(&url)
        .await
        .with_context(|| format!("connecting with the {dialect:?} driver"))?;

    match dialect {
        DialectArg::Mysql => run(&MySqlSchemaBuilder::new(executor), cli.command).await,
        DialectArg::Postgres => run(&PostgresSchemaBuilder::new(executor), cli.command).await,
    }
}
