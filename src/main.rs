use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use sql_pager::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Page through SQL query results")]
struct Args {
    /// Log filter, e.g. `sql_pager=debug`. Falls back to `RUST_LOG`, then `warn`.
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page and print it as JSON.
    Page(PageArgs),
    /// Print the connection profile and detected dialect.
    Detect {
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShapeArg {
    Array,
    Map,
    Scalar,
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    #[arg(long)]
    db: PathBuf,
    #[arg(long)]
    count_sql: String,
    #[arg(long)]
    data_sql: String,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, default_value_t = 10)]
    size: usize,
    /// Positional parameter shared by both queries; repeat in order.
    #[arg(long = "param")]
    params: Vec<String>,
    #[arg(long, value_enum, default_value = "map")]
    shape: ShapeArg,
    /// Target type for `--shape scalar`.
    #[arg(long, default_value = "text")]
    scalar_type: ScalarType,
    #[arg(long, value_enum, default_value = "preserve")]
    key_case: KeyCase,
    /// Skip detection and window for this dialect.
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,
    /// Bind empty `--param` values as empty strings instead of NULL.
    #[arg(long)]
    keep_empty_strings: bool,
    #[arg(long)]
    pretty: bool,
}

/// Interpret a command-line parameter: integers, decimals, `null`, `true`/`false`, else text.
fn parse_param(raw: &str) -> RowValues {
    if raw.eq_ignore_ascii_case("null") {
        RowValues::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        RowValues::Int(i)
    } else if let Ok(f) = raw.parse::<f64>()
        && raw.contains('.')
    {
        RowValues::Float(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        RowValues::Bool(b)
    } else {
        RowValues::Text(raw.to_string())
    }
}

fn open(db: &Path) -> Result<SqliteConnection, SqlPagerError> {
    SqliteConnection::sqlite_builder(db.display().to_string())
        .read_only(true)
        .wal(false)
        .open()
}

fn run_page(args: PageArgs) -> Result<String, SqlPagerError> {
    let conn = open(&args.db)?;
    let options = RunnerOptions::default()
        .with_key_case(args.key_case)
        .with_empty_string_as_null(!args.keep_empty_strings);
    let engine = PaginationEngine::with_options(Arc::new(DialectDetector::new()), options);

    let mut request = PageRequest::new(args.count_sql, args.data_sql)
        .with_page(args.page)
        .with_size(args.size);
    if !args.params.is_empty() {
        request = request.with_params(args.params.iter().map(|p| parse_param(p)).collect());
    }

    let shape = match args.shape {
        ShapeArg::Array => RowShape::<()>::array(),
        ShapeArg::Map => RowShape::map(),
        ShapeArg::Scalar => RowShape::scalar(args.scalar_type),
    };
    let page = match args.dialect {
        Some(dialect) => engine.paginate(&conn, dialect, &request, &shape)?,
        None => engine.paginate_detected(&conn, &request, &shape)?,
    };
    to_json(&page, args.pretty)
}

fn run_detect(db: &Path) -> Result<String, SqlPagerError> {
    let conn = open(db)?;
    let metadata = conn.metadata()?;
    let profile = DialectProfile::read(&*metadata);
    let dialect = profile.dialect()?;
    to_json(
        &serde_json::json!({ "dialect": dialect, "profile": profile }),
        true,
    )
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, SqlPagerError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|err| SqlPagerError::ExecutionError(format!("cannot render JSON: {err}")))
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = args
        .log
        .as_deref()
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Page(page) => run_page(page),
        Command::Detect { db } => run_detect(&db),
    };
    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "sql-pager failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_by_shape() {
        assert_eq!(parse_param("42"), RowValues::Int(42));
        assert_eq!(parse_param("1.5"), RowValues::Float(1.5));
        assert_eq!(parse_param("NULL"), RowValues::Null);
        assert_eq!(parse_param("true"), RowValues::Bool(true));
        assert_eq!(parse_param("inf"), RowValues::Text("inf".into()));
        assert_eq!(parse_param(""), RowValues::Text(String::new()));
    }

    #[test]
    fn cli_parses_page_command() {
        let args = Args::try_parse_from([
            "sql-pager", "page", "--db", "x.db", "--count-sql", "select count(*) from t",
            "--data-sql", "select * from t", "--page", "2", "--param", "7",
            "--shape", "scalar", "--scalar-type", "long", "--dialect", "mysql",
        ])
        .unwrap();
        match args.command {
            Command::Page(page) => {
                assert_eq!(page.page, 2);
                assert_eq!(page.params, vec!["7".to_string()]);
                assert_eq!(page.scalar_type, ScalarType::Long);
                assert_eq!(page.dialect, Some(Dialect::MySql));
            }
            Command::Detect { .. } => panic!("expected page"),
        }
    }
}
