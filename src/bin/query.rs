use std::path::PathBuf;

use clap::Parser;
use datastore::{Database, JsonStorage, Predicate, QueryResult, Result, expr, logging};

#[derive(Parser, Debug)]
#[command(name = "query", about = "Query tool for a JSON datastore file")]
struct Cli {
    /// Print the field names and exit
    #[arg(long)]
    show: bool,

    /// Comma separated field names to select, every field when omitted
    #[arg(short, long)]
    select: Option<String>,

    /// Filter in the form FIELD=value, repeat to require several
    #[arg(short, long)]
    filter: Vec<String>,

    /// Comma separated field names to order by, ascending
    #[arg(short, long)]
    order: Option<String>,

    /// JSON database file
    #[arg(short, long, default_value = "db.json", env = "DATASTORE_DB")]
    db: PathBuf,
}

fn main() {
    logging::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db = Database::open(JsonStorage::open(&cli.db)?)?;
    let scheme = db.scheme();

    if cli.show {
        let names: Vec<&str> = scheme.fields().iter().map(|f| f.name.as_str()).collect();
        println!("{}", names.join(","));
        return Ok(());
    }

    let select = match &cli.select {
        Some(list) => expr::parse_field_list(scheme, list)?,
        None => vec![],
    };
    let filter = match expr::parse_filters(scheme, cli.filter.as_slice())? {
        Some(root) => Predicate::new(root),
        None => Predicate::always_true(),
    };
    let order_by = match &cli.order {
        Some(list) => expr::parse_field_list(scheme, list)?,
        None => vec![],
    };

    print_result(&db.query(&select, &filter, &order_by));
    Ok(())
}

fn print_result(result: &QueryResult) {
    for row in result {
        let line: Vec<String> = row
            .values()
            .map(|v| v.map(ToString::to_string).unwrap_or_default())
            .collect();
        println!("{}", line.join(","));
    }
}
