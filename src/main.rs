use std::process::ExitCode;

use aaa_avp::{Attr, Value};
use log::{debug, error};

const EXIT_USAGE: u8 = 2;

fn attr_lines() -> Vec<String> {
    Attr::ALL
        .iter()
        .map(|a| format!("{}\t{}\t{}", a.constant(), a.as_u32(), a.name()))
        .collect()
}

fn value_lines() -> Vec<String> {
    Value::ALL
        .iter()
        .map(|v| format!("{}\t{}\t{}\t{}", v.constant(), v.as_u32(), v.name(), v.attr().name()))
        .collect()
}

/// Lines to print for the requested table, `None` for an unknown table.
fn table_lines(what: Option<&str>) -> Option<Vec<String>> {
    match what {
        None => {
            let mut lines = attr_lines();
            lines.extend(value_lines());
            Some(lines)
        }
        Some("attrs") => Some(attr_lines()),
        Some("values") => Some(value_lines()),
        Some(_) => None,
    }
}

fn run(what: Option<&str>, out: &mut impl std::io::Write) -> u8 {
    debug!("listing {:?}", what);
    let lines = match table_lines(what) {
        Some(lines) => lines,
        None => {
            error!("unknown table {}, expected attrs or values", what.unwrap_or_default());
            return EXIT_USAGE;
        }
    };
    for line in lines {
        if let Err(e) = writeln!(out, "{}", line) {
            error!("write failed: {}", e);
            return 1;
        }
    }
    0
}

fn main() -> ExitCode {
    // stdout carries the table
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .init();

    let what = std::env::args().nth(1);
    let status = run(what.as_deref(), &mut std::io::stdout().lock());
    ExitCode::from(status)
}
