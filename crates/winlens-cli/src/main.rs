// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use logging::LogTarget;
use runtime::SourceRuntime;
use std::env;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use winlens_app::{
    AppState, DataSource, EventDictionaryCache, QueryDataPaginator, QueryId, QueryStatus,
    VisualBlock, VisualWindow, WindowRenderer,
};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let target = if options.check_only || options.dump.is_some() {
        LogTarget::Headless
    } else {
        LogTarget::Interactive
    };
    let _log_guard = logging::init(target);

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `winlens --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = winlens_client::Client::new(&config.base_url(), config.timeout()?)
        .with_context(|| {
            format!(
                "invalid [server] config in {}; fix base_url/timeout values or set WINLENS_SERVER_URL",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        client.ping()?;
        println!("backend at {} is reachable", client.base_url());
        return Ok(());
    }

    let paginator =
        QueryDataPaginator::new(config.page_size(), WindowRenderer::new(config.style()));

    if let Some(query_id) = &options.dump {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        dump_query(&client, &QueryId::new(query_id.as_str()), paginator, &mut out)?;
        out.flush().context("flush window dump")?;
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = SourceRuntime::new(client);
    winlens_tui::run_app(&mut state, &mut runtime, paginator)
}

/// Loads every page of `query_id` and prints each window as it arrives.
/// Returns the number of windows written.
fn dump_query<S, W>(
    source: &S,
    query_id: &QueryId,
    mut paginator: QueryDataPaginator,
    out: &mut W,
) -> Result<usize>
where
    S: DataSource + ?Sized,
    W: Write,
{
    let query = source
        .list_queries()
        .context("list queries")?
        .into_iter()
        .find(|query| &query.id == query_id)
        .ok_or_else(|| anyhow!("query {query_id} not found; run `winlens` to browse queries"))?;
    if query.status != QueryStatus::Done {
        bail!(
            "query {query_id} is {}; only finished queries have windows",
            query.status.as_str()
        );
    }

    writeln!(
        out,
        "# {} {} ({} rows, {} style)",
        query.id,
        query.describe(),
        query.rows,
        paginator.renderer().strategy().as_str()
    )?;

    let cache = EventDictionaryCache::new();
    paginator.reset(&query);
    let mut written = 0;
    while !paginator.is_exhausted() {
        let offset = paginator.state().offset;
        paginator
            .load_next(source, &cache)
            .with_context(|| format!("load windows of {query_id} at offset {offset}"))?;
        for window in &paginator.windows()[written..] {
            write_window(out, window)?;
        }
        written = paginator.windows().len();
        info!(query = %query_id, written, total = paginator.state().total, "page dumped");
    }
    Ok(written)
}

fn write_window<W: Write>(out: &mut W, window: &VisualWindow) -> io::Result<()> {
    writeln!(out, "{}", window.title())?;
    writeln!(out, "  obs:  {}", block_labels(&window.observation))?;
    writeln!(out, "  pred: {}", block_labels(&window.prediction))
}

fn block_labels(blocks: &[VisualBlock]) -> String {
    if blocks.is_empty() {
        return "-".to_owned();
    }
    blocks
        .iter()
        .map(|block| format!("[{}]", block.label))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    dump: Option<String>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        dump: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--dump" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--dump requires a query id"))?;
                let value = value.as_ref().trim();
                if value.is_empty() {
                    bail!("--dump requires a query id");
                }
                options.dump = Some(value.to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("winlens: browse query result windows from the analysis backend");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and backend reachability");
    println!("  --dump <query-id>        Print every window of a finished query and exit");
    println!("  --help                   Show this help");
    println!();
    println!("Set WINLENS_LOG=1 to write logs to a file; RUST_LOG sets the level.");
}
