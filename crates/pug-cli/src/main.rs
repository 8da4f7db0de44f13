use clap::{Parser, Subcommand};
use pug_scanner::{Session, Token, ValidSymbols};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pug-scan")]
#[command(about = "Drive the Pug external scanner and print the tokens it produces")]
#[command(version)]
struct Cli {
    /// Print the serialized scanner state after every token
    #[arg(long, global = true)]
    state: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the NEWLINE / INDENT / DEDENT structure of a .pug file
    Outline {
        /// Input .pug file
        path: String,
    },

    /// Scan attribute values, e.g. `a ? b : c, 'x'`
    Attr {
        /// Attribute list contents
        expr: String,

        /// Accept STRING tokens for plain quoted values
        #[arg(long)]
        string: bool,

        /// Do not accept JS_ATTR tokens
        #[arg(long)]
        no_js: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Outline { path } => cmd_outline(&path, cli.state),
        Command::Attr {
            expr,
            string,
            no_js,
        } => cmd_attr(&expr, string, no_js, cli.state),
    }
}

/// Install a stderr subscriber when `PUG_SCAN_LOG` or `RUST_LOG` is set.
fn init_tracing() {
    let filter = match std::env::var("PUG_SCAN_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_outline(path: &str, show_state: bool) {
    let source = read_source(path);
    debug!(path, bytes = source.len(), "outline");
    let mut outline = Session::outline(&source);

    while let Some(token) = outline.next() {
        print_token(outline.session(), token, show_state);
    }
}

fn cmd_attr(expr: &str, string: bool, no_js: bool, show_state: bool) {
    let mut valid = ValidSymbols::empty();
    valid.set(ValidSymbols::JS_ATTR, !no_js);
    valid.set(ValidSymbols::STRING, string);
    if valid.is_empty() {
        eprintln!("Error: --no-js without --string leaves nothing to scan");
        std::process::exit(1);
    }

    debug!(?valid, "attributes");
    let mut attrs = Session::attributes(expr, valid);
    while let Some(token) = attrs.next() {
        print_token(attrs.session(), token, show_state);
    }
}

fn print_token(session: &Session<'_>, token: Token, show_state: bool) {
    let span = token.span;
    let mut line = format!(
        "{}:{}\t{}\t{:?}",
        span.line,
        span.column,
        token.kind,
        session.text(span)
    );

    if show_state {
        match session.scanner().serialize() {
            Ok(bytes) => line.push_str(&format!("\t{bytes:?}")),
            Err(e) => {
                eprintln!("Error serializing scanner state: {e}");
                std::process::exit(1);
            }
        }
    }

    println!("{line}");
}
