//! Process setup for adapter binaries: command line, log sinks and the stdio
//! transport.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{language::LanguageSupport, server::ArborLanguageServer};

/// Command line shared by adapter binaries.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about)]
pub struct ServerArgs {
    /// Log engine internals at debug level.
    #[arg(long, short)]
    pub verbose: bool,

    /// Write the log here instead of `~/.<name>/<name>.log`.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Install a stderr layer and a file layer. Returns the log file path.
///
/// Safe to call twice; the second subscriber is ignored.
pub fn init_logging(
    name: &str,
    args: &ServerArgs,
) -> PathBuf {
    let target = name.replace('-', "_");
    let directives = if args.verbose {
        format!("arbor_analyzer=debug,{target}=debug,tower_lsp=info")
    } else {
        format!("arbor_analyzer=info,{target}=info,tower_lsp=warn")
    };

    let log_path = args.log_file.clone().unwrap_or_else(|| default_log_path(name));
    let file_name = log_path.file_name().map(OsStr::to_os_string).unwrap_or_else(|| format!("{name}.log").into());
    let file_appender =
        tracing_appender::rolling::never(log_path.parent().unwrap_or(Path::new(".")), file_name);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(&directives));

    // stdout carries the protocol; logs go to stderr.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(&directives));

    let _ = tracing_subscriber::registry().with(file_layer).with(stderr_layer).try_init();
    log_path
}

fn default_log_path(name: &str) -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(format!(".{name}"));
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir.join(format!("{name}.log"));
        }
    }
    std::env::temp_dir().join(format!("{name}.log"))
}

/// Serve `support` over stdin/stdout until the client exits.
pub async fn serve_stdio(
    support: LanguageSupport,
    args: &ServerArgs,
) {
    let name = format!("{}-analyzer", support.language_id);
    let log_path = init_logging(&name, args);
    info!("Starting {name} v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(|client| ArborLanguageServer::new(client, support));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("{name} stopped");
}
