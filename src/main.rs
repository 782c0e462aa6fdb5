//! Command-line front end: dispatch several requests at once, then wait on
//! each with a timeout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use deferred_http::config::{load_config, ClientConfig, TransportKind};
use deferred_http::observability::init_logging;
use deferred_http::{HttpClient, Method, RequestDescriptor};

#[derive(Parser)]
#[command(name = "deferred-http")]
#[command(about = "Send HTTP requests concurrently and wait on each with a timeout", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport backend (overrides the config file).
    #[arg(short, long)]
    transport: Option<TransportKind>,

    /// Seconds to wait for each response.
    #[arg(long, default_value_t = 10.0)]
    timeout: f64,

    /// Request method.
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,

    /// Header as 'Name: value'. Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Query parameter as key=value. Repeatable.
    #[arg(short = 'q', long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Form field as key=value. Repeatable.
    #[arg(short = 'd', long = "data", value_parser = parse_pair)]
    data: Vec<(String, String)>,

    /// JSON file holding an array of request descriptors.
    #[arg(long)]
    requests: Option<PathBuf>,

    /// URLs to request.
    urls: Vec<String>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected 'Name: value', got '{}'", raw))
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn descriptors(cli: &Cli) -> Result<Vec<RequestDescriptor>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    if let Some(path) = &cli.requests {
        let content = std::fs::read_to_string(path)?;
        let loaded: Vec<RequestDescriptor> = serde_json::from_str(&content)?;
        out.extend(loaded);
    }
    for url in &cli.urls {
        let mut descriptor = RequestDescriptor::new(cli.method, url.clone());
        descriptor.headers.extend(cli.headers.iter().cloned());
        descriptor.params.extend(cli.params.iter().cloned());
        descriptor.data.extend(cli.data.iter().cloned());
        out.push(descriptor);
    }
    Ok(out)
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(kind) = cli.transport {
        config.transport.kind = kind;
    }

    init_logging(&config.observability);

    let requests = descriptors(&cli)?;
    if requests.is_empty() {
        eprintln!("Nothing to do: pass URLs or --requests");
        return Ok(ExitCode::FAILURE);
    }

    tracing::info!(
        transport = ?config.transport.kind,
        requests = requests.len(),
        timeout_secs = cli.timeout,
        "Dispatching"
    );

    let client = HttpClient::new(config)?;
    let futures = client.dispatch_all(requests);

    let mut failed = false;
    for future in &futures {
        match future.result_secs(cli.timeout) {
            Ok(response) => {
                println!("{} {} -> {}", future.method(), future.url(), response.status());
                println!("{}", response.text());
            }
            Err(e) if e.is_wait_timeout() => {
                failed = true;
                eprintln!("{} {} -> no response within {}s", future.method(), future.url(), cli.timeout);
            }
            Err(e) => {
                failed = true;
                eprintln!("{} {} -> {}", future.method(), future.url(), e);
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
