//! swagger-faker command line.
//!
//! Serves mock responses from a Swagger/OpenAPI document, prints single
//! generated bodies and checks configuration files.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use swagger_faker::{load_generator, server, FakerConfig};
use swagger_faker_generator::{MockRequest, ResponseGenerator};
use swagger_faker_telemetry::{log_startup, LogFormat, Telemetry, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "swagger-faker", about = "Mock HTTP responses from a Swagger/OpenAPI document", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a standalone mock server.
    Serve {
        /// Path to the configuration file.
        #[arg(short, long, env = "SWAGGER_FAKER_CONFIG")]
        config: String,

        /// Listen address.
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Log level.
        #[arg(long, default_value = "info")]
        log_level: String,

        /// Log format (json or pretty).
        #[arg(long, default_value = "json")]
        log_format: String,
    },

    /// Print one generated response body.
    Generate {
        /// Path to the configuration file.
        #[arg(short, long, env = "SWAGGER_FAKER_CONFIG")]
        config: String,

        /// Request path, e.g. /pets/12.
        #[arg(long)]
        path: String,

        /// HTTP method.
        #[arg(long, default_value = "get")]
        method: String,

        /// Response status (defaults to the configured status for the method).
        #[arg(long)]
        status: Option<u16>,

        /// RNG seed (defaults to the configured seed).
        #[arg(long, allow_negative_numbers = true)]
        seed: Option<i64>,
    },

    /// Load the configuration and the API document, then report.
    Check {
        /// Path to the configuration file.
        #[arg(short, long, env = "SWAGGER_FAKER_CONFIG")]
        config: String,
    },
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or(Path::new("."))
}

fn load_config(path: &str) -> Result<FakerConfig, ExitCode> {
    FakerConfig::load(Path::new(path)).map_err(|e| {
        eprintln!("error: {}", e);
        ExitCode::from(1)
    })
}

/// Run the serve command.
async fn run_serve(config_path: &str, listen: &str, log_level: &str, log_format: &str) -> ExitCode {
    let Some(format) = LogFormat::parse(log_format) else {
        eprintln!("error: invalid log format: {} (expected json or pretty)", log_format);
        return ExitCode::from(1);
    };

    let telemetry_config = TelemetryConfig::new()
        .with_log_level(log_level)
        .with_log_format(format);
    let telemetry = match Telemetry::init(telemetry_config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    log_startup!(
        service = %telemetry.config().service_name,
        version = env!("CARGO_PKG_VERSION"),
        config = config_path,
        "swagger-faker starting"
    );

    let mut config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if !config.enabled {
        tracing::warn!("'swagger_faker.enabled' is false; forcing it on for the standalone server");
        config.enabled = true;
    }

    let generator = match load_generator(&config, config_dir(Path::new(config_path))) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let addr: SocketAddr = match listen.parse() {
        Ok(a) => a,
        Err(_) => {
            eprintln!("error: invalid listen address: {}", listen);
            return ExitCode::from(1);
        }
    };

    let app = server::build_app(
        Arc::new(config),
        Arc::new(generator),
        Arc::clone(telemetry.metrics()),
    );

    match server::run(addr, app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: server failed on {}: {}", addr, e);
            ExitCode::from(1)
        }
    }
}

/// Run the generate command.
fn run_generate(
    config_path: &str,
    path: &str,
    method: &str,
    status: Option<u16>,
    seed: Option<i64>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let operation = method.to_ascii_lowercase();
    let status = match status {
        Some(s) => s,
        None => match config
            .default_status(&operation)
            .and_then(|s| u16::try_from(s).ok())
        {
            Some(s) => s,
            None => {
                eprintln!("error: no default status for method {}; pass --status", method);
                return ExitCode::from(1);
            }
        },
    };

    let generator = match load_generator(&config, config_dir(Path::new(config_path))) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let constraints = config.constraints();
    let request = MockRequest {
        schema: &config.schema,
        path,
        operation: &operation,
        status,
        constraints: &constraints,
        seed: seed.or(config.seed).unwrap_or(0),
    };

    let body = match generator.generate(&request) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    match serde_json::to_string_pretty(&body) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the check command.
fn run_check(config_path: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let generator = match load_generator(&config, config_dir(Path::new(config_path))) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let Some(document) = generator.document(&config.schema) else {
        eprintln!("error: document {} was not registered", config.schema);
        return ExitCode::from(1);
    };

    eprintln!(
        "ok: {} ({} {}, {} operation(s)); interceptor {}, hijack {}",
        document.title,
        match document.format {
            swagger_faker_spec::SpecFormat::Swagger => "swagger",
            swagger_faker_spec::SpecFormat::OpenApi => "openapi",
        },
        document.version,
        document.operations.len(),
        if config.enabled { "enabled" } else { "disabled" },
        if config.hijack { "on" } else { "off" },
    );
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            log_level,
            log_format,
        } => run_serve(&config, &listen, &log_level, &log_format).await,
        Commands::Generate {
            config,
            path,
            method,
            status,
            seed,
        } => run_generate(&config, &path, &method, status, seed),
        Commands::Check { config } => run_check(&config),
    }
}
