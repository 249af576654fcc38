use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mailsift_web::config::{ConfigSource, FileConfig};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "mailsiftd",
    about = "Mailsiftd — mail-filter appliance console daemon",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console HTTP server
    Serve {
        /// Port to listen on (default: $MAILSIFT_PORT or 8080)
        #[arg(long, env = "MAILSIFT_PORT", default_value = "8080")]
        port: u16,
        /// Host to bind (default: $MAILSIFT_HOST or 0.0.0.0)
        #[arg(long, env = "MAILSIFT_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Directory holding the console templates
        #[arg(long, env = "MAILSIFT_TEMPLATES")]
        templates: Option<PathBuf>,
        /// TOML file with the HTTP-facing preferences
        #[arg(long, env = "MAILSIFT_HTTP_CONF")]
        http_conf: Option<PathBuf>,
        /// Flat appliance conf file carrying the registration flag
        #[arg(long, env = "MAILSIFT_CONF")]
        conf: Option<PathBuf>,
        /// TOML language override file
        #[arg(long, env = "MAILSIFT_LANG_FILE")]
        lang_file: Option<PathBuf>,
        /// Appliance database (relocates the conf file when provisioned)
        #[arg(long, env = "MAILSIFT_DB")]
        db: Option<PathBuf>,
        /// Log level: error, warn, info, debug, verbose (default: $MAILSIFT_LOG_LEVEL or warn)
        #[arg(long, env = "MAILSIFT_LOG_LEVEL")]
        log_level: Option<String>,
    },
    /// Print the effective configuration a serve would run with
    CheckConfig {
        /// TOML file with the HTTP-facing preferences
        #[arg(long, env = "MAILSIFT_HTTP_CONF")]
        http_conf: Option<PathBuf>,
        /// Flat appliance conf file carrying the registration flag
        #[arg(long, env = "MAILSIFT_CONF")]
        conf: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let effective_log_level = if let Commands::Serve { ref log_level, .. } = cli.command {
        let raw = log_level
            .clone()
            .or_else(|| std::env::var("MAILSIFT_LOG_LEVEL").ok())
            .unwrap_or_else(|| "warn".into());
        if raw.eq_ignore_ascii_case("verbose") {
            "debug".to_owned()
        } else {
            raw
        }
    } else {
        std::env::var("MAILSIFT_LOG_LEVEL").unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&effective_log_level))
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            templates,
            http_conf,
            conf,
            lang_file,
            db,
            log_level: _,
        } => {
            let cfg = mailsift_web::ServerConfig {
                host,
                port,
                templates_dir: templates,
                http_conf,
                registration_conf: conf,
                lang_file,
                db_path: db,
            };
            mailsift_web::run(cfg).await
        }

        Commands::CheckConfig { http_conf, conf } => cmd_check_config(http_conf, conf),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

fn cmd_check_config(http_conf: Option<PathBuf>, conf: Option<PathBuf>) -> Result<()> {
    let http_conf = match http_conf {
        Some(path) => path,
        None => mailsift_web::dirs::config_dir()?.join("httpd.toml"),
    };
    let conf = match conf {
        Some(path) => path,
        None => mailsift_web::dirs::config_dir()?.join("appliance.conf"),
    };

    let config = FileConfig::new(http_conf.clone(), conf.clone());
    let prefs = config.http_preferences();

    println!("http preferences ({}):", http_conf.display());
    println!("  scheme:      {}", prefs.scheme());
    println!("  http_port:   {}", prefs.http_port);
    println!("  https_port:  {}", prefs.https_port);
    println!("  active port: {}", prefs.active_port());
    println!(
        "registration ({}): {}",
        conf.display(),
        if config.is_registered() {
            "registered"
        } else {
            "unregistered"
        }
    );
    Ok(())
}
