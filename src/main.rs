use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use adgm_register::batch::{self, BatchContext, CancelToken, CompletionStatus};
use adgm_register::cli::Args;
use adgm_register::config::AppConfig;
use adgm_register::notify::Notifier;
use adgm_register::transport::Transport;

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "adgm_register=info",
        1 => "adgm_register=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("Created default configuration file at {}", path.display());
                return;
            }
            Err(e) => {
                eprintln!("Failed to create configuration file: {e}");
                process::exit(1);
            }
        }
    }

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    let input = args
        .input
        .as_deref()
        .expect("clap requires --input unless --init is given");
    let companies = match batch::read_company_file(input) {
        Ok(companies) => companies,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };
    if companies.is_empty() {
        eprintln!("No company names found in {}", input.display());
        process::exit(1);
    }

    let transport = match Transport::new(&config.http) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };
    let notifier = match Notifier::new(config.notify.ntfy_url.clone()) {
        Ok(notifier) => notifier,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("\nCtrl+C pressed. Shutting down gracefully...");
            cancel.cancel();
        }) {
            eprintln!(
                "Warning: failed to set Ctrl+C handler: {e}. \
                 Interrupts will not save partial results."
            );
        }
    }

    let ctx = BatchContext {
        transport,
        notifier,
        base_url: config.register.base_url.clone(),
        parallel_jobs: args.parallel_jobs,
        cancel,
    };

    match batch::execute(&companies, &ctx, &args.output).await {
        Ok(CompletionStatus::Completed) => {}
        // 128 + SIGINT(2), the conventional exit code for Ctrl+C.
        Ok(_) => process::exit(130),
        Err(e) => {
            error!("batch failed: {e:#}");
            process::exit(1);
        }
    }
}
