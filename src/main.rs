use clap::Parser;
use site_ledger::tool;
use site_ledger::{Analyzer, AnalyzerConfig};
use tokio_util::sync::CancellationToken;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);

    ::log::info!("Starting analysis of {}", args.url);
    // stdout carries the report
    eprintln!("Note: crawling requires a WebDriver server (e.g., ChromeDriver).");
    eprintln!("Set WEBDRIVER_URL if it is not at {}", config.webdriver_url);

    let analyzer = Analyzer::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::info!("Interrupted; finishing the current page");
            on_signal.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let report = tool::crawl_and_analyze_website_with_cancel(&analyzer, &args.url, &cancel).await;
    ::log::info!(
        "Finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match &args.output {
        Some(path) => {
            std::fs::write(path, &report)?;
            ::log::info!("Report written to {}", path.display());
        }
        None => println!("{report}"),
    }
    Ok(())
}
