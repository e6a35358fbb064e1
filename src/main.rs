use anyhow::Context;
use clap::Parser;
use recycle_finder::app::{render, render_materials};
use recycle_finder::core::Storage;
use recycle_finder::utils::error::{ErrorSeverity, FinderError};
use recycle_finder::utils::logger;
use recycle_finder::{CliConfig, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}: {}", e.recovery_suggestion(), e);
            std::process::exit(1);
        }
    };

    if settings.json_logs {
        logger::init_json_logger(cli.verbose, settings.log_level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, settings.log_level.as_deref());
    }

    tracing::info!("Starting recycle-finder");
    tracing::debug!("Effective settings: {:?}", settings);

    let query = match cli.query() {
        Ok(query) => query,
        Err(e) => fail(e),
    };

    let engine = match settings.build_engine() {
        Ok(engine) => engine,
        Err(e) => fail(e),
    };

    let output = if cli.list_materials {
        match engine.all_materials().await {
            Ok(materials) => render_materials(&materials),
            Err(e) => fail(e),
        }
    } else {
        let recommendation = match engine.recommend(&query).await {
            Ok(recommendation) => recommendation,
            Err(e) => fail(e),
        };
        tracing::info!(
            "✅ {} center(s) matched, {} with recommendations",
            recommendation.count(),
            recommendation.conclusions.len()
        );
        match render(&recommendation, cli.format) {
            Ok(text) => text,
            Err(e) => fail(e),
        }
    };

    match &cli.output {
        Some(path) => {
            LocalStorage::new(".")
                .write_file(path, output.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", path))?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn fail(e: FinderError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
