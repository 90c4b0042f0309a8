use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use sitelens::model::{BrandExtractionResult, CrawlRun, ExtractionResult};
use sitelens::{run_extraction, ExtractionConfig, LegacyBridge, LegacySchema};

#[derive(Parser)]
#[command(name = "sitelens", about = "Design token and site architecture extraction from crawl samples")]
struct Cli {
    /// Config file (TOML or JSON); SITELENS_* env vars override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a crawl run into design and brand results
    Extract {
        /// Crawl run JSON from the collector
        input: PathBuf,
        /// Directory for design.json and brand.json
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },
    /// Convert a result to the legacy schema
    Legacy {
        /// design.json or brand.json written by `extract`
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "design")]
        from: Artifact,
        #[arg(short, long, default_value = "v1")]
        schema: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show sample counts per page and kind
    Stats {
        /// Crawl run JSON from the collector
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Artifact {
    Design,
    Brand,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { input, out } => {
            let cfg = ExtractionConfig::load(cli.config.as_deref())
                .context("failed to load configuration")?;
            let run = read_run(&input)?;
            let extraction = run_extraction(&run, &cfg);

            fs::create_dir_all(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            write_json(&out.join("design.json"), &extraction.design)?;
            write_json(&out.join("brand.json"), &extraction.brand)?;

            let design = &extraction.design;
            println!(
                "{} pages ({} failed, {} samples rejected)",
                design.metadata.pages_crawled,
                design.metadata.pages_failed,
                design.metadata.samples_rejected
            );
            println!(
                "Quality: {}",
                design
                    .quality
                    .overall
                    .map(|q| format!("{:.2}", q))
                    .unwrap_or_else(|| "-".into())
            );
            println!("Patterns: {}", design.patterns.patterns.len());
            println!(
                "Diagnostics: {}",
                design.diagnostics.len() + extraction.brand.diagnostics.len()
            );
            Ok(())
        }
        Commands::Legacy {
            input,
            from,
            schema,
            out,
        } => {
            let schema: LegacySchema = schema.parse()?;
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let converted = match from {
                Artifact::Design => {
                    let design: ExtractionResult = serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not a design result", input.display()))?;
                    let conversion = design.tokens.to_legacy(schema);
                    report_losses("tokens", &conversion.dropped, &conversion.defaulted);
                    serde_json::to_value(&conversion)?
                }
                Artifact::Brand => {
                    let brand: BrandExtractionResult = serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not a brand result", input.display()))?;
                    let profile = brand.brand.to_legacy(schema);
                    let content = brand.content.to_legacy(schema);
                    report_losses("brand", &profile.dropped, &profile.defaulted);
                    report_losses("content", &content.dropped, &content.defaulted);
                    serde_json::json!({ "brand": profile, "content": content })
                }
            };
            match out {
                Some(path) => write_json(&path, &converted)?,
                None => println!("{}", serde_json::to_string_pretty(&converted)?),
            }
            Ok(())
        }
        Commands::Stats { input } => {
            let run = read_run(&input)?;
            let mut totals: BTreeMap<&str, usize> = BTreeMap::new();

            println!("{:<48} | {:>7} | {}", "Page", "Samples", "Status");
            println!("{}", "-".repeat(72));
            for page in &run.pages {
                let status = page.fault.as_deref().unwrap_or("ok");
                println!(
                    "{:<48} | {:>7} | {}",
                    truncate(&page.url, 48),
                    page.samples.len(),
                    status
                );
                for s in &page.samples {
                    *totals.entry(s.observation.kind_name()).or_default() += 1;
                }
            }

            println!("\n--- Kinds ---");
            for (kind, count) in &totals {
                println!("  {:<14} {}", kind, count);
            }
            println!("\n{} pages | {} samples", run.pages.len(), totals.values().sum::<usize>());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_run(path: &Path) -> anyhow::Result<CrawlRun> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let run: CrawlRun = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a crawl run", path.display()))?;
    info!(pages = run.pages.len(), root = %run.root_url, "loaded crawl run");
    Ok(run)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn report_losses(scope: &str, dropped: &[String], defaulted: &[String]) {
    if !dropped.is_empty() {
        eprintln!("{scope}: dropped {}", dropped.join(", "));
    }
    if !defaulted.is_empty() {
        eprintln!("{scope}: defaulted {}", defaulted.join(", "));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
