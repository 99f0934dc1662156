use clap::Parser;
use serde::Serialize;
use std::fs::File;
use surf_page::{Browser, BrowserConfig, Link};

mod args;
use args::Args;

/// What gets printed with `--json`
#[derive(Debug, Serialize)]
struct Summary {
    url: String,
    status: u16,
    title: String,
    history: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<Link>>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args).await {
        ::log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> surf_page::Result<()> {
    let mut config = match &args.config {
        Some(path) => BrowserConfig::from_file(path)?,
        None => BrowserConfig::new(),
    };
    config.attributes.extend(args.attributes());
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = user_agent.clone();
    }

    let browser = Browser::builder().with_config(config).build()?;

    ::log::info!("Opening {}", args.url);
    browser.open(&args.url).await?;
    for expr in &args.clicks {
        ::log::info!("Clicking '{}'", expr);
        browser.click(expr).await?;
    }

    if let Some(path) = &args.download {
        let mut file = File::create(path)?;
        let written = browser.download(&mut file).await?;
        ::log::info!("Wrote {} bytes to {}", written, path.display());
    }

    let matches = match &args.find {
        Some(expr) => Some(
            browser
                .find(expr)
                .await?
                .iter()
                .map(|e| e.text().trim().to_string())
                .collect::<Vec<_>>(),
        ),
        None => None,
    };
    let links = if args.links {
        Some(browser.links().await?)
    } else {
        None
    };

    let summary = Summary {
        url: browser.url().await?.to_string(),
        status: browser.status_code().await?,
        title: browser.title().await?,
        history: browser.history_len().await,
        matches,
        links,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", summary.status, summary.url);
    println!("{}", summary.title.trim());
    for text in summary.matches.iter().flatten() {
        println!("{}", text);
    }
    for link in summary.links.iter().flatten() {
        println!("{}\t{}", link.href, link.text.trim());
    }
    Ok(())
}
