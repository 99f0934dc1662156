use clap::Parser;
use std::path::PathBuf;
use surf_page::{Attribute, AttributeMap};

#[derive(Parser, Debug)]
#[command(name = "surf-page")]
#[command(about = "Open a page, follow links and inspect what comes back")]
#[command(version)]
pub struct Args {
    /// Absolute URL to open
    pub url: String,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSS selector of a link to click after opening (repeatable, applied in order)
    #[arg(long = "click", value_name = "EXPR")]
    pub clicks: Vec<String>,

    /// Do not send the Referer header
    #[arg(long)]
    pub no_referer: bool,

    /// Do not follow redirects
    #[arg(long)]
    pub no_redirects: bool,

    /// Ignore meta refresh tags
    #[arg(long)]
    pub no_meta_refresh: bool,

    /// User-Agent header value
    #[arg(short, long)]
    pub user_agent: Option<String>,

    /// Print the text of every element matching the CSS selector
    #[arg(short, long, value_name = "EXPR")]
    pub find: Option<String>,

    /// Print every link on the final page
    #[arg(short, long)]
    pub links: bool,

    /// Print a JSON summary instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Write the final page markup to FILE
    #[arg(short, long, value_name = "FILE")]
    pub download: Option<PathBuf>,
}

impl Args {
    /// Attribute overrides requested on the command line
    pub fn attributes(&self) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        if self.no_referer {
            attributes.insert(Attribute::SendReferer, false);
        }
        if self.no_redirects {
            attributes.insert(Attribute::FollowRedirects, false);
        }
        if self.no_meta_refresh {
            attributes.insert(Attribute::MetaRefreshHandling, false);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "surf-page",
            "http://example.com/",
            "--click",
            "a.next",
            "--click",
            "#more",
            "--no-redirects",
            "--json",
        ]);
        assert_eq!(args.url, "http://example.com/");
        assert_eq!(args.clicks, vec!["a.next", "#more"]);
        assert!(args.json);

        let attributes = args.attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get(&Attribute::FollowRedirects), Some(&false));
    }
}
