use std::sync::Arc;

use axum::http::HeaderMap;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use pretty_router::cache::NoCache;
use pretty_router::request::{parse_query, Separator};
use pretty_router::routing::Registry;
use pretty_router::security::{ip_in_range, ProxyPolicy, ProxyTrustResolver};
use pretty_router::security::proxy::header_name;
use pretty_router::slug::{NoSlugs, RedirectPatterns, SlugKind, SlugMode, SlugOptions, Slugger, DEFAULT_MAX_LENGTH};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect pretty routes, slugs and client address resolution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pretty route for a query string
    Build {
        query: String,
        /// Use `&` as the only separator
        #[arg(long)]
        ampersand: bool,
    },
    /// Parse path info into parameters
    Parse {
        path: String,
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Generate a slug from a title
    Slug {
        title: String,
        #[arg(long, value_enum, default_value_t = Kind::Topic)]
        kind: Kind,
        #[arg(long, default_value_t = 1)]
        id: u64,
        #[arg(long)]
        unicode: bool,
        #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
        max_length: usize,
        #[arg(long = "stopword")]
        stopwords: Vec<String>,
    },
    /// Resolve the ban-check address from a peer and forwarding headers
    ResolveIp {
        #[arg(long)]
        remote: Option<String>,
        /// NAME=VALUE
        #[arg(long = "header")]
        headers: Vec<String>,
        /// `disabled`, `autodetect` or a header name
        #[arg(long, default_value = "autodetect")]
        policy: String,
        #[arg(long = "allow")]
        allowlist: Vec<String>,
    },
    /// Test an address against an address or CIDR range
    CheckCidr { ip: String, range: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Board,
    Topic,
    Member,
    Group,
}

impl From<Kind> for SlugKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Board => SlugKind::Board,
            Kind::Topic => SlugKind::Topic,
            Kind::Member => SlugKind::Member,
            Kind::Group => SlugKind::Group,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = Registry::with_defaults();

    let output = match cli.command {
        Commands::Build { query, ampersand } => {
            let separator = if ampersand { Separator::Ampersand } else { Separator::Semicolon };
            let params = parse_query(&query, separator);
            let (route, remaining) = registry.build_parts(params.clone(), &NoSlugs);
            json!({
                "segments": route.segments(),
                "remaining": remaining,
                "route": registry.build_route(params, &NoSlugs),
            })
        }
        Commands::Parse { path, query } => {
            let parsed = registry.parse_route(&path, parse_query(&query, Separator::Semicolon));
            json!({
                "params": parsed.params,
                "requested_slug": parsed.requested_slug,
            })
        }
        Commands::Slug { title, kind, id, unicode, max_length, stopwords } => {
            let options = SlugOptions {
                mode: if unicode { SlugMode::Unicode } else { SlugMode::Ascii },
                max_length,
                ..SlugOptions::default()
            }
            .with_stopwords(&stopwords);
            let mut slugger = Slugger::new(
                Arc::new(options),
                Arc::new(RedirectPatterns::default()),
                Arc::new(NoCache),
                "",
                ";",
            );
            let slug = slugger.slug(&title, kind.into(), id);
            json!({ "slug": slug.value, "segment": slug.segment() })
        }
        Commands::ResolveIp { remote, headers, policy, allowlist } => {
            let mut map = HeaderMap::new();
            for header in &headers {
                let Some((name, value)) = header.split_once('=') else {
                    return Err(format!("header must be NAME=VALUE: {header}").into());
                };
                let name = header_name(name)
                    .ok_or_else(|| format!("invalid header name: {name}"))?;
                map.append(name, value.trim().parse()?);
            }
            let resolver = ProxyTrustResolver::new(&ProxyPolicy::from(policy), &allowlist);
            json!(resolver.resolve(remote.as_deref(), &map))
        }
        Commands::CheckCidr { ip, range } => {
            json!({ "ip": ip, "range": range, "matches": ip_in_range(&ip, &range) })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
