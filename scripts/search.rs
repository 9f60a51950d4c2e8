//! Twitter Search Script
//!
//! Runs one search from the command line and prints the matching statuses.
//! Tokens given as arguments are interpreted like the query builder does:
//! `@user` mentions, `#tag` hashtags, `from:user` / `to:user` filters, anything
//! else is a plain word. Without arguments the query is read from stdin.
//! Pass `--trends` to print the trending topics instead.
//!
//! Configuration comes from the `SEARCH_*` environment variables; set
//! `RUST_LOG=debug` to see request details.

use std::io::{self, Write};

use tweetsearch::{SearchClient, SearchQuery};

/// Builds a query from whitespace-separated tokens.
fn build_query(input: &[String]) -> SearchQuery {
    input
        .iter()
        .flat_map(|arg| arg.split_whitespace())
        .fold(SearchQuery::new(), |query, token| {
            if let Some(user) = token.strip_prefix("from:") {
                query.from_user(user)
            } else if let Some(user) = token.strip_prefix("to:") {
                query.to_user(user)
            } else if token.starts_with('@') && token.len() > 1 {
                query.about(token)
            } else if token.starts_with('#') && token.len() > 1 {
                query.with(token)
            } else {
                query.contains(token)
            }
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("🐦 Twitter Search Tool");
    println!("======================");

    let mut client = SearchClient::from_env()?;
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--trends") {
        println!("📈 Fetching trends...");
        let trends = client.trends().await?;
        println!("{}", serde_json::to_string_pretty(&trends)?);
        return Ok(());
    }

    if args.is_empty() {
        print!("🔎 Enter your search: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        args.push(line.trim().to_string());
    }

    let mut query = build_query(&args);
    if query.text().is_empty() {
        println!("❌ Search cannot be empty!");
        return Err("Search text is required".into());
    }

    println!("🚀 Searching for: {}", query.text());
    match client.results(&mut query).await {
        Ok(statuses) => {
            println!("✅ {} results\n", statuses.len());
            for status in statuses {
                println!(
                    "@{}: {}",
                    status.from_user.as_deref().unwrap_or("unknown"),
                    status.text.as_deref().unwrap_or("")
                );
            }
            if let Some(info) = client.last_response() {
                println!("\n⏱️  {} in {:?}", info.status, info.elapsed);
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ Search failed: {}", e);
            Err(e.into())
        }
    }
}
