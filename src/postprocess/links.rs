use std::collections::HashSet;

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use super::{DAY_MARKER_RE, is_stopword, markdown_links, unlink};
use crate::search::{LinkFinder, get_activity_link};

/// Rough activity name of an itinerary line: text before the first `:`
fn activity_name(line: &str) -> &str {
    line.split(':')
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '•' | '*' | '_'))
}

fn needs_link(line: &str) -> bool {
    !line.trim().is_empty() && (!line.contains("http") || line.contains("No link found"))
}

/// Append a looked-up link to every line the model left without one
pub async fn correct_links(text: &str, destination: &str, finder: &dyn LinkFinder) -> String {
    if destination.trim().is_empty() {
        return text.to_string();
    }

    let mut lines = Vec::new();
    for line in text.split('\n') {
        let name = activity_name(line);
        let is_label = name.split_whitespace().all(is_stopword) || DAY_MARKER_RE.is_match(line);
        if needs_link(line) && !name.is_empty() && !is_label {
            if let Some(link) = get_activity_link(finder, name, destination).await {
                debug!("Linked '{}' to {}", name, link);
                lines.push(format!("{line} (<{link}>)"));
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines.join("\n")
}

async fn is_dead(client: &Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(response) => matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE),
        Err(e) => {
            debug!("Link check failed for {}: {}", url, e);
            true
        }
    }
}

/// HEAD-check every markdown link and unlink the ones that are gone.
/// Sites that refuse HEAD or block bots (403, 405, 429) count as alive.
pub async fn prune_dead_links(text: &str, client: &Client) -> String {
    let urls = markdown_links(text);
    if urls.is_empty() {
        return text.to_string();
    }

    let checks = join_all(urls.iter().map(|url| is_dead(client, url))).await;
    let dead: HashSet<String> = urls
        .into_iter()
        .zip(checks)
        .filter_map(|(url, dead)| dead.then_some(url))
        .collect();

    if !dead.is_empty() {
        info!("Unlinking {} dead links", dead.len());
    }
    unlink(text, &dead)
}
