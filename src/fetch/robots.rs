// src/fetch/robots.rs
// =============================================================================
// robots.txt support.
//
// RobotsRules holds the rules from one robots.txt that apply to our user
// agent. RobotsCache downloads robots.txt once per site (scheme + host +
// port) and keeps the parsed rules for the rest of the crawl.
//
// Matching follows the common interpretation:
// - the group naming our user agent wins, otherwise the "*" group
// - the longest matching pattern decides, Allow wins a tie
// - "*" matches any run of characters, a trailing "$" anchors the end
// - no robots.txt (404, network error, ...) means everything is allowed
// =============================================================================

use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use reqwest::Client;
use tokio::sync::OnceCell;
use url::Url;

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
    regex: Option<Regex>,
}

impl Rule {
    fn new(allow: bool, pattern: &str) -> Self {
        Self {
            allow,
            pattern: pattern.to_string(),
            regex: compile_pattern(pattern),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(path),
            None => path.starts_with(&self.pattern),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    rules: Vec<Rule>,
}

impl RobotsRules {
    /// Allows everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(content: &str, user_agent: &str) -> Self {
        let token = agent_token(user_agent);

        // (agents, rules) per group
        let mut groups: Vec<(Vec<String>, Vec<Rule>)> = Vec::new();
        let mut in_agent_lines = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        groups.push((Vec::new(), Vec::new()));
                        in_agent_lines = true;
                    }
                    if let Some((agents, _)) = groups.last_mut() {
                        agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    in_agent_lines = false;
                    // An empty Disallow means "allow everything"
                    if value.is_empty() {
                        continue;
                    }
                    if let Some((_, rules)) = groups.last_mut() {
                        rules.push(Rule::new(key == "allow", value));
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        let specific: Vec<Rule> = groups
            .iter()
            .filter(|(agents, _)| agents.iter().any(|a| a != "*" && *a == token))
            .flat_map(|(_, rules)| rules.iter().cloned())
            .collect();

        let rules = if specific.is_empty() {
            groups
                .iter()
                .filter(|(agents, _)| agents.iter().any(|a| a == "*"))
                .flat_map(|(_, rules)| rules.iter().cloned())
                .collect()
        } else {
            specific
        };

        Self { rules }
    }

    /// `path` is the URL path, optionally followed by `?query`.
    pub fn is_allowed(&self, path: &str) -> bool {
        if path == "/robots.txt" {
            return true;
        }

        let mut best: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches(path)) {
            best = match best {
                Some(current)
                    if current.pattern.len() > rule.pattern.len()
                        || (current.pattern.len() == rule.pattern.len() && current.allow) =>
                {
                    Some(current)
                }
                _ => Some(rule),
            };
        }

        best.map_or(true, |rule| rule.allow)
    }
}

/// Per-site robots.txt rules, fetched on first use.
pub struct RobotsCache {
    user_agent: String,
    sites: DashMap<String, Arc<OnceCell<Arc<RobotsRules>>>>,
}

impl RobotsCache {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            sites: DashMap::new(),
        }
    }

    pub async fn is_allowed(&self, client: &Client, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let origin = parsed.origin().ascii_serialization();

        // Clone the cell out so no map guard is held across the await
        let cell = self
            .sites
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let rules = cell
            .get_or_init(|| fetch_rules(client, origin, &self.user_agent))
            .await;

        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };
        rules.is_allowed(&path)
    }
}

async fn fetch_rules(client: &Client, origin: String, user_agent: &str) -> Arc<RobotsRules> {
    let robots_url = format!("{}/robots.txt", origin);

    let rules = match client.get(&robots_url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => RobotsRules::parse(&body, user_agent),
            Err(e) => {
                tracing::debug!(url = %robots_url, error = %e, "could not read robots.txt");
                RobotsRules::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(url = %robots_url, status = response.status().as_u16(), "no robots.txt");
            RobotsRules::allow_all()
        }
        Err(e) => {
            tracing::debug!(url = %robots_url, error = %e, "robots.txt fetch failed");
            RobotsRules::allow_all()
        }
    };

    Arc::new(rules)
}

// "link-mapper/0.1.0 (+https://...)" -> "link-mapper"
fn agent_token(user_agent: &str) -> String {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    if !pattern.contains('*') && !pattern.ends_with('$') {
        return None;
    }

    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let mut regex = format!("^{}", regex::escape(body).replace("\\*", ".*"));
    if anchored {
        regex.push('$');
    }

    Regex::new(&regex).ok()
}
