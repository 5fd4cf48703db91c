use crate::robots::parser::{matches_pattern, parse_robots_txt, RobotsRule};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// robots.txt compliance filter with a per-domain rule cache
///
/// One GET of `/robots.txt` per domain per run; a non-200 response or a
/// transport error yields an empty rule set (everything allowed) which is
/// cached all the same so the domain is never refetched.
pub struct RobotsFilter {
    client: Client,
    user_agent: String,
    ignore_robots: bool,
    cache: Mutex<HashMap<String, Vec<RobotsRule>>>,
}

impl RobotsFilter {
    /// Creates a filter using the given HTTP client and user-agent string
    pub fn new(client: Client, user_agent: &str, ignore_robots: bool) -> Self {
        Self {
            client,
            user_agent: user_agent.to_lowercase(),
            ignore_robots,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether a URL may be fetched, per the base URL's robots.txt
    pub async fn is_allowed(&self, url: &str, base_url: &str) -> bool {
        if self.ignore_robots {
            return true;
        }

        let rules = self.rules_for(base_url).await;
        if rules.is_empty() {
            return true;
        }

        let path = match Url::parse(url) {
            Ok(parsed) => {
                let mut path = parsed.path().to_string();
                if path.is_empty() {
                    path.push('/');
                }
                if let Some(query) = parsed.query() {
                    path.push('?');
                    path.push_str(query);
                }
                path
            }
            Err(_) => return true,
        };

        match evaluate(&rules, &self.user_agent, &path) {
            Decision::Allowed(reason) => {
                tracing::trace!("{} allowed: {}", url, reason);
                true
            }
            Decision::Disallowed(pattern) => {
                tracing::info!("Skipping {}: disallowed by pattern {}", url, pattern);
                false
            }
        }
    }

    /// Returns the crawl-delay hint for the base URL's domain, if any
    pub async fn crawl_delay(&self, base_url: &str) -> Option<f64> {
        if self.ignore_robots {
            return None;
        }

        let rules = self.rules_for(base_url).await;
        rules
            .iter()
            .filter(|rule| {
                rule.user_agent == "*"
                    || self.user_agent.contains(&rule.user_agent)
                    || rule.user_agent.contains(&self.user_agent)
            })
            .find_map(|rule| rule.crawl_delay)
    }

    /// Number of domains whose robots.txt has been fetched (or attempted)
    pub fn domains_fetched(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    /// Gets the cached rules for a domain, fetching robots.txt on first use
    async fn rules_for(&self, base_url: &str) -> Vec<RobotsRule> {
        let origin = match domain_key(base_url) {
            Some(origin) => origin,
            None => return Vec::new(),
        };

        if let Some(rules) = self.cache.lock().unwrap().get(&origin) {
            return rules.clone();
        }

        let rules = self.fetch_rules(&origin).await;
        self.cache
            .lock()
            .unwrap()
            .entry(origin)
            .or_insert_with(|| rules.clone());
        rules
    }

    async fn fetch_rules(&self, origin: &str) -> Vec<RobotsRule> {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().as_u16() == 200 => match response.text().await {
                Ok(body) => {
                    let rules = parse_robots_txt(&body);
                    tracing::info!("Found robots.txt at {} ({} groups)", robots_url, rules.len());
                    rules
                }
                Err(e) => {
                    tracing::debug!("Failed to read robots.txt body from {}: {}", robots_url, e);
                    Vec::new()
                }
            },
            Ok(response) => {
                tracing::debug!(
                    "No robots.txt at {} (status: {})",
                    robots_url,
                    response.status()
                );
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", robots_url, e);
                Vec::new()
            }
        }
    }
}

enum Decision {
    Allowed(&'static str),
    Disallowed(String),
}

/// Applies the rule groups to a path for the given (lowercased) user-agent
///
/// Groups with an exact or partial agent match rank ahead of wildcard
/// groups. Within each group, in order, an `Allow` match wins over a
/// `Disallow` match. Absence of any applicable rule means allowed.
fn evaluate(rules: &[RobotsRule], user_agent: &str, path: &str) -> Decision {
    let mut applicable: Vec<&RobotsRule> = Vec::new();
    for rule in rules {
        if rule.user_agent == "*" {
            applicable.push(rule);
        } else if user_agent.contains(&rule.user_agent) || rule.user_agent.contains(user_agent) {
            applicable.insert(0, rule);
        }
    }

    if applicable.is_empty() {
        return Decision::Allowed("no applicable rules");
    }

    for rule in applicable {
        for allow in &rule.allow_paths {
            if matches_pattern(path, allow) {
                return Decision::Allowed("allow pattern");
            }
        }
        for disallow in &rule.disallow_paths {
            if !disallow.is_empty() && matches_pattern(path, disallow) {
                return Decision::Disallowed(disallow.clone());
            }
        }
    }

    Decision::Allowed("no matching disallow rules")
}

/// `scheme://host[:port]` cache key for a URL
fn domain_key(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::parser::parse_robots_txt;

    fn allowed(rules: &[RobotsRule], agent: &str, path: &str) -> bool {
        matches!(evaluate(rules, agent, path), Decision::Allowed(_))
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let rules = parse_robots_txt("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(allowed(&rules, "linkscope", "/private/public/page"));
        assert!(!allowed(&rules, "linkscope", "/private/secret"));
    }

    #[test]
    fn test_no_applicable_rules_allowed() {
        let rules = parse_robots_txt("User-agent: otherbot\nDisallow: /");
        assert!(allowed(&rules, "linkscope", "/anything"));
    }

    #[test]
    fn test_specific_agent_ranked_before_wildcard() {
        let rules = parse_robots_txt(
            "User-agent: *\nDisallow: /\n\nUser-agent: linkscope\nAllow: /",
        );
        assert!(allowed(&rules, "linkscope/1.0", "/page"));
        assert!(!allowed(&rules, "somebot", "/page"));
    }

    #[test]
    fn test_partial_agent_match_both_directions() {
        let rules = parse_robots_txt("User-agent: linkscope\nDisallow: /x");
        // Configured agent contains the rule token
        assert!(!allowed(&rules, "linkscope/1.0", "/x"));
        // Rule token contains the configured agent
        let rules = parse_robots_txt("User-agent: linkscope-audit\nDisallow: /x");
        assert!(!allowed(&rules, "linkscope", "/x"));
    }

    #[test]
    fn test_empty_disallow_ignored() {
        let rules = parse_robots_txt("User-agent: *\nDisallow:");
        assert!(allowed(&rules, "linkscope", "/page"));
    }

    #[test]
    fn test_disallow_root_blocks_all() {
        let rules = parse_robots_txt("User-agent: *\nDisallow: /");
        assert!(!allowed(&rules, "linkscope", "/"));
        assert!(!allowed(&rules, "linkscope", "/deep/page"));
    }

    #[test]
    fn test_domain_key() {
        assert_eq!(
            domain_key("https://example.com/a/b"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            domain_key("http://127.0.0.1:4545/x"),
            Some("http://127.0.0.1:4545".to_string())
        );
        assert_eq!(domain_key("not a url"), None);
    }
}
