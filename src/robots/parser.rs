//! robots.txt parsing
//!
//! Line-oriented: a `User-agent:` line starts a new rule group; `Allow:`,
//! `Disallow:` and `Crawl-delay:` lines attach to the current group. Blank
//! lines and `#` comments are ignored, as are malformed crawl-delay values.

/// One robots.txt rule group
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRule {
    /// Lowercased user-agent token this group applies to (`*` for all)
    pub user_agent: String,
    /// `Allow:` patterns, in file order
    pub allow_paths: Vec<String>,
    /// `Disallow:` patterns, in file order
    pub disallow_paths: Vec<String>,
    /// `Crawl-delay:` in seconds, if present and well-formed
    pub crawl_delay: Option<f64>,
}

impl RobotsRule {
    fn new(user_agent: String) -> Self {
        Self {
            user_agent,
            allow_paths: Vec::new(),
            disallow_paths: Vec::new(),
            crawl_delay: None,
        }
    }
}

/// Parses robots.txt content into an ordered list of rule groups
pub fn parse_robots_txt(content: &str) -> Vec<RobotsRule> {
    let mut rules: Vec<RobotsRule> = Vec::new();
    let mut current: Option<RobotsRule> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (directive, value) = match line.split_once(':') {
            Some((d, v)) => (d.trim().to_lowercase(), v.trim()),
            None => continue,
        };

        match directive.as_str() {
            "user-agent" => {
                if let Some(rule) = current.take() {
                    rules.push(rule);
                }
                current = Some(RobotsRule::new(value.to_lowercase()));
            }
            "allow" => {
                if let Some(rule) = current.as_mut() {
                    rule.allow_paths.push(value.to_string());
                }
            }
            "disallow" => {
                if let Some(rule) = current.as_mut() {
                    rule.disallow_paths.push(value.to_string());
                }
            }
            "crawl-delay" => {
                if let Some(rule) = current.as_mut() {
                    // Malformed values are ignored, not fatal
                    if let Ok(delay) = value.parse::<f64>() {
                        rule.crawl_delay = Some(delay);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(rule) = current {
        rules.push(rule);
    }

    rules
}

/// Checks whether a URL path matches a robots.txt pattern
///
/// `*` matches any run of characters and a trailing `$` anchors the match
/// to the end of the path; everything else is a prefix match. The pattern
/// `/` matches every path.
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    if pattern == "/" {
        return true;
    }

    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    if !pattern.contains('*') {
        return if anchored {
            path == pattern
        } else {
            path.starts_with(pattern)
        };
    }

    let parts: Vec<&str> = pattern.split('*').collect();

    // First literal must be a prefix
    let first = parts[0];
    if !path.starts_with(first) {
        return false;
    }
    let mut rest = &path[first.len()..];

    // For an anchored pattern the final literal must sit at the end;
    // reserve it before greedily matching the middle literals.
    let last = parts[parts.len() - 1];
    let middle: &[&str] = if anchored && !last.is_empty() {
        if !rest.ends_with(last) || rest.len() < last.len() {
            return false;
        }
        rest = &rest[..rest.len() - last.len()];
        &parts[1..parts.len() - 1]
    } else {
        &parts[1..]
    };

    for part in middle {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }

    true
}
