//! Link status records and terminal outcome classification

use serde::Serialize;

/// Result of verifying a single link
///
/// Created once per unique URL per run and cached. `redirect_chain` holds
/// one `(status, url)` entry per hop and is non-empty unless the very first
/// fetch failed before producing any record; `final_url` is always the URL
/// of the last chain entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatus {
    pub url: String,
    /// Status of the last hop (0 for transport failures)
    pub status_code: u16,
    /// True iff the chain has more than one hop
    pub is_redirect: bool,
    pub redirect_chain: Vec<(u16, String)>,
    pub final_url: String,
    /// A URL in the chain was revisited
    pub is_loop: bool,
    /// Single redirect differing only by trailing slash, case, or scheme
    pub is_canonical_redirect: bool,
    /// Transport or rate-limit error description (empty when none)
    pub error: String,
    /// Transient-error retries spent across the whole chain
    pub retries: u32,
}

impl LinkStatus {
    /// Renders the chain as `"301:url1 → 302:url2 → 200:url3"`
    pub fn redirect_chain_formatted(&self) -> String {
        self.redirect_chain
            .iter()
            .map(|(status, url)| format!("{}:{}", status, url))
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// Classifies the terminal outcome of this link
    pub fn outcome(&self) -> Outcome {
        if self.status_code == 0 {
            return Outcome::Error;
        }
        if self.is_loop {
            return Outcome::RedirectLoop;
        }
        if self.status_code >= 400 {
            return Outcome::Broken;
        }
        if self.is_redirect {
            if self.is_canonical_redirect {
                Outcome::CanonicalRedirect
            } else if self.redirect_chain.len() > 2 {
                Outcome::RedirectChain
            } else {
                Outcome::Redirect
            }
        } else {
            Outcome::Ok
        }
    }
}

/// Terminal classification of a verified link
///
/// `Error` means the status could not be determined (transport failure);
/// `Broken` means a status was determined and it is bad. Reporting layers
/// rely on that distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Redirect,
    CanonicalRedirect,
    RedirectChain,
    RedirectLoop,
    Broken,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::Ok => "ok",
            Outcome::Redirect => "redirect",
            Outcome::CanonicalRedirect => "canonical redirect",
            Outcome::RedirectChain => "redirect chain",
            Outcome::RedirectLoop => "redirect loop",
            Outcome::Broken => "broken",
            Outcome::Error => "error",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_status() -> LinkStatus {
        LinkStatus {
            url: "https://example.com/".to_string(),
            status_code: 200,
            is_redirect: false,
            redirect_chain: vec![(200, "https://example.com/".to_string())],
            final_url: "https://example.com/".to_string(),
            is_loop: false,
            is_canonical_redirect: false,
            error: String::new(),
            retries: 0,
        }
    }

    #[test]
    fn test_chain_formatted() {
        let status = LinkStatus {
            redirect_chain: vec![
                (301, "http://a.com/".to_string()),
                (200, "https://a.com/".to_string()),
            ],
            ..base_status()
        };
        assert_eq!(
            status.redirect_chain_formatted(),
            "301:http://a.com/ → 200:https://a.com/"
        );
    }

    #[test]
    fn test_outcome_ok() {
        assert_eq!(base_status().outcome(), Outcome::Ok);
    }

    #[test]
    fn test_outcome_error_when_no_status() {
        let status = LinkStatus {
            status_code: 0,
            error: "connection failed".to_string(),
            ..base_status()
        };
        assert_eq!(status.outcome(), Outcome::Error);
    }

    #[test]
    fn test_outcome_broken() {
        let status = LinkStatus {
            status_code: 404,
            ..base_status()
        };
        assert_eq!(status.outcome(), Outcome::Broken);
    }

    #[test]
    fn test_outcome_loop_beats_broken() {
        let status = LinkStatus {
            status_code: 301,
            is_redirect: true,
            is_loop: true,
            ..base_status()
        };
        assert_eq!(status.outcome(), Outcome::RedirectLoop);
    }

    #[test]
    fn test_outcome_redirect_variants() {
        let two_hops = LinkStatus {
            is_redirect: true,
            redirect_chain: vec![
                (301, "http://a.com/x".to_string()),
                (200, "http://a.com/y".to_string()),
            ],
            ..base_status()
        };
        assert_eq!(two_hops.outcome(), Outcome::Redirect);

        let canonical = LinkStatus {
            is_canonical_redirect: true,
            ..two_hops.clone()
        };
        assert_eq!(canonical.outcome(), Outcome::CanonicalRedirect);

        let mut long = two_hops;
        long.redirect_chain
            .push((200, "http://a.com/z".to_string()));
        assert_eq!(long.outcome(), Outcome::RedirectChain);
    }
}
