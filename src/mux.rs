//! Path-pattern multiplexer.
//!
//! Two kinds of pattern:
//!
//! - `/about` matches the path `/about` and nothing else.
//! - `/static/` (trailing slash) names a subtree: it matches `/static/` and
//!   every path below it. `/` is the subtree of everything.
//!
//! An exact match always wins; otherwise the longest subtree prefix wins.
//! Exact lookups go through a [`matchit`] tree holding only static routes;
//! subtree patterns are additionally kept in a list sorted longest-first.
//!
//! Patterns map to slots in `chains`, so re-registering a pattern swaps the
//! slot's chain and both indexes stay valid.

use matchit::Router as MatchitRouter;

use crate::handler::Chain;

/// Outcome of resolving a request path.
pub(crate) enum Resolved<'a> {
    Chain(&'a Chain),
    Redirect(String),
    NotFound,
    /// The path does not decode to UTF-8.
    BadRequest,
}

pub(crate) struct Mux {
    exact: MatchitRouter<usize>,
    subtrees: Vec<(String, usize)>,
    chains: Vec<Chain>,
}

impl Mux {
    pub(crate) fn new() -> Self {
        Self { exact: MatchitRouter::new(), subtrees: Vec::new(), chains: Vec::new() }
    }

    /// Stores `chain` under `pattern`. Returns `true` if an earlier
    /// registration was replaced.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` does not start with `/`.
    pub(crate) fn insert(&mut self, pattern: &str, chain: Chain) -> bool {
        if !pattern.starts_with('/') {
            panic!("invalid route `{pattern}`: patterns must start with `/`");
        }

        if let Some(slot) = self.slot(pattern) {
            self.chains[slot] = chain;
            return true;
        }

        let slot = self.chains.len();
        self.exact
            .insert(escape(pattern), slot)
            .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));
        self.chains.push(chain);

        if pattern.ends_with('/') {
            let at = self.subtrees.partition_point(|(p, _)| p.len() >= pattern.len());
            self.subtrees.insert(at, (pattern.to_owned(), slot));
        }
        false
    }

    /// Resolves a request target to a chain, a redirect, or nothing.
    ///
    /// Matching and cleaning work on the percent-decoded path; redirect
    /// locations are re-encoded. `query` is carried over to any redirect.
    /// `clean` is false for `CONNECT`, whose target is not a path to
    /// normalise.
    pub(crate) fn resolve(&self, raw_path: &str, query: Option<&str>, clean: bool) -> Resolved<'_> {
        let Ok(path) = urlencoding::decode(raw_path) else {
            return Resolved::BadRequest;
        };
        let cleaned = if clean { clean_path(&path) } else { path.to_string() };

        if self.redirects_to_slash(&cleaned) {
            return Resolved::Redirect(with_query(encode_path(&format!("{cleaned}/")), query));
        }
        if cleaned != path {
            return Resolved::Redirect(with_query(encode_path(&cleaned), query));
        }

        match self.lookup(&path) {
            Some(chain) => Resolved::Chain(chain),
            None => Resolved::NotFound,
        }
    }

    fn lookup(&self, path: &str) -> Option<&Chain> {
        let slot = self.slot(path).or_else(|| {
            self.subtrees
                .iter()
                .find(|(prefix, _)| path.starts_with(prefix.as_str()))
                .map(|(_, slot)| *slot)
        })?;
        Some(&self.chains[slot])
    }

    fn slot(&self, path: &str) -> Option<usize> {
        self.exact.at(path).ok().map(|matched| *matched.value)
    }

    /// True when `path` itself is unregistered but `path/` is a subtree.
    /// An empty path (authority-form `CONNECT`) never redirects.
    fn redirects_to_slash(&self, path: &str) -> bool {
        if path.is_empty() || path.ends_with('/') || self.slot(path).is_some() {
            return false;
        }
        self.slot(&format!("{path}/")).is_some()
    }
}

/// Escapes matchit's parameter syntax so every pattern is a static route.
fn escape(pattern: &str) -> String {
    pattern.replace('{', "{{").replace('}', "}}")
}

/// Percent-encodes each segment of a decoded path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn with_query(path: String, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}?{q}"),
        None => path,
    }
}

/// Canonical form of a request path: `.` and `..` segments resolved, repeated
/// slashes collapsed, a leading slash guaranteed, a trailing slash kept.
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() || path.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;

    fn chain(body: &'static str) -> Chain {
        Chain::new(move |_req: Request| async move { body })
    }

    async fn body_at(mux: &Mux, path: &str) -> Option<String> {
        let Resolved::Chain(chain) = mux.resolve(path, None, true) else {
            return None;
        };
        let req = Request::from(http::Request::get("/").body("").unwrap());
        let res = chain.call(req).await;
        Some(String::from_utf8(res.body().to_vec()).unwrap())
    }

    fn redirect_of(mux: &Mux, path: &str, query: Option<&str>) -> Option<String> {
        match mux.resolve(path, query, true) {
            Resolved::Redirect(to) => Some(to),
            _ => None,
        }
    }

    #[test]
    fn clean_path_normalises() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("//"), "/");
        assert_eq!(clean_path("/a//b"), "/a/b");
        assert_eq!(clean_path("/a/./b/"), "/a/b/");
        assert_eq!(clean_path("/a/../b"), "/b");
        assert_eq!(clean_path("/a/.."), "/");
        assert_eq!(clean_path("/../.."), "/");
        assert_eq!(clean_path("a/b"), "/a/b");
    }

    #[tokio::test]
    async fn exact_beats_subtree() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));
        mux.insert("/docs/", chain("docs tree"));
        mux.insert("/docs/index", chain("docs index"));

        assert_eq!(body_at(&mux, "/docs/index").await.as_deref(), Some("docs index"));
        assert_eq!(body_at(&mux, "/docs/other").await.as_deref(), Some("docs tree"));
        assert_eq!(body_at(&mux, "/docs/").await.as_deref(), Some("docs tree"));
        assert_eq!(body_at(&mux, "/elsewhere").await.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn longest_subtree_wins_regardless_of_order() {
        let mut mux = Mux::new();
        mux.insert("/a/b/", chain("deep"));
        mux.insert("/a/", chain("shallow"));

        assert_eq!(body_at(&mux, "/a/b/c").await.as_deref(), Some("deep"));
        assert_eq!(body_at(&mux, "/a/x").await.as_deref(), Some("shallow"));
    }

    #[tokio::test]
    async fn exact_pattern_does_not_match_children() {
        let mut mux = Mux::new();
        mux.insert("/about", chain("about"));

        assert!(body_at(&mux, "/about/team").await.is_none());
        assert!(body_at(&mux, "/abou").await.is_none());
    }

    #[tokio::test]
    async fn reinsert_replaces_slot() {
        let mut mux = Mux::new();
        assert!(!mux.insert("/x/", chain("first")));
        assert!(mux.insert("/x/", chain("second")));

        assert_eq!(body_at(&mux, "/x/").await.as_deref(), Some("second"));
        assert_eq!(body_at(&mux, "/x/y").await.as_deref(), Some("second"));
        assert_eq!(mux.subtrees.len(), 1);
    }

    #[tokio::test]
    async fn braces_are_literal() {
        let mut mux = Mux::new();
        mux.insert("/users/{id}", chain("literal"));

        assert_eq!(body_at(&mux, "/users/{id}").await.as_deref(), Some("literal"));
        assert!(body_at(&mux, "/users/42").await.is_none());
    }

    #[test]
    fn subtree_redirects_bare_path() {
        let mut mux = Mux::new();
        mux.insert("/dir/", chain("dir"));

        assert_eq!(redirect_of(&mux, "/dir", None).as_deref(), Some("/dir/"));
        assert_eq!(redirect_of(&mux, "/dir", Some("q=1")).as_deref(), Some("/dir/?q=1"));
    }

    #[test]
    fn registered_bare_path_is_not_redirected() {
        let mut mux = Mux::new();
        mux.insert("/dir/", chain("tree"));
        mux.insert("/dir", chain("bare"));

        assert!(redirect_of(&mux, "/dir", None).is_none());
    }

    #[test]
    fn unclean_paths_redirect() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));

        assert_eq!(redirect_of(&mux, "/a/../b", None).as_deref(), Some("/b"));
        assert_eq!(redirect_of(&mux, "//x", Some("k=v")).as_deref(), Some("/x?k=v"));
    }

    #[test]
    fn connect_targets_are_not_cleaned() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));

        assert!(matches!(mux.resolve("/a/../b", None, false), Resolved::Chain(_)));
    }

    #[test]
    fn connect_authority_form_is_not_redirected() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));

        assert!(matches!(mux.resolve("", None, false), Resolved::NotFound));
    }

    #[test]
    fn encoded_dot_segments_are_cleaned() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));

        assert_eq!(redirect_of(&mux, "/a/%2e%2e/b", None).as_deref(), Some("/b"));
        assert_eq!(redirect_of(&mux, "/a/%2E/b", None).as_deref(), Some("/a/b"));
    }

    #[tokio::test]
    async fn patterns_match_the_decoded_path() {
        let mut mux = Mux::new();
        mux.insert("/hello world", chain("spaced"));
        mux.insert("/dir x/", chain("tree"));

        assert_eq!(body_at(&mux, "/hello%20world").await.as_deref(), Some("spaced"));
        assert_eq!(redirect_of(&mux, "/dir%20x", None).as_deref(), Some("/dir%20x/"));
    }

    #[test]
    fn non_utf8_path_is_rejected() {
        let mut mux = Mux::new();
        mux.insert("/", chain("root"));

        assert!(matches!(mux.resolve("/%FF", None, true), Resolved::BadRequest));
    }

    #[test]
    fn empty_mux_finds_nothing() {
        let mux = Mux::new();
        assert!(matches!(mux.resolve("/", None, true), Resolved::NotFound));
    }

    #[test]
    #[should_panic(expected = "invalid route `about`")]
    fn relative_pattern_panics() {
        Mux::new().insert("about", chain("nope"));
    }
}
