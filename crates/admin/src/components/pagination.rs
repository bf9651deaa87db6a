//! Pager links for paginated listings.

/// Previous/next links for a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub count: u64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pagination {
    /// Build links for `path`, keeping the non-empty `filters` in the query.
    #[must_use]
    pub fn new(
        path: &str,
        page: u32,
        count: u64,
        has_previous: bool,
        has_next: bool,
        filters: &[(&str, Option<&str>)],
    ) -> Self {
        let page = page.max(1);
        let href = |target: u32| {
            let mut query: Vec<String> = filters
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .filter(|v| !v.is_empty())
                        .map(|v| format!("{key}={}", urlencoding::encode(v)))
                })
                .collect();
            query.push(format!("page={target}"));
            format!("{path}?{}", query.join("&"))
        };

        Self {
            page,
            count,
            prev_href: (has_previous && page > 1).then(|| href(page - 1)),
            next_href: has_next.then(|| href(page + 1)),
        }
    }

    /// Whether there is more than one page.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.prev_href.is_some() || self.next_href.is_some()
    }
}
