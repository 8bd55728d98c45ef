//! Pagination controls for the listing UI: previous/next targets plus a
//! compact run of page links (first, last, the current page and its
//! neighbours, with gaps marked two pages out).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageLink {
    Page { number: u32, current: bool },
    Gap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationControls {
    /// `None` on the first page.
    pub previous: Option<u32>,
    /// `None` on the last page.
    pub next: Option<u32>,
    /// Empty when everything fits on one page.
    pub links: Vec<PageLink>,
}

pub fn controls(current: u32, total_pages: usize) -> PaginationControls {
    let total = u32::try_from(total_pages).unwrap_or(u32::MAX);
    if total <= 1 {
        return PaginationControls {
            previous: None,
            next: None,
            links: Vec::new(),
        };
    }

    let previous = (current > 1).then(|| current.saturating_sub(1).clamp(1, total));
    let next = (current < total).then(|| current.saturating_add(1).clamp(1, total));

    PaginationControls {
        previous,
        next,
        links: page_links(current, total),
    }
}

fn page_links(current: u32, total: u32) -> Vec<PageLink> {
    let cur = i64::from(current);
    let mut out = Vec::new();
    for page in 1..=total {
        let p = i64::from(page);
        if page == 1 || page == total || (cur - 1..=cur + 1).contains(&p) {
            out.push(PageLink::Page {
                number: page,
                current: page == current,
            });
        } else if p == cur - 2 || p == cur + 2 {
            out.push(PageLink::Gap);
        }
    }
    out
}
