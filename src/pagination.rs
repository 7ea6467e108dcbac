//! Page-number pagination over an already filtered, ordered result set.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 9;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, max_page_size: MAX_PAGE_SIZE }
    }
}

impl PaginationConfig {
    /// Enforce `1 <= page_size <= max_page_size`.
    pub fn normalized(self) -> Self {
        let max_page_size = self.max_page_size.max(1);
        let page_size = self.page_size.clamp(1, max_page_size);
        Self { page_size, max_page_size }
    }

    /// Requested size, clamped to the cap. Missing, non-numeric or zero falls back to the default.
    pub fn effective_page_size(&self, raw: Option<&str>) -> usize {
        match raw.and_then(|s| s.trim().parse::<usize>().ok()) {
            Some(n) if n > 0 => n.min(self.max_page_size),
            _ => self.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

/// Slice `items` into the requested page.
///
/// # Errors
///
/// `NotFound("invalid page")` for a page that is not a positive integer or
/// `"last"`, or that lies past the end.
pub fn paginate<T>(
    items: Vec<T>,
    cfg: &PaginationConfig,
    page: Option<&str>,
    page_size: Option<&str>,
) -> Result<Page<T>, ApiError> {
    let size = cfg.effective_page_size(page_size);
    let count = items.len();
    let pages = count.div_ceil(size).max(1);

    let number = match page.map(str::trim) {
        None | Some("") => 1,
        Some("last") => pages,
        Some(raw) => raw.parse::<usize>().ok().filter(|n| *n >= 1).ok_or_else(invalid_page)?,
    };
    if number > pages {
        return Err(invalid_page());
    }

    let results: Vec<T> = items.into_iter().skip((number - 1) * size).take(size).collect();
    Ok(Page {
        count,
        page: number,
        page_size: size,
        next: (number < pages).then_some(number + 1),
        previous: (number > 1).then(|| number - 1),
        results,
    })
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("invalid page".into())
}
