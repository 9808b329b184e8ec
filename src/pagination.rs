//! Page slicing for post listings.
//!
//! Out-of-range requests never fail: a missing or non-numeric page number
//! resolves to the first page, anything outside `1..=num_pages` to the last.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Never zero: an empty listing still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolve the raw `?page=` value to a valid 1-based page number.
    pub fn page_number(&self, requested: Option<&str>) -> usize {
        let Some(raw) = requested.map(str::trim).filter(|raw| is_integer(raw)) else {
            return 1;
        };
        let last = self.num_pages();
        // Integers too large for i64 are still past the last page.
        match raw.parse::<i64>() {
            Ok(number) if number >= 1 && number as u64 <= last as u64 => number as usize,
            _ => last,
        }
    }

    /// `(offset, limit)` of a resolved page number.
    pub fn bounds(&self, number: usize) -> (usize, usize) {
        let offset = (number.max(1) - 1) * self.per_page;
        let limit = self.per_page.min(self.total.saturating_sub(offset));
        (offset, limit)
    }

    pub fn page<T>(&self, number: usize, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.num_pages)
            .map(|number| PageLink {
                number,
                current: number == self.number,
            })
            .collect()
    }
}

/// Digits with an optional leading sign.
fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// In-memory form of the same contract the SQL listings use.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, requested: Option<&str>) -> Page<T> {
    let paginator = Paginator::new(items.len(), page_size);
    let number = paginator.page_number(requested);
    let (offset, limit) = paginator.bounds(number);
    paginator.page(number, items[offset..offset + limit].to_vec())
}
