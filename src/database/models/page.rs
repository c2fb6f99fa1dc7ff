use serde::Serialize;

/// Validated offset pagination request (page >= 1, limit >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// One page of results plus the unpaginated total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted collection
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self { items, total }
    }
}

/// Pagination block returned alongside list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(PageRequest::new(1, 10), 0).total_pages, 0);
        assert_eq!(Pagination::new(PageRequest::new(1, 10), 10).total_pages, 1);
        assert_eq!(Pagination::new(PageRequest::new(1, 10), 11).total_pages, 2);
        assert_eq!(Pagination::new(PageRequest::new(3, 25), 51).total_pages, 3);
    }

    #[test]
    fn slice_respects_offset_and_limit() {
        let page = Page::slice((1..=23).collect::<Vec<_>>(), PageRequest::new(3, 10));
        assert_eq!(page.total, 23);
        assert_eq!(page.items, vec![21, 22, 23]);

        let past_end = Page::slice((1..=5).collect::<Vec<_>>(), PageRequest::new(4, 10));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 5);
    }
}
