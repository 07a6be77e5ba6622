pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;

/// A 1-indexed page window. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

pub fn total_pages(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Slices one page out of an ordered sequence. A page past the end is empty.
pub fn paginate<T: Clone>(ordered: &[T], request: &PageRequest) -> Page<T> {
    let limit = request.limit.max(1);
    let page = request.page.max(1);
    let total = ordered.len();

    let start = (page - 1).saturating_mul(limit).min(total);
    let end = start.saturating_add(limit).min(total);

    Page {
        items: ordered[start..end].to_vec(),
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: usize, limit: usize) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn test_third_page_of_forty_five() {
        let items: Vec<usize> = (1..=45).collect();
        let page = paginate(&items, &request(3, 20));

        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let items: Vec<usize> = (1..=5).collect();
        let page = paginate(&items, &request(4, 2));

        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let items: Vec<usize> = (1..=5).collect();
        let page = paginate(&items, &request(usize::MAX, usize::MAX));

        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_input_has_zero_pages() {
        let items: Vec<usize> = Vec::new();
        let page = paginate(&items, &PageRequest::default());

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, DEFAULT_PAGE);
        assert_eq!(page.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_pages_cover_sequence_exactly_once() {
        let items: Vec<usize> = (0..47).collect();
        for limit in [1, 3, 7, 20, 47, 100] {
            let first = paginate(&items, &request(1, limit));
            let mut covered = Vec::new();
            for page in 1..=first.total_pages {
                covered.extend(paginate(&items, &request(page, limit)).items);
            }
            assert_eq!(covered, items, "limit {limit}");
        }
    }
}
