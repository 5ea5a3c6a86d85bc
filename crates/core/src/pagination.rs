//! Paging helpers shared by the list views.

/// Default rows per page in table views.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest page size the views will request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`, defaulting when absent.
pub fn clamp_page_size(size: Option<u32>) -> u32 {
    size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Offset of the first row on zero-based `page`.
pub fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page) * u64::from(page_size)
}

/// How many pages a list has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    Known(u32),
    /// The backend does not report a total (the pager's `count = -1`);
    /// a next page is always offered.
    Unknown,
}

impl PageCount {
    /// Page count for `total` rows at `page_size` rows per page.
    pub fn from_total(total: u64, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let pages = total.div_ceil(page_size);
        Self::Known(u32::try_from(pages).unwrap_or(u32::MAX))
    }

    /// Whether a page after zero-based `page` may exist.
    pub fn has_next(self, page: u32) -> bool {
        match self {
            Self::Known(pages) => page.saturating_add(1) < pages,
            Self::Unknown => true,
        }
    }

    /// The pager's numeric form: `-1` when unknown.
    pub fn as_count(self) -> i64 {
        match self {
            Self::Known(pages) => i64::from(pages),
            Self::Unknown => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_page_size_uses_default_when_none() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn clamp_page_size_respects_bounds() {
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(50)), 50);
    }

    #[test]
    fn page_offset_multiplies() {
        assert_eq!(page_offset(0, 25), 0);
        assert_eq!(page_offset(3, 25), 75);
    }

    #[test]
    fn known_page_count_rounds_up() {
        assert_eq!(PageCount::from_total(42, 25), PageCount::Known(2));
        assert_eq!(PageCount::from_total(0, 25), PageCount::Known(0));
        assert!(PageCount::Known(2).has_next(0));
        assert!(!PageCount::Known(2).has_next(1));
    }

    #[test]
    fn unknown_page_count_always_has_next() {
        assert!(PageCount::Unknown.has_next(0));
        assert!(PageCount::Unknown.has_next(999));
        assert_eq!(PageCount::Unknown.as_count(), -1);
    }

    #[test]
    fn last_possible_page_has_no_next() {
        assert!(!PageCount::Known(u32::MAX).has_next(u32::MAX));
        assert!(PageCount::Known(u32::MAX).has_next(u32::MAX - 2));
    }
}
