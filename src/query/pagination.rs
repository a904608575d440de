//! Page slicing

/// Slice out a 1-indexed page.
///
/// Page 0 and pages past the end are empty. A page size of 0 is treated as 1.
pub fn paginate<T: Clone>(list: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page_size = page_size.max(1);
    if page == 0 {
        return Vec::new();
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= list.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(list.len());
    list[start..end].to_vec()
}

/// Number of pages needed for `total` items, never less than 1
pub fn total_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total.div_ceil(page_size).max(1)
}
