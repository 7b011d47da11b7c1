//! Query layer: one store per resource, each a thin wrapper over the shared
//! connection pool mapping operations to parameterized SQL.

pub mod alerts;
pub mod assets;
pub mod monitors;
pub mod servers;
pub mod tickets;
pub mod users;

/// Normalize a 1-based page number.
pub fn page_or_default(page: Option<i64>) -> i64 {
    page.filter(|p| *p >= 1).unwrap_or(1)
}

/// Normalize a page size, falling back to the resource default.
pub fn page_size_or(size: Option<i64>, default: i64) -> i64 {
    size.filter(|s| *s >= 1).unwrap_or(default)
}

pub fn offset(page: i64, page_size: i64) -> i64 {
    (page - 1) * page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_to_one() {
        assert_eq!(page_or_default(None), 1);
        assert_eq!(page_or_default(Some(0)), 1);
        assert_eq!(page_or_default(Some(-3)), 1);
        assert_eq!(page_or_default(Some(5)), 5);
    }

    #[test]
    fn page_size_uses_resource_default() {
        assert_eq!(page_size_or(None, 10), 10);
        assert_eq!(page_size_or(None, 100), 100);
        assert_eq!(page_size_or(Some(25), 10), 25);
        assert_eq!(page_size_or(Some(0), 10), 10);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(3, 10), 20);
    }
}
