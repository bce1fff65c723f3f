use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Common pagination query parameters
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip
    pub skip: Option<i64>,
    /// Maximum number of items to return
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let p = Pagination { skip: None, limit: None };
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 100);

        let p = Pagination {
            skip: Some(-5),
            limit: Some(100_000),
        };
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 1000);
    }
}
