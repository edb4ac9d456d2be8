use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    pub total_pages: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            total_pages: Some(total_pages),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
            total_pages: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// A page of results plus the total before paging.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    /// Slices an already filtered and ordered list.
    pub fn from_vec(all: Vec<T>, page: i64, per_page: i64) -> Self {
        let total = all.len() as i64;
        let offset = usize::try_from(page.saturating_sub(1).saturating_mul(per_page).max(0))
            .unwrap_or(usize::MAX);
        let items = all
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .collect();
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn meta(&self) -> Meta {
        Meta::new(self.page, self.per_page, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_slice_and_count() {
        let page = Page::from_vec((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.meta().total_pages, Some(3));
    }

    #[test]
    fn huge_page_numbers_yield_an_empty_page() {
        let page = Page::from_vec((1..=5).collect::<Vec<_>>(), i64::MAX, 100);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
    }
}
