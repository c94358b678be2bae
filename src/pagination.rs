use sea_orm::{ConnectionTrait, PaginatorTrait, SelectorTrait};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageParams {
    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Runs a count plus one page fetch for any sea-orm select.
pub async fn paginate<'db, C, Q>(
    db: &'db C,
    query: Q,
    params: &PageParams,
) -> Result<Page<<Q::Selector as SelectorTrait>::Item>, sea_orm::DbErr>
where
    C: ConnectionTrait,
    Q: PaginatorTrait<'db, C>,
{
    let page = params.page();
    let per_page = params.per_page();

    let paginator = query.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let params = PageParams { page: Some(0), per_page: Some(0) };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 1);

        let params = PageParams { page: Some(7), per_page: Some(10_000) };
        assert_eq!(params.page(), 7);
        assert_eq!(params.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn map_preserves_envelope() {
        let page = Page { items: vec![1, 2, 3], page: 2, per_page: 3, total_items: 7, total_pages: 3 };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_items, 7);
        assert_eq!(mapped.total_pages, 3);
    }
}
