//! Paged list responses

use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list endpoint.
///
/// Decodes both the paginated `{count, next, previous, results}` envelope and
/// a bare JSON array (treated as a single complete page).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn single(results: Vec<T>) -> Self {
        Self { count: results.len() as u64, next: None, previous: None, results }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Paged {
        count: u64,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PageRepr::deserialize(deserializer)? {
            PageRepr::Paged { count, next, previous, results } => {
                Page { count, next, previous, results }
            }
            PageRepr::Bare(results) => Page::single(results),
        })
    }
}

/// Pagination and ordering parameters shared by list endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub ordering: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self { page: Some(page), page_size: Some(page_size), ..Self::default() }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(ordering) = self.ordering.as_ref().filter(|s| !s.is_empty()) {
            query.push(("ordering".to_string(), ordering.clone()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.clone()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paged_and_bare_shapes() {
        let paged: Page<u32> = serde_json::from_value(json!({
            "count": 12, "next": "http://x/?page=2", "previous": null, "results": [1, 2]
        }))
        .unwrap();
        assert_eq!(paged.count, 12);
        assert!(paged.has_next());

        let bare: Page<u32> = serde_json::from_value(json!([4, 5, 6])).unwrap();
        assert_eq!(bare.count, 3);
        assert!(!bare.has_next());
        assert_eq!(bare.map(|n| n * 2).results, vec![8, 10, 12]);
    }

    #[test]
    fn test_list_query() {
        let query = ListQuery { ordering: Some("-created_at".into()), ..ListQuery::page(2, 25) };
        assert_eq!(query.to_query().len(), 3);
        assert!(ListQuery::default().to_query().is_empty());
    }
}
