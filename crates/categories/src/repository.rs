use crate::models::{AddKeywordRequest, CategoryKeywords};
use serde_json::json;
use sheets::{ApiError, SheetClient, Transport};

pub(crate) struct CategoryRepository<'a, T> {
    sheets: &'a SheetClient<T>,
}

impl<'a, T: Transport> CategoryRepository<'a, T> {
    pub fn new(sheets: &'a SheetClient<T>) -> Self {
        Self { sheets }
    }

    pub async fn list(&self) -> Result<Vec<String>, ApiError> {
        let names: Vec<String> = self.sheets.fetch_records("getCategories", &[]).await?;

        Ok(names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect())
    }

    pub async fn keywords(&self) -> Result<Vec<CategoryKeywords>, ApiError> {
        self.sheets.fetch_records("getKeywords", &[]).await
    }

    pub async fn add_keyword(&self, req: &AddKeywordRequest) -> Result<(), ApiError> {
        self.sheets
            .mutate("addKeyword", json!({ "category": req.category, "keywords": req.keywords }))
            .await
    }

    pub async fn delete_keyword(&self, category: &str, keyword: &str) -> Result<(), ApiError> {
        self.sheets
            .mutate("deleteKeyword", json!({ "category": category, "keyword": keyword }))
            .await
    }
}
