use crate::budget_repository::BudgetRepository;
use crate::models::{AddKeywordForm, AddKeywordRequest, BudgetLimits, BudgetUpdate, CategoryKeywords, DeleteKeywordForm};
use crate::repository::CategoryRepository;
use common::SessionCache;
use common::period::Month;
use sheets::{ApiError, SheetClient, Transport};
use tokio::sync::RwLock;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sheet API error: {0}")]
    Api(String),
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl From<ApiError> for CategoryError {
    fn from(err: ApiError) -> Self {
        CategoryError::Api(err.to_string())
    }
}

pub struct CategoryService;

impl CategoryService {
    /// Category names, served from the session cache after the first fetch.
    #[instrument(skip(sheets, cache))]
    pub async fn list_categories<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
    ) -> Result<Vec<String>, CategoryError> {
        if let Some(cached) = cache.read().await.categories() {
            return Ok(cached.to_vec());
        }

        let categories = CategoryRepository::new(sheets).list().await.map_err(|e| {
            tracing::error!("Failed to list categories: {}", e);
            CategoryError::from(e)
        })?;

        cache.write().await.store_categories(categories.clone());
        Ok(categories)
    }

    #[instrument(skip(sheets))]
    pub async fn list_keywords<T: Transport>(
        sheets: &SheetClient<T>,
    ) -> Result<Vec<CategoryKeywords>, CategoryError> {
        let keywords = CategoryRepository::new(sheets).keywords().await?;
        Ok(keywords)
    }

    #[instrument(skip(sheets, cache))]
    pub async fn add_keyword<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        form: AddKeywordForm,
    ) -> Result<(), CategoryError> {
        form.validate()
            .map_err(|e| CategoryError::InvalidInput(e.to_string()))?;
        let req = AddKeywordRequest::new(&form.category, &form.keywords)
            .map_err(CategoryError::InvalidInput)?;

        CategoryRepository::new(sheets).add_keyword(&req).await?;

        cache.write().await.invalidate_categories();
        Ok(())
    }

    #[instrument(skip(sheets, cache))]
    pub async fn delete_keyword<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        form: DeleteKeywordForm,
    ) -> Result<(), CategoryError> {
        form.validate()
            .map_err(|e| CategoryError::InvalidInput(e.to_string()))?;

        CategoryRepository::new(sheets)
            .delete_keyword(form.category.trim(), form.keyword.trim())
            .await?;

        cache.write().await.invalidate_categories();
        Ok(())
    }

    #[instrument(skip(sheets))]
    pub async fn budgets_for_month<T: Transport>(
        sheets: &SheetClient<T>,
        month: Month,
    ) -> Result<BudgetLimits, CategoryError> {
        let limits = BudgetRepository::new(sheets).get_for_month(month).await.map_err(|e| {
            tracing::error!("Failed to get budgets for {}: {}", month, e);
            CategoryError::from(e)
        })?;
        Ok(limits)
    }

    #[instrument(skip(sheets, cache))]
    pub async fn save_budgets<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        month: Month,
        fields: &[(String, String)],
    ) -> Result<(), CategoryError> {
        let update = BudgetUpdate::from_pairs(month, fields).map_err(CategoryError::InvalidInput)?;
        tracing::info!("Saving {} budget limits for {}", update.limits.len(), month);

        BudgetRepository::new(sheets).save(&update).await?;

        cache.write().await.invalidate_categories();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sheets::testing::{stub_client, StubTransport};

    #[tokio::test]
    async fn test_categories_are_cached() {
        let sheets = stub_client(StubTransport::new().respond("getCategories", json!(["Food", "Rent"])));
        let cache = RwLock::new(SessionCache::default());

        let first = CategoryService::list_categories(&sheets, &cache).await.unwrap();
        let second = CategoryService::list_categories(&sheets, &cache).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sheets.transport().requests_for("getCategories").len(), 1);
    }

    #[tokio::test]
    async fn test_keyword_change_invalidates_categories() {
        let sheets = stub_client(
            StubTransport::new()
                .respond("getCategories", json!(["Food"]))
                .respond("addKeyword", json!({ "success": true })),
        );
        let cache = RwLock::new(SessionCache::default());

        CategoryService::list_categories(&sheets, &cache).await.unwrap();
        let form = AddKeywordForm { category: "Food".into(), keywords: "pho".into() };
        CategoryService::add_keyword(&sheets, &cache, form).await.unwrap();
        assert!(cache.read().await.categories().is_none());

        CategoryService::list_categories(&sheets, &cache).await.unwrap();
        assert_eq!(sheets.transport().requests_for("getCategories").len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_keyword_form_is_not_sent() {
        let sheets = stub_client(StubTransport::new());
        let cache = RwLock::new(SessionCache::default());

        let form = AddKeywordForm { category: "".into(), keywords: "pho".into() };
        let result = CategoryService::add_keyword(&sheets, &cache, form).await;

        assert!(matches!(result, Err(CategoryError::InvalidInput(_))));
        assert!(sheets.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_delete_surfaces_error() {
        let sheets = stub_client(StubTransport::new().respond("deleteKeyword", json!({ "error": "Keyword not found" })));
        let cache = RwLock::new(SessionCache::default());

        let form = DeleteKeywordForm { category: "Food".into(), keyword: "pho".into() };
        let result = CategoryService::delete_keyword(&sheets, &cache, form).await;

        match result {
            Err(CategoryError::Api(msg)) => assert!(msg.contains("Keyword not found")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_budgets_validates_first() {
        let sheets = stub_client(StubTransport::new().respond("saveBudgets", json!({ "success": true })));
        let cache = RwLock::new(SessionCache::default());
        let month = Month::new(2024, 3).unwrap();

        let bad = vec![("limit:Food".to_string(), "abc".to_string())];
        assert!(CategoryService::save_budgets(&sheets, &cache, month, &bad).await.is_err());
        assert!(sheets.transport().requests().is_empty());

        let good = vec![("limit:Food".to_string(), "100".to_string())];
        CategoryService::save_budgets(&sheets, &cache, month, &good).await.unwrap();
        assert_eq!(sheets.transport().requests_for("saveBudgets").len(), 1);
    }

    #[tokio::test]
    async fn test_save_budgets_invalidates_categories() {
        let sheets = stub_client(
            StubTransport::new()
                .respond("getCategories", json!(["Food", "Rent"]))
                .respond("saveBudgets", json!({ "success": true })),
        );
        let cache = RwLock::new(SessionCache::default());
        let month = Month::new(2024, 3).unwrap();

        CategoryService::list_categories(&sheets, &cache).await.unwrap();
        assert!(cache.read().await.categories().is_some());

        let fields = vec![("limit:Food".to_string(), "500000".to_string())];
        CategoryService::save_budgets(&sheets, &cache, month, &fields).await.unwrap();
        assert!(cache.read().await.categories().is_none());

        CategoryService::list_categories(&sheets, &cache).await.unwrap();
        assert_eq!(sheets.transport().requests_for("getCategories").len(), 2);
    }
}
