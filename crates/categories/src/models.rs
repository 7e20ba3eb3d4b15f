use common::period::Month;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::Validate;

/// Keywords the sheet uses to auto-assign a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryKeywords {
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub keywords: String, // comma separated
}

impl CategoryKeywords {
    pub fn keyword_list(&self) -> Vec<&str> {
        split_keywords(&self.keywords)
    }
}

fn split_keywords(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).filter(|k| !k.is_empty()).collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddKeywordForm {
    #[validate(length(min = 1, message = "Choose a category"))]
    pub category: String,
    #[validate(length(min = 1, message = "Enter at least one keyword"))]
    pub keywords: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteKeywordForm {
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub keyword: String,
}

#[derive(Debug, PartialEq)]
pub struct AddKeywordRequest {
    pub category: String,
    pub keywords: String,
}

impl AddKeywordRequest {
    pub fn new(category: &str, keywords: &str) -> Result<Self, String> {
        let category = category.trim();
        if category.is_empty() {
            return Err("Category cannot be empty".to_string());
        }

        let keywords = split_keywords(keywords);
        if keywords.is_empty() {
            return Err("Enter at least one keyword".to_string());
        }

        Ok(Self {
            category: category.to_string(),
            keywords: keywords.join(", "),
        })
    }
}

/// Category label -> spending limit for one month.
pub type BudgetLimits = BTreeMap<String, Decimal>;

/// Form field prefix for a category's limit, e.g. `limit:Food`.
pub const LIMIT_FIELD_PREFIX: &str = "limit:";

/// The full set of limits for a month; the sheet replaces its row wholesale.
#[derive(Debug, PartialEq)]
pub struct BudgetUpdate {
    pub month: Month,
    pub limits: BudgetLimits,
}

impl BudgetUpdate {
    /// Builds an update from posted `limit:<category>` fields. Blank fields
    /// mean "no limit" and are left out.
    pub fn from_pairs(month: Month, pairs: &[(String, String)]) -> Result<Self, String> {
        let mut limits = BudgetLimits::new();

        for (key, value) in pairs {
            let Some(category) = key.strip_prefix(LIMIT_FIELD_PREFIX) else {
                continue;
            };
            let category = category.trim();
            let value = value.trim();
            if category.is_empty() || value.is_empty() {
                continue;
            }

            let limit = Decimal::from_str(&value.replace([' ', '_'], ""))
                .map_err(|_| format!("Limit for {} is not a number", category))?;
            if limit.is_sign_negative() {
                return Err(format!("Limit for {} cannot be negative", category));
            }

            limits.insert(category.to_string(), limit);
        }

        Ok(Self { month, limits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_keyword_list_trims_and_drops_empties() {
        let row = CategoryKeywords {
            category: "Food".into(),
            icon: "🍜".into(),
            keywords: " pho, ,bun cha ,".into(),
        };
        assert_eq!(row.keyword_list(), vec!["pho", "bun cha"]);
    }

    #[test]
    fn test_add_keyword_request_normalizes() {
        let req = AddKeywordRequest::new(" Food ", "coffee,  highlands ,").unwrap();
        assert_eq!(req.category, "Food");
        assert_eq!(req.keywords, "coffee, highlands");
    }

    #[test]
    fn test_add_keyword_request_requires_keywords() {
        assert!(AddKeywordRequest::new("Food", " , ").is_err());
        assert!(AddKeywordRequest::new("  ", "coffee").is_err());
    }

    #[test]
    fn test_budget_update_from_pairs() {
        let month = Month::new(2024, 3).unwrap();
        let pairs = vec![
            ("limit:Food".to_string(), "1500000".to_string()),
            ("limit:Rent".to_string(), " ".to_string()),
            ("month".to_string(), "2024-03".to_string()),
            ("limit:Fun".to_string(), "200 000".to_string()),
        ];

        let update = BudgetUpdate::from_pairs(month, &pairs).unwrap();
        assert_eq!(update.limits.len(), 2);
        assert_eq!(update.limits["Food"], dec!(1500000));
        assert_eq!(update.limits["Fun"], dec!(200000));
    }

    #[test]
    fn test_budget_update_rejects_bad_limits() {
        let month = Month::new(2024, 3).unwrap();
        let negative = vec![("limit:Food".to_string(), "-5".to_string())];
        assert!(BudgetUpdate::from_pairs(month, &negative).is_err());

        let garbage = vec![("limit:Food".to_string(), "lots".to_string())];
        assert!(BudgetUpdate::from_pairs(month, &garbage).is_err());
    }
}
