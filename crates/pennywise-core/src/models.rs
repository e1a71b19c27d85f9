//! Core records and their entry drafts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::OperationType;

/// Label shown for operations without a resolvable category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single income or expense transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Store-assigned identifier
    pub id: String,
    /// Always positive; the direction comes from `kind`
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Empty when uncategorized
    #[serde(default)]
    pub category_id: String,
    pub description: String,
    /// When the transaction happened, as entered by the user
    pub timestamp: DateTime<Utc>,
    /// When the record was first stored; never changes afterwards
    pub created_at: DateTime<Utc>,
}

impl Operation {
    pub fn is_income(&self) -> bool {
        self.kind == OperationType::Income
    }

    pub fn has_category(&self) -> bool {
        !self.category_id.is_empty()
    }
}

/// User-defined label for operations of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub created_at: DateTime<Utc>,
}

/// Fields the user fills in to create or edit an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDraft {
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationDraft {
    /// Build the stored record; `created_at` is supplied by the store
    pub fn into_operation(self, id: String, created_at: DateTime<Utc>) -> Operation {
        Operation {
            id,
            amount: self.amount,
            kind: self.kind,
            category_id: self.category_id.unwrap_or_default(),
            description: self.description,
            timestamp: self.timestamp,
            created_at,
        }
    }
}

/// Fields the user fills in to create or rename a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
}

impl CategoryDraft {
    pub fn into_category(self, id: String, created_at: DateTime<Utc>) -> Category {
        Category {
            id,
            name: self.name.trim().to_string(),
            kind: self.kind,
            created_at,
        }
    }
}

/// Category id to display name lookup
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    names: HashMap<String, String>,
}

impl CategoryIndex {
    pub fn new(categories: &[Category]) -> Self {
        Self {
            names: categories
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
        }
    }

    /// Name of the referenced category, if the reference resolves
    pub fn name(&self, category_id: &str) -> Option<&str> {
        if category_id.is_empty() {
            return None;
        }
        self.names.get(category_id).map(String::as_str)
    }

    /// Display label, falling back to [`UNCATEGORIZED`]
    pub fn label(&self, category_id: &str) -> &str {
        self.name(category_id).unwrap_or(UNCATEGORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            kind: OperationType::Expense,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_category_index_resolves_and_falls_back() {
        let index = CategoryIndex::new(&[category("food", "Food"), category("rent", "Rent")]);
        assert_eq!(index.name("food"), Some("Food"));
        assert_eq!(index.label("rent"), "Rent");
        assert_eq!(index.label("deleted"), UNCATEGORIZED);
        assert_eq!(index.label(""), UNCATEGORIZED);
        assert_eq!(index.name(""), None);
    }

    #[test]
    fn test_operation_json_shape() {
        let json = r#"{
            "id": "op1",
            "amount": 12.5,
            "type": "expense",
            "categoryId": "food",
            "description": "Lunch",
            "timestamp": "2024-01-05T12:00:00Z",
            "createdAt": "2024-01-05T12:01:00Z"
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.kind, OperationType::Expense);
        assert_eq!(op.amount, Decimal::new(125, 1));
        assert!(op.has_category());

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "expense");
        assert_eq!(value["categoryId"], "food");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_draft_without_category() {
        let draft: OperationDraft = serde_json::from_str(
            r#"{"type": "income", "amount": "1000", "description": "Salary", "timestamp": "2024-01-01T09:00:00Z"}"#,
        )
        .unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 5, 0).unwrap();
        let op = draft.into_operation("op2".to_string(), created);
        assert_eq!(op.category_id, "");
        assert!(!op.has_category());
        assert!(op.is_income());
        assert_eq!(op.created_at, created);
    }

    #[test]
    fn test_category_draft_trims_name() {
        let draft = CategoryDraft {
            name: "  Travel ".to_string(),
            kind: OperationType::Expense,
        };
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(draft.into_category("c".to_string(), created).name, "Travel");
    }
}
