//! Basic enumerations shared by records, queries and reports

use serde::{Deserialize, Serialize};

/// Direction of money for an operation or category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Money coming in (salary, refunds)
    Income,
    /// Money going out (groceries, rent)
    Expense,
}

impl Default for OperationType {
    fn default() -> Self {
        OperationType::Expense
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(OperationType::Income),
            "expense" | "expenses" => Ok(OperationType::Expense),
            _ => Err(format!("Invalid operation type: {}", s)),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Income => write!(f, "income"),
            OperationType::Expense => write!(f, "expense"),
        }
    }
}

/// Type filter of the operation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn matches(&self, kind: OperationType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => kind == OperationType::Income,
            TypeFilter::Expense => kind == OperationType::Expense,
        }
    }
}

impl std::str::FromStr for TypeFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "all" => Ok(TypeFilter::All),
            other => other.parse::<OperationType>().map(TypeFilter::from),
        }
    }
}

impl From<OperationType> for TypeFilter {
    fn from(kind: OperationType) -> Self {
        match kind {
            OperationType::Income => TypeFilter::Income,
            OperationType::Expense => TypeFilter::Expense,
        }
    }
}

/// Key the operation list is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Timestamp,
    Amount,
    Description,
    /// Sorts by the resolved category label, not the raw id
    CategoryId,
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" | "date" => Ok(SortField::Timestamp),
            "amount" => Ok(SortField::Amount),
            "description" => Ok(SortField::Description),
            "categoryId" | "category_id" | "category" => Ok(SortField::CategoryId),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

/// Category filter of the operation list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Id(String),
}

impl CategoryFilter {
    /// `"all"` and the empty string select every category
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "all" => CategoryFilter::All,
            id => CategoryFilter::Id(id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_from_str() {
        assert_eq!("income".parse::<OperationType>().unwrap(), OperationType::Income);
        assert_eq!("Expense".parse::<OperationType>().unwrap(), OperationType::Expense);
        assert!("transfer".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_type_filter() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!("income".parse::<TypeFilter>().unwrap(), TypeFilter::Income);
        assert!(TypeFilter::All.matches(OperationType::Expense));
        assert!(!TypeFilter::Income.matches(OperationType::Expense));
    }

    #[test]
    fn test_sort_field_from_str() {
        assert_eq!("categoryId".parse::<SortField>().unwrap(), SortField::CategoryId);
        assert_eq!("amount".parse::<SortField>().unwrap(), SortField::Amount);
        assert!("payee".parse::<SortField>().is_err());
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("c1"), CategoryFilter::Id("c1".to_string()));
    }
}
