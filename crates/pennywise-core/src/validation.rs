//! Entry validation for operation and category drafts

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::models::{Category, CategoryDraft, OperationDraft};

pub const MAX_DESCRIPTION_LEN: usize = 100;
pub const MAX_CATEGORY_NAME_LEN: usize = 50;
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Check an operation draft against the user's categories
///
/// Returns the draft with its description trimmed and an empty category
/// reference turned into `None`.
pub fn validate_operation(
    mut draft: OperationDraft,
    categories: &[Category],
) -> CoreResult<OperationDraft> {
    let minimum = Decimal::new(1, AMOUNT_DECIMAL_PLACES);
    if draft.amount <= Decimal::ZERO {
        return Err(CoreError::validation("amount", "must be greater than zero"));
    }
    if draft.amount < minimum {
        return Err(CoreError::validation("amount", format!("must be at least {}", minimum)));
    }
    if draft.amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(CoreError::validation(
            "amount",
            format!("must have at most {} decimal places", AMOUNT_DECIMAL_PLACES),
        ));
    }

    let description = draft.description.trim();
    if description.is_empty() {
        return Err(CoreError::validation("description", "is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    draft.description = description.to_string();

    draft.category_id = draft.category_id.filter(|id| !id.is_empty());
    if let Some(ref id) = draft.category_id {
        match categories.iter().find(|c| &c.id == id) {
            None => {
                return Err(CoreError::validation(
                    "categoryId",
                    format!("unknown category {}", id),
                ))
            }
            Some(category) if category.kind != draft.kind => {
                return Err(CoreError::validation(
                    "categoryId",
                    format!("category '{}' is for {} operations", category.name, category.kind),
                ))
            }
            Some(_) => {}
        }
    }

    Ok(draft)
}

/// Check a category draft, returning it with the name trimmed
pub fn validate_category(mut draft: CategoryDraft) -> CoreResult<CategoryDraft> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("name", "is required"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(CoreError::validation(
            "name",
            format!("must be at most {} characters", MAX_CATEGORY_NAME_LEN),
        ));
    }
    draft.name = name.to_string();
    Ok(draft)
}
