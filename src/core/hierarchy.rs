//! Hierarchy consistency rule for record classifications.
//!
//! A record names a type, a category and a subcategory. The category must
//! belong to the type and the subcategory must belong to the category. The rule
//! is a pure function over already-loaded rows so that both the form binding
//! stage and the entity `before_save` hook can call it.

use thiserror::Error;

use crate::entities::{category, subcategory};

/// A broken link in a (type, category, subcategory) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The category is owned by a different type.
    #[error("The selected category does not belong to the selected type.")]
    CategoryTypeMismatch {
        /// Category that was chosen
        category_id: i64,
        /// Type that was chosen
        type_id: i64,
    },
    /// The subcategory is owned by a different category.
    #[error("The selected subcategory does not belong to the selected category.")]
    SubcategoryCategoryMismatch {
        /// Subcategory that was chosen
        subcategory_id: i64,
        /// Category that was chosen
        category_id: i64,
    },
}

/// Checks that `category` belongs to `type_id` and `subcategory` belongs to `category`.
///
/// The category link is checked first, so a triple broken at both levels
/// reports [`HierarchyError::CategoryTypeMismatch`].
pub const fn check(
    type_id: i64,
    category: &category::Model,
    subcategory: &subcategory::Model,
) -> Result<(), HierarchyError> {
    if category.type_id != type_id {
        return Err(HierarchyError::CategoryTypeMismatch {
            category_id: category.id,
            type_id,
        });
    }
    if subcategory.category_id != category.id {
        return Err(HierarchyError::SubcategoryCategoryMismatch {
            subcategory_id: subcategory.id,
            category_id: category.id,
        });
    }
    Ok(())
}
