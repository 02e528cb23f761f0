//! Declared-versus-live column comparison.

use std::collections::HashMap;

use strata_core::metadata::{Column, ColumnType};

use crate::error::Result;
use crate::introspect::{ChangedColumn, ColumnInfo};

/// Returns the declared columns whose live definition differs.
///
/// A column is changed when its base type differs (ignoring case), its
/// nullability differs, or its length differs. Lengths are compared only
/// when both the declaration and the live column carry one. Declared
/// columns that are absent from `live` are not reported; see
/// [`missing_columns`]. Each result carries the live primary-key flag.
pub fn changed_columns<F>(
    declared: &[Column],
    live: &[ColumnInfo],
    base_type: F,
) -> Result<Vec<ChangedColumn>>
where
    F: Fn(ColumnType) -> Result<&'static str>,
{
    let live: HashMap<&str, &ColumnInfo> = live.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changed = Vec::new();
    for column in declared {
        let Some(info) = live.get(column.name()) else {
            continue;
        };

        let type_changed = !base_type(column.column_type())?.eq_ignore_ascii_case(&info.data_type);
        let nullable_changed = column.is_nullable() != info.nullable;
        let length_changed = matches!(
            (column.length(), info.length),
            (Some(declared), Some(actual)) if declared != actual
        );

        if type_changed || nullable_changed || length_changed {
            changed.push(ChangedColumn {
                name: column.name().to_string(),
                is_primary: info.primary,
            });
        }
    }
    Ok(changed)
}

/// Names of declared columns with no live counterpart, in declaration order.
#[must_use]
pub fn missing_columns<'a>(declared: &'a [Column], live: &[ColumnInfo]) -> Vec<&'a str> {
    declared
        .iter()
        .map(Column::name)
        .filter(|name| !live.iter().any(|c| c.name == *name))
        .collect()
}
