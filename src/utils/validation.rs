use std::collections::HashSet;
use validator::Validate;

use crate::errors::AppError;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|err| {
        let details = err
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let codes = errs
                    .iter()
                    .map(|e| e.code.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: [{}]", field, codes)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::BadRequest(format!("Validation failed: {}", details))
    })
}

pub fn ensure_distinct_ids(ids: &[i32]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(AppError::BadRequest(format!("Duplicate id {}", id))),
        None => Ok(()),
    }
}
