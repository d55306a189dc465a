use crate::error::{internal::InternalError, AppError};

/// Parses a u64 value from String
///
/// # Arguments
/// - `value` - The String to attempt to parse into `u64`
///
/// # Returns
/// - `Ok(u64)` - Successfully parsed String to `u64`
/// - `Err(AppError::InternalErr(ParseStringId))` - Failed to parse
///   the string as a u64
pub fn parse_u64_from_string(value: String) -> Result<u64, AppError> {
    let result = value
        .parse::<u64>()
        .map_err(|e| InternalError::ParseStringId {
            value: value.clone(),
            source: e,
        })?;

    Ok(result)
}

/// Parses a channel mention (`<#123>`) or a bare snowflake into a channel id.
///
/// # Returns
/// - `Ok(u64)` - Parsed channel id
/// - `Err(AppError)` - Input was neither a mention nor a numeric id
pub fn parse_channel_id(input: &str) -> Result<u64, AppError> {
    let trimmed = input
        .trim()
        .trim_start_matches("<#")
        .trim_end_matches('>')
        .to_string();

    parse_u64_from_string(trimmed)
}
