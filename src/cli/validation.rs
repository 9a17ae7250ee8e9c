use std::collections::HashSet;

use crate::{
    cli::errors::{CliError, CliResult},
    items::ItemId,
    tags,
};

/// Splits a comma- or whitespace-separated list. Case is preserved: tag
/// names and item ids compare exactly.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .flat_map(|part| part.split_whitespace())
        .map(str::to_string)
        .collect()
}

/// Flattens repeated and comma-joined arguments into one list.
pub fn parse_lists(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| parse_list(v)).collect()
}

/// Parses an id list, dropping repeats but keeping first-seen order.
pub fn parse_ids(values: &[String]) -> CliResult<Vec<ItemId>> {
    let mut seen = HashSet::new();
    let ids: Vec<ItemId> = parse_lists(values)
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(ItemId::from)
        .collect();
    if ids.is_empty() {
        return Err(CliError::validation("ids", "At least one item id is required"));
    }
    Ok(ids)
}

/// Ids are later passed back through [`parse_ids`], so separators are not
/// allowed inside one.
pub fn validate_item_id(id: &str) -> CliResult<()> {
    if id.is_empty() {
        return Err(CliError::validation("id", "Item id cannot be empty"));
    }
    if id.contains(',') || id.chars().any(char::is_whitespace) {
        return Err(CliError::validation(
            "id",
            format!("'{id}' cannot contain commas or whitespace"),
        ));
    }
    Ok(())
}

/// Validates tag format
pub fn validate_tags(tags: &[String]) -> CliResult<()> {
    for tag in tags {
        if !tags::is_valid_tag_name(tag) {
            return Err(CliError::validation(
                "tags",
                format!("'{tag}' can only contain letters, numbers, underscores, and hyphens"),
            ));
        }
    }
    Ok(())
}

/// Parses and validates a tag list that must not be empty
pub fn parse_tags(values: &[String]) -> CliResult<Vec<String>> {
    let tags = parse_lists(values);
    if tags.is_empty() {
        return Err(CliError::validation("tags", "At least one tag is required"));
    }
    validate_tags(&tags)?;
    Ok(tags)
}

pub fn validate_view_keys(keys: &[String]) -> CliResult<()> {
    if keys.is_empty() || keys.iter().any(|k| k.trim().is_empty()) {
        return Err(CliError::validation("views", "At least one view id or name is required"));
    }
    Ok(())
}
