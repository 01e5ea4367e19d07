use super::ApiError;

pub fn validate_essay_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid essay ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 1000;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

pub fn validate_score(score: i32) -> Result<i32, ApiError> {
    if !(0..=100).contains(&score) {
        return Err(ApiError::validation(format!(
            "Invalid score: {score}. Score must be between 0 and 100"
        )));
    }
    Ok(score)
}

/// Both topic and content are required for submissions and scoring.
pub fn require_topic_and_content<'a>(
    topic: Option<&'a str>,
    content: Option<&'a str>,
) -> Result<(&'a str, &'a str), ApiError> {
    let topic = topic.map(str::trim).filter(|t| !t.is_empty());
    let content = content.filter(|c| !c.trim().is_empty());

    match (topic, content) {
        (Some(topic), Some(content)) => {
            if topic.chars().count() > 300 {
                return Err(ApiError::validation(
                    "Topic must be 300 characters or less",
                ));
            }
            Ok((topic, content))
        }
        _ => Err(ApiError::validation("Topic and content are required")),
    }
}

pub fn validate_draft_content(content: &str, min_length: usize) -> Result<&str, ApiError> {
    if content.trim().chars().count() < min_length {
        return Err(ApiError::validation(format!(
            "Content must be at least {min_length} characters"
        )));
    }
    Ok(content)
}

pub fn validate_payment_reference(reference: &str) -> Result<&str, ApiError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Payment reference is required"));
    }

    if trimmed.len() > 100
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '='))
    {
        return Err(ApiError::validation("Payment reference is malformed"));
    }

    Ok(trimmed)
}
