const INTEGRATION_GUIDE: &str = "You organise memory fragments for an assistant. \
Read the numbered fragments and the user's question. Keep only what helps answer the question, \
merge duplicates, and write a short plain-text summary. Do not invent facts that are not in the fragments. \
If no fragment is relevant, answer exactly: none";

/// Answers that mean "nothing relevant".
const EMPTY_ANSWERS: &[&str] = &["none", "no relevant content", "n/a", "无", "无相关内容", "没有相关内容"];

pub fn integration_message(query: &str, contexts: &[String]) -> String {
    let fragments = contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {}", i + 1, c.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{INTEGRATION_GUIDE}\n\nMemory fragments:\n{fragments}\n\nUser question: {query}\n\nSummary:")
}

/// Trims the model answer and maps "nothing relevant" replies to "".
pub fn normalize_summary(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"').trim();
    let lowered = trimmed.trim_end_matches('.').to_lowercase();
    if EMPTY_ANSWERS.contains(&lowered.as_str()) {
        String::new()
    } else {
        trimmed.to_string()
    }
}
