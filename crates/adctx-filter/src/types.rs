#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub query: String,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FilterResponse {
    pub provider: String,
    pub model: String,
    pub summary: String,
}
