use serde::Deserialize;
use serde_json::{json, Value};

/// Every tool the server exposes, resolved by name at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AddMemory,
    SearchMemory,
}

impl Tool {
    pub const ALL: [Self; 2] = [Self::AddMemory, Self::SearchMemory];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AddMemory => "add_memory",
            Self::SearchMemory => "search_memory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn descriptor(self) -> Value {
        match self {
            Self::AddMemory => json!({
                "name": self.name(),
                "description": "Store a memory. The text is classified into a privacy tier first; \
                    sensitive content (tier 3 and above) is escrowed with the connected peer and only \
                    a non-disclosing brief is kept.",
                "inputSchema": {
                    "type": "object",
                    "required": ["text"],
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "Content to remember: preferences, habits, facts about the user."
                        }
                    }
                }
            }),
            Self::SearchMemory => json!({
                "name": self.name(),
                "description": "Semantic search over stored memories. Escrowed entries are decrypted \
                    through the connected peer when possible; results below the relevance threshold \
                    are dropped and the rest are condensed into a summary.",
                "inputSchema": {
                    "type": "object",
                    "required": ["query_text"],
                    "properties": {
                        "query_text": {"type": "string", "description": "Natural-language query."},
                        "top_k": {
                            "type": "integer",
                            "minimum": 1,
                            "default": DEFAULT_TOP_K,
                            "description": "Maximum number of candidates fetched from the store."
                        }
                    }
                }
            }),
        }
    }
}

pub fn tools_list_result() -> Value {
    json!({
        "tools": Tool::ALL.into_iter().map(Tool::descriptor).collect::<Vec<_>>()
    })
}

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize)]
pub struct AddMemoryArgs {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchMemoryArgs {
    pub query_text: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

const fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
