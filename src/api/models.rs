use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractResponse {
    pub text: String,
}
