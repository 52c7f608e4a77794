use serde::Deserialize;

#[derive(Deserialize)]
pub struct QueryPayload {
    pub message: String,
}
