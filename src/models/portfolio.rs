use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AddHoldingRequest {
    pub coin_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHoldingResponse {
    pub coin_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntryResponse {
    pub coin_id: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub amount: f64,
    pub current_price: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub holdings: Vec<PortfolioEntryResponse>,
    pub total_value: f64,
}
