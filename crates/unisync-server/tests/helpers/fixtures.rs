//! Source payload fixtures

use serde_json::{json, Value};

pub const CSV1_HEADER: &str = "id,name,value,timestamp\n";
pub const CSV2_HEADER: &str = "record_id,full_name,score,created_at\n";

pub const CSV1_SINGLE: &str = "id,name,value,timestamp\n1,Bitcoin,50000,2024-01-01T00:00:00\n";

pub const CSV2_ROWS: &str = "record_id,full_name,score,created_at\n\
                             101,Bitcoin (BTC),98.7,2024-01-01T12:00:00\n\
                             102,Ethereum (ETH),91.2,2024-01-01T12:00:00\n";

/// Delimited source 1 with the given ids, one row each
pub fn csv1_rows(ids: &[i64]) -> String {
    let mut out = CSV1_HEADER.to_string();
    for id in ids {
        out.push_str(&format!("{id},Coin {id},{},2024-01-01T00:00:00\n", id * 10));
    }
    out
}

/// Market snapshot as returned by the remote API
pub fn market_snapshot(bitcoin_price: f64) -> Value {
    json!([
        {
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": bitcoin_price,
            "last_updated": "2024-01-01T00:00:00.000Z"
        },
        {
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "current_price": 3000.9,
            "last_updated": "2024-01-01T00:00:00.000Z"
        }
    ])
}
