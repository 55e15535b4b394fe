use crate::portfolio::models::AntiPortfolioData;

/// Local-storage slot the browser keeps the last flight log in.
pub const FLIGHT_LOG_SLOT: &str = "antiPortfolio.flightLog.v1";

/// Suggested file name for the downloadable copy.
pub const FLIGHT_LOG_FILE_NAME: &str = "flight-log.json";

/// Pretty JSON, as written to `flight-log.json`.
pub fn encode_flight_log(data: &AntiPortfolioData) -> serde_json::Result<String> {
    serde_json::to_string_pretty(data)
}

/// `None` for a missing or corrupt blob. Corruption is not an error: the
/// client just starts over.
pub fn decode_flight_log(raw: &str) -> Option<AntiPortfolioData> {
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}
