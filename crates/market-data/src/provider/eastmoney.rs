//! Eastmoney fund data provider.
//!
//! Talks to the public Eastmoney/Tiantian fund endpoints:
//!
//! - Intraday estimate: `http://fundgz.1234567.com.cn/js/{code}.js` (JSONP)
//! - Trailing returns: `FundMApi/FundBaseTypeInformation.ashx` on the mobile API
//! - NAV history: `f10/lsjz` on the fund API (paged, requires a Referer)
//! - Search: `FundSearch/api/FundSearchAPI.ashx`
//!
//! The feeds are loosely typed: numeric fields arrive as strings, numbers or
//! placeholders interchangeably, and the estimate feed wraps its JSON in a
//! JSONP callback. Parsing is lenient field-by-field; a field that fails to
//! parse degrades to its zero/`None` default without failing the record.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::model::{
    decimal_from_value, parse_decimal, FundHistory, FundReturns, FundSearchHit, HistoryDepth,
    NavRecord, ValuationQuote,
};
use crate::provider::traits::FundDataProvider;

const PROVIDER_ID: &str = "EASTMONEY";

const VALUATION_TIMEOUT: Duration = Duration::from_secs(5);
const RETURNS_TIMEOUT: Duration = Duration::from_secs(5);
const RETURNS_ONLY_TIMEOUT: Duration = Duration::from_secs(3);
const HISTORY_PAGE_TIMEOUT: Duration = Duration::from_secs(5);

const HISTORY_PAGE_SIZE: usize = 100;
/// Upper bound on fetched NAV rows; older history is not needed for
/// trade-date price lookups.
pub const HISTORY_MAX_ROWS: usize = 500;

/// The history endpoint rejects requests without a browser-looking origin.
const HISTORY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Endpoint roots, overridable for tests and mirrors.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub valuation_base_url: String,
    pub mobile_api_base_url: String,
    pub history_api_base_url: String,
    pub search_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            valuation_base_url: "http://fundgz.1234567.com.cn/js".to_string(),
            mobile_api_base_url: "https://fundmobapi.eastmoney.com".to_string(),
            history_api_base_url: "https://api.fund.eastmoney.com".to_string(),
            search_base_url: "http://fundsuggest.eastmoney.com".to_string(),
        }
    }
}

/// Payload inside the JSONP wrapper of the estimate feed.
#[derive(Debug, Deserialize)]
struct GzQuote {
    #[serde(default)]
    fundcode: Option<String>,
    #[serde(default)]
    name: Option<String>,
    /// Date of the published NAV.
    #[serde(default)]
    jzrq: Option<String>,
    /// Published unit NAV.
    #[serde(default)]
    dwjz: Option<String>,
    /// Intraday estimated NAV.
    #[serde(default)]
    gsz: Option<String>,
    /// Intraday estimated change, percent.
    #[serde(default)]
    gszzl: Option<String>,
    /// Timestamp of the estimate.
    #[serde(default)]
    gztime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BaseInfoResponse {
    #[serde(rename = "Datas", default)]
    datas: Option<BaseInfoDatas>,
}

/// Loosely typed: the mobile API flips between strings and numbers.
#[derive(Debug, Deserialize)]
struct BaseInfoDatas {
    #[serde(rename = "FSRQ", default)]
    fsrq: Option<String>,
    #[serde(rename = "SYL_Y", default)]
    one_month: Option<serde_json::Value>,
    #[serde(rename = "SYL_3Y", default)]
    three_month: Option<serde_json::Value>,
    #[serde(rename = "SYL_1N", default)]
    one_year: Option<serde_json::Value>,
    #[serde(rename = "RZDF", default)]
    daily_change: Option<serde_json::Value>,
    #[serde(rename = "DWJZ", default)]
    unit_net_value: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Data", default)]
    data: Option<HistoryData>,
    #[serde(rename = "TotalCount", default)]
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "LSJZList", default)]
    rows: Vec<HistoryRow>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "FSRQ", default)]
    date: Option<String>,
    #[serde(rename = "DWJZ", default)]
    unit_net_value: Option<String>,
    #[serde(rename = "LJJZ", default)]
    cumulative_net_value: Option<String>,
    #[serde(rename = "JZZZL", default)]
    change_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Datas", default)]
    datas: Vec<SearchRow>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    #[serde(rename = "CODE", default)]
    code: Option<String>,
    #[serde(rename = "NAME", default)]
    name: Option<String>,
    #[serde(rename = "CATEGORYDESC", default)]
    category: Option<String>,
}

/// Provider backed by the public Eastmoney endpoints.
pub struct EastmoneyProvider {
    client: Client,
    config: ProviderConfig,
}

impl EastmoneyProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .user_agent(HISTORY_USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, MarketDataError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::provider(PROVIDER_ID, e)
                }
            })?;

        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP error: {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e))
    }

    /// Extracts the JSON payload from a JSONP body: everything between the
    /// first `(` and the last `)`, with a trailing `;` stripped.
    fn extract_jsonp(body: &str) -> Option<&str> {
        let start = body.find('(')?;
        let end = body.rfind(')')?;
        if end <= start {
            return None;
        }
        Some(body[start + 1..end].trim_end_matches(';'))
    }

    fn quote_from_payload(fund_code: &str, payload: &str) -> Option<ValuationQuote> {
        let raw: GzQuote = match serde_json::from_str(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("unparseable valuation payload for {}: {}", fund_code, e);
                return None;
            }
        };

        Some(ValuationQuote {
            fund_code: raw.fundcode.unwrap_or_else(|| fund_code.to_string()),
            fund_name: raw.name.unwrap_or_default(),
            net_value_date: raw.jzrq,
            unit_net_value: raw.dwjz.as_deref().and_then(parse_decimal),
            estimate_net_value: raw.gsz.as_deref().and_then(parse_decimal),
            estimate_change_rate: raw.gszzl.as_deref().and_then(parse_decimal),
            estimate_time: raw.gztime,
        })
    }

    fn returns_url(&self, fund_code: &str) -> String {
        format!(
            "{}/FundMApi/FundBaseTypeInformation.ashx?FCODE={}&deviceid=Wap&plat=Wap&product=EFund&version=2.0.0&Uid=",
            self.config.mobile_api_base_url, fund_code
        )
    }

    async fn fetch_base_info(
        &self,
        fund_code: &str,
        timeout: Duration,
    ) -> Result<Option<BaseInfoDatas>, MarketDataError> {
        let body = self.get_text(&self.returns_url(fund_code), timeout).await?;
        let parsed: BaseInfoResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::malformed(PROVIDER_ID, e))?;
        Ok(parsed.datas)
    }

    fn returns_from_datas(fund_code: &str, datas: Option<&BaseInfoDatas>) -> FundReturns {
        let Some(datas) = datas else {
            return FundReturns::empty(fund_code);
        };
        let field = |value: &Option<serde_json::Value>| {
            value
                .as_ref()
                .and_then(decimal_from_value)
                .unwrap_or_default()
        };
        FundReturns {
            fund_code: fund_code.to_string(),
            one_month_rate: field(&datas.one_month),
            three_month_rate: field(&datas.three_month),
            one_year_rate: field(&datas.one_year),
            daily_change_rate: field(&datas.daily_change),
            as_of_date: datas.fsrq.clone().unwrap_or_default(),
        }
    }

    /// Pages through the NAV history endpoint, newest first, skipping rows
    /// without a published NAV (holidays), until the reported total or the
    /// row cap is reached.
    async fn fetch_nav_series(&self, fund_code: &str) -> Result<Vec<NavRecord>, MarketDataError> {
        let mut records: Vec<NavRecord> = Vec::new();
        let mut page_index = 1usize;

        loop {
            let url = format!(
                "{}/f10/lsjz?fundCode={}&pageIndex={}&pageSize={}",
                self.config.history_api_base_url, fund_code, page_index, HISTORY_PAGE_SIZE
            );
            let referer = format!("https://fundf10.eastmoney.com/jjjz_{}.html", fund_code);

            let response = self
                .client
                .get(&url)
                .header(reqwest::header::REFERER, referer)
                .timeout(HISTORY_PAGE_TIMEOUT)
                .send()
                .await
                .map_err(|e| MarketDataError::provider(PROVIDER_ID, e))?;
            let parsed: HistoryResponse = response
                .json()
                .await
                .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e))?;

            let Some(data) = parsed.data else {
                break;
            };
            if data.rows.is_empty() {
                break;
            }

            for row in data.rows {
                let Some(raw_nav) = row.unit_net_value.as_deref() else {
                    continue;
                };
                let Some(unit_net_value) = parse_decimal(raw_nav) else {
                    continue;
                };
                let Some(date) = row
                    .date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                else {
                    warn!("skipping NAV row with bad date for {}", fund_code);
                    continue;
                };
                records.push(NavRecord {
                    date,
                    unit_net_value,
                    cumulative_net_value: row.cumulative_net_value.as_deref().and_then(parse_decimal),
                    change_rate: row.change_rate.as_deref().and_then(parse_decimal),
                });
            }

            if records.len() >= parsed.total_count || records.len() >= HISTORY_MAX_ROWS {
                break;
            }
            page_index += 1;
        }

        Ok(records)
    }
}

#[async_trait]
impl FundDataProvider for EastmoneyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_valuation(
        &self,
        fund_code: &str,
    ) -> Result<Option<ValuationQuote>, MarketDataError> {
        let url = format!("{}/{}.js", self.config.valuation_base_url, fund_code);
        let body = self.get_text(&url, VALUATION_TIMEOUT).await?;

        let Some(payload) = Self::extract_jsonp(&body) else {
            return Ok(None);
        };
        Ok(Self::quote_from_payload(fund_code, payload))
    }

    async fn fetch_returns(&self, fund_code: &str) -> FundReturns {
        match self.fetch_base_info(fund_code, RETURNS_TIMEOUT).await {
            Ok(datas) => Self::returns_from_datas(fund_code, datas.as_ref()),
            Err(e) => {
                warn!("returns fetch failed for {}: {}", fund_code, e);
                FundReturns::empty(fund_code)
            }
        }
    }

    async fn fetch_history(&self, fund_code: &str, depth: HistoryDepth) -> FundHistory {
        let timeout = match depth {
            HistoryDepth::ReturnsOnly => RETURNS_ONLY_TIMEOUT,
            HistoryDepth::Full => RETURNS_TIMEOUT,
        };

        let datas = match self.fetch_base_info(fund_code, timeout).await {
            Ok(datas) => datas,
            Err(e) => {
                warn!("history fetch failed for {}: {}", fund_code, e);
                return FundHistory::empty(fund_code);
            }
        };
        let returns = Self::returns_from_datas(fund_code, datas.as_ref());
        let unit_net_value = datas
            .as_ref()
            .and_then(|d| d.unit_net_value.as_ref())
            .and_then(decimal_from_value);

        let net_values = match depth {
            HistoryDepth::ReturnsOnly => Vec::new(),
            HistoryDepth::Full => match self.fetch_nav_series(fund_code).await {
                Ok(records) => records,
                Err(e) => {
                    // Mirror the all-or-nothing contract: a failed series
                    // fetch degrades the whole result to the empty default.
                    warn!("NAV series fetch failed for {}: {}", fund_code, e);
                    return FundHistory::empty(fund_code);
                }
            },
        };

        FundHistory {
            returns,
            unit_net_value,
            net_values,
        }
    }

    async fn search(&self, keyword: &str) -> Result<Vec<FundSearchHit>, MarketDataError> {
        let url = format!(
            "{}/FundSearch/api/FundSearchAPI.ashx?m=1&key={}",
            self.config.search_base_url, keyword
        );
        let body = self.get_text(&url, RETURNS_TIMEOUT).await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::malformed(PROVIDER_ID, e))?;

        let hits = parsed
            .datas
            .into_iter()
            .filter_map(|row| {
                Some(FundSearchHit {
                    fund_code: row.code?,
                    fund_name: row.name?,
                    fund_type: row.category.unwrap_or_else(|| "未知".to_string()),
                })
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn extract_jsonp_strips_callback_and_semicolon() {
        let body = r#"jsonpgz({"fundcode":"000001","dwjz":"1.0234"});"#;
        let payload = EastmoneyProvider::extract_jsonp(body).unwrap();
        assert_eq!(payload, r#"{"fundcode":"000001","dwjz":"1.0234"}"#);
    }

    #[test]
    fn extract_jsonp_spans_nested_parens() {
        let body = r#"cb({"name":"混合(C类)"});"#;
        let payload = EastmoneyProvider::extract_jsonp(body).unwrap();
        assert_eq!(payload, r#"{"name":"混合(C类)"}"#);
    }

    #[test]
    fn extract_jsonp_rejects_bodies_without_wrapper() {
        assert!(EastmoneyProvider::extract_jsonp("").is_none());
        assert!(EastmoneyProvider::extract_jsonp("no callback here").is_none());
        assert!(EastmoneyProvider::extract_jsonp(")(").is_none());
    }

    #[test]
    fn quote_parses_all_fields() {
        let payload = r#"{"fundcode":"000001","name":"华夏成长混合","jzrq":"2024-03-07",
            "dwjz":"1.0340","gsz":"1.0412","gszzl":"0.70","gztime":"2024-03-08 14:59"}"#;
        let quote = EastmoneyProvider::quote_from_payload("000001", payload).unwrap();

        assert_eq!(quote.fund_code, "000001");
        assert_eq!(quote.fund_name, "华夏成长混合");
        assert_eq!(quote.net_value_date.as_deref(), Some("2024-03-07"));
        assert_eq!(quote.unit_net_value, Some(dec!(1.0340)));
        assert_eq!(quote.estimate_net_value, Some(dec!(1.0412)));
        assert_eq!(quote.estimate_change_rate, Some(dec!(0.70)));
    }

    #[test]
    fn quote_tolerates_missing_fields() {
        let quote = EastmoneyProvider::quote_from_payload("000001", r#"{"dwjz":""}"#).unwrap();
        assert_eq!(quote.fund_code, "000001");
        assert_eq!(quote.unit_net_value, None);
        assert_eq!(quote.estimate_change_rate, None);
    }

    #[test]
    fn quote_rejects_garbage_payload() {
        assert!(EastmoneyProvider::quote_from_payload("000001", "not json").is_none());
    }

    #[test]
    fn returns_parse_mixed_value_types() {
        let body = r#"{"Datas":{"FSRQ":"2024-03-08","SYL_Y":"1.23","SYL_3Y":4.56,
            "SYL_1N":"12.5","RZDF":"bogus","DWJZ":"1.0340"}}"#;
        let parsed: BaseInfoResponse = serde_json::from_str(body).unwrap();
        let returns = EastmoneyProvider::returns_from_datas("000001", parsed.datas.as_ref());

        assert_eq!(returns.one_month_rate, dec!(1.23));
        assert_eq!(returns.three_month_rate, dec!(4.56));
        assert_eq!(returns.one_year_rate, dec!(12.5));
        // Unparseable fields degrade individually, not collectively.
        assert_eq!(returns.daily_change_rate, Decimal::ZERO);
        assert_eq!(returns.as_of_date, "2024-03-08");
    }

    #[test]
    fn returns_without_datas_are_empty() {
        let parsed: BaseInfoResponse = serde_json::from_str("{}").unwrap();
        let returns = EastmoneyProvider::returns_from_datas("000001", parsed.datas.as_ref());
        assert!(returns.is_empty());
    }

    #[test]
    fn history_rows_skip_blank_navs() {
        let body = r#"{"Data":{"LSJZList":[
            {"FSRQ":"2024-03-08","DWJZ":"1.0340","LJJZ":"2.1","JZZZL":"0.5"},
            {"FSRQ":"2024-03-09","DWJZ":"","LJJZ":"","JZZZL":""}
        ]},"TotalCount":2}"#;
        let parsed: HistoryResponse = serde_json::from_str(body).unwrap();
        let rows = parsed.data.unwrap().rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(parse_decimal(rows[1].unit_net_value.as_deref().unwrap()), None);
    }
}
