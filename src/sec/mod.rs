// src/sec/mod.rs
//! SEC EDGAR 13F holdings lookup.
//!
//! submissions JSON → latest 13F-HR accession → information table XML,
//! falling back to the filing's full-text rendition.

pub mod holdings;

use std::fmt;
use std::time::Duration;

use metrics::counter;
use serde_json::Value;

use crate::config::SecConfig;
use crate::error::SecError;
use crate::fetch::{fetch_with_fallback, EndpointSpec, Expect, HttpTransport, RawPayload};
pub use holdings::{parse_holdings, Holding};

pub const FORM_13F_HR: &str = "13F-HR";

/// Central Index Key, at most ten digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cik(u64);

impl Cik {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() || s.len() > 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().filter(|n| *n > 0).map(Cik)
    }

    /// Zero-padded to ten digits, as the submissions API expects.
    pub fn padded(&self) -> String {
        format!("{:010}", self.0)
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accession number of the first 13F-HR in `filings.recent`
/// (EDGAR lists recent filings newest first).
pub fn latest_13f_accession(submissions: &Value) -> Result<Option<String>, SecError> {
    let recent = submissions
        .pointer("/filings/recent")
        .ok_or(SecError::MalformedSubmissions)?;
    let forms = recent
        .get("form")
        .and_then(Value::as_array)
        .ok_or(SecError::MalformedSubmissions)?;
    let accessions = recent
        .get("accessionNumber")
        .and_then(Value::as_array)
        .ok_or(SecError::MalformedSubmissions)?;

    Ok(forms
        .iter()
        .position(|f| f.as_str() == Some(FORM_13F_HR))
        .and_then(|i| accessions.get(i))
        .and_then(Value::as_str)
        .map(str::to_string))
}

pub struct SecClient<'a> {
    transport: &'a dyn HttpTransport,
    cfg: &'a SecConfig,
    backoff: Duration,
}

impl<'a> SecClient<'a> {
    pub fn new(transport: &'a dyn HttpTransport, cfg: &'a SecConfig, backoff: Duration) -> Self {
        Self {
            transport,
            cfg,
            backoff,
        }
    }

    fn endpoint(&self, url: String) -> EndpointSpec {
        EndpointSpec::get(url, self.cfg.timeout())
            .with_headers([("User-Agent", self.cfg.user_agent.as_str())])
    }

    pub fn submissions_url(&self, cik: Cik) -> String {
        format!(
            "{}/submissions/CIK{}.json",
            self.cfg.submissions_base.trim_end_matches('/'),
            cik.padded()
        )
    }

    /// Information table first, then the full-text filing.
    pub fn holdings_chain(&self, cik: Cik, accession: &str) -> Vec<EndpointSpec> {
        let folder = format!(
            "{}/Archives/edgar/data/{}/{}",
            self.cfg.archives_base.trim_end_matches('/'),
            cik,
            accession.replace('-', "")
        );
        vec![
            self.endpoint(format!("{folder}/form13fInfoTable.xml")),
            self.endpoint(format!("{folder}/{accession}.txt")),
        ]
    }

    pub async fn holdings_for_cik(&self, cik: Cik) -> Result<Vec<Holding>, SecError> {
        let submissions = fetch_with_fallback(
            self.transport,
            &[self.endpoint(self.submissions_url(cik))],
            Expect::Json,
            self.backoff,
        )
        .await
        .map_err(SecError::Submissions)?;

        let RawPayload::Json(submissions) = submissions else {
            return Err(SecError::MalformedSubmissions);
        };
        let accession = latest_13f_accession(&submissions)?.ok_or_else(|| SecError::NoFiling {
            cik: cik.to_string(),
        })?;
        tracing::info!(target: "sec", %cik, %accession, "found latest 13F-HR");

        let body = fetch_with_fallback(
            self.transport,
            &self.holdings_chain(cik, &accession),
            Expect::Text,
            self.backoff,
        )
        .await
        .map_err(SecError::Holdings)?
        .into_text();

        let holdings = parse_holdings(&body);
        counter!("sec_holdings_total").increment(holdings.len() as u64);
        tracing::info!(target: "sec", %cik, count = holdings.len(), "parsed holdings");
        Ok(holdings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpReply, ScriptedTransport};
    use serde_json::json;

    const TABLE: &str = "<infoTable><nameOfIssuer>APPLE INC</nameOfIssuer><value>10</value>\
                         <shrsOrPrnAmt><sshPrnamt>5</sshPrnamt><sshPrnamtType>SH</sshPrnamtType>\
                         </shrsOrPrnAmt></infoTable>";

    fn submissions() -> Value {
        json!({
            "cik": "1067983",
            "filings": { "recent": {
                "form": ["4", "13F-HR", "13F-HR"],
                "accessionNumber": ["0000-1", "0000950123-24-008740", "0000950123-23-000001"]
            }}
        })
    }

    #[test]
    fn cik_parsing_and_padding() {
        let c = Cik::parse(" 1067983 ").unwrap();
        assert_eq!(c.padded(), "0001067983");
        assert_eq!(c.to_string(), "1067983");
        assert_eq!(Cik::parse("0001067983"), Some(c));
        assert!(Cik::parse("").is_none());
        assert!(Cik::parse("12a").is_none());
        assert!(Cik::parse("12345678901").is_none());
        assert!(Cik::parse("0").is_none());
    }

    #[test]
    fn picks_first_13f_hr() {
        assert_eq!(
            latest_13f_accession(&submissions()).unwrap().as_deref(),
            Some("0000950123-24-008740")
        );
        let none = json!({"filings": {"recent": {"form": ["10-K"], "accessionNumber": ["x"]}}});
        assert_eq!(latest_13f_accession(&none).unwrap(), None);
        assert!(matches!(
            latest_13f_accession(&json!({})),
            Err(SecError::MalformedSubmissions)
        ));
    }

    #[tokio::test]
    async fn falls_back_to_full_text_filing() {
        let cfg = SecConfig::default();
        let folder = "https://www.sec.gov/Archives/edgar/data/1067983/000095012324008740";
        let t = ScriptedTransport::new()
            .json(
                "https://data.sec.gov/submissions/CIK0001067983.json",
                submissions(),
            )
            .reply(&format!("{folder}/form13fInfoTable.xml"), HttpReply::status(404))
            .reply(
                &format!("{folder}/0000950123-24-008740.txt"),
                HttpReply::ok(format!("<SEC-DOCUMENT>\n{TABLE}\n</SEC-DOCUMENT>")),
            );
        let client = SecClient::new(&t, &cfg, Duration::ZERO);
        let h = client
            .holdings_for_cik(Cik::parse("1067983").unwrap())
            .await
            .unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].name_of_issuer, "APPLE INC");
        assert_eq!(t.calls().len(), 3);
    }

    #[tokio::test]
    async fn no_13f_filing_is_an_error() {
        let cfg = SecConfig::default();
        let t = ScriptedTransport::new().json(
            "https://data.sec.gov/submissions/CIK0000000042.json",
            json!({"filings": {"recent": {"form": ["10-K"], "accessionNumber": ["a"]}}}),
        );
        let err = SecClient::new(&t, &cfg, Duration::ZERO)
            .holdings_for_cik(Cik::parse("42").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SecError::NoFiling { ref cik } if cik == "42"));
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let cfg = SecConfig {
            user_agent: "Acme ops@acme.test".into(),
            ..SecConfig::default()
        };
        let t = ScriptedTransport::new();
        let client = SecClient::new(&t, &cfg, Duration::ZERO);
        let chain = client.holdings_chain(Cik::parse("7").unwrap(), "0001-23-4");
        assert_eq!(
            chain[0].url,
            "https://www.sec.gov/Archives/edgar/data/7/0001234/form13fInfoTable.xml"
        );
        assert_eq!(
            chain[1].headers,
            vec![("User-Agent".to_string(), "Acme ops@acme.test".to_string())]
        );
    }
}
