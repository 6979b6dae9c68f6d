// src/sec/holdings.rs
//! Pattern extraction of 13F information-table rows.
//!
//! Supports flat, repeated `<infoTable>` records only: no attribute-borne
//! data, no CDATA. Anything richer needs a real XML parser. The same patterns
//! work on the full-text (.txt) rendition of a filing, which embeds the XML.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One holding row. Values stay textual, as filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub name_of_issuer: String,
    pub value: String,
    pub ssh_prnamt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_prnamt_type: Option<String>,
}

// `(?s)` lets `.` cross newlines; `*?` keeps each match to one block.
// An optional namespace prefix (`ns1:infoTable`) is tolerated.
static RE_INFO_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[A-Za-z_][\w.-]*:)?infoTable>(.*?)</(?:[A-Za-z_][\w.-]*:)?infoTable>")
        .unwrap()
});

fn tag_regex(tag: &str) -> Regex {
    let pattern = format!(
        r"(?s)<(?:[A-Za-z_][\w.-]*:)?{tag}>(.*?)</(?:[A-Za-z_][\w.-]*:)?{tag}>"
    );
    Regex::new(&pattern).unwrap()
}

static RE_NAME: Lazy<Regex> = Lazy::new(|| tag_regex("nameOfIssuer"));
static RE_VALUE: Lazy<Regex> = Lazy::new(|| tag_regex("value"));
static RE_SSH_PRNAMT: Lazy<Regex> = Lazy::new(|| tag_regex("sshPrnamt"));
static RE_SHRS_OR_PRN: Lazy<Regex> = Lazy::new(|| tag_regex("shrsOrPrnAmt"));
static RE_SSH_PRNAMT_TYPE: Lazy<Regex> = Lazy::new(|| tag_regex("sshPrnamtType"));

fn capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_block(block: &str) -> Option<Holding> {
    let name_of_issuer = capture(&RE_NAME, block)?;
    let value = capture(&RE_VALUE, block)?;
    let ssh_prnamt = capture(&RE_SSH_PRNAMT, block)?;
    let ssh_prnamt_type = capture(&RE_SHRS_OR_PRN, block)
        .and_then(|wrapper| capture(&RE_SSH_PRNAMT_TYPE, &wrapper));
    Some(Holding {
        name_of_issuer,
        value,
        ssh_prnamt,
        ssh_prnamt_type,
    })
}

/// All complete holdings in document order; incomplete blocks are skipped.
pub fn parse_holdings(text: &str) -> Vec<Holding> {
    RE_INFO_TABLE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| parse_block(m.as_str()))
        .collect()
}
