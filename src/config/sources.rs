// src/config/sources.rs
//! Per-source upstream definitions and the built-in defaults for the two
//! news platforms.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::{build_chain, EndpointSpec};
use crate::ingest::fields::FieldChain;
use crate::ingest::types::Feed;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_timeout_ms() -> u64 {
    8_000
}
fn default_min_content_chars() -> usize {
    1
}

/// Which canonical field receives the item's numeric signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    #[default]
    ReadCount,
    Importance,
}

/// Field-fallback chains used by the record mapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub id: FieldChain,
    pub time: FieldChain,
    pub content: FieldChain,
    pub link: FieldChain,
    pub signal: FieldChain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Query value selecting this source, e.g. "cailian".
    pub platform: String,
    /// Display name copied into every record.
    pub name: String,
    /// Id prefix, e.g. "cl".
    pub tag: String,
    pub base_url: String,
    /// Hosts serving the same paths, tried after every primary path failed.
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub latest: Vec<String>,
    pub hottest: Vec<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Record link when the item has none; `{id}` is replaced by the upstream id.
    pub url_template: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub signal: SignalKind,
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Run the importance selector over the hottest feed.
    #[serde(default)]
    pub rank_hottest: bool,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn paths(&self, feed: Feed) -> &[String] {
        match feed {
            Feed::Latest => &self.latest,
            Feed::Hottest => &self.hottest,
        }
    }

    /// Endpoint chain for one feed: primary host first, then mirrors.
    pub fn chain(&self, feed: Feed) -> Vec<EndpointSpec> {
        let headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        build_chain(
            &self.base_url,
            &self.mirrors,
            self.paths(feed),
            &headers,
            self.timeout(),
        )
    }

    pub fn link_for(&self, upstream_id: Option<&str>) -> String {
        self.url_template.replace("{id}", upstream_id.unwrap_or_default())
    }
}

fn headers(referer: &str, origin: &str, extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut h: BTreeMap<String, String> = [
        ("User-Agent", BROWSER_UA),
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
        ("Referer", referer),
        ("Origin", origin),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    h.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    h
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Cailian Press telegraph feed.
pub fn cailian() -> SourceConfig {
    SourceConfig {
        platform: "cailian".into(),
        name: "财联社".into(),
        tag: "cl".into(),
        base_url: "https://www.cls.cn".into(),
        mirrors: Vec::new(),
        latest: paths(&[
            "/nodeapi/telegraphs?refresh_type=1&rn=10&last_time=0",
            "/telegraph/api/roll_news?refresh_type=1&rn=10&last_time=0",
            "/api/telegraph?type=1&limit=10",
        ]),
        hottest: paths(&[
            "/nodeapi/hottelegraphs?rn=10",
            "/nodeapi/telegraphs?refresh_type=2&rn=10&last_time=0",
            "/telegraph/api/hot_news?limit=10",
        ]),
        headers: headers(
            "https://www.cls.cn/telegraph",
            "https://www.cls.cn",
            &[("X-Requested-With", "XMLHttpRequest")],
        ),
        timeout_ms: default_timeout_ms(),
        url_template: "https://www.cls.cn/detail/{id}".into(),
        fields: FieldMap {
            id: FieldChain::new(["id", "newsId"]),
            time: FieldChain::new(["ctime", "time", "createTime"]),
            content: FieldChain::new(["content", "title", "brief"]),
            link: FieldChain::new(["shareurl", "url"]),
            signal: FieldChain::new(["read_count", "readCount", "readNum"]),
        },
        signal: SignalKind::ReadCount,
        min_content_chars: 6,
        rank_hottest: false,
    }
}

/// Wallstreetcn live feed.
pub fn wallstreetcn() -> SourceConfig {
    SourceConfig {
        platform: "wallstreetcn".into(),
        name: "华尔街见闻".into(),
        tag: "wscn".into(),
        base_url: "https://api-one-wscn.awtmt.com".into(),
        mirrors: vec![
            "https://wallstreetcn.com".into(),
            "https://api.wallstreetcn.com".into(),
        ],
        latest: paths(&[
            "/apiv1/content/lives?channel=global&client=pc&limit=10&order=time",
            "/apiv1/content/articles?channel=global&limit=10&order=publish_time",
        ]),
        hottest: paths(&[
            "/apiv1/content/lives?channel=global&client=pc&limit=20&order=popularity",
            "/apiv1/content/lives?channel=global&client=pc&limit=20&importance=1",
        ]),
        headers: headers("https://wallstreetcn.com/", "https://wallstreetcn.com", &[]),
        timeout_ms: default_timeout_ms(),
        url_template: "https://wallstreetcn.com/articles/{id}".into(),
        fields: FieldMap {
            id: FieldChain::new(["id"]),
            time: FieldChain::new(["display_time"]),
            content: FieldChain::new(["content_text", "title"]),
            link: FieldChain::new(["uri"]),
            signal: FieldChain::new(["importance"]),
        },
        signal: SignalKind::Importance,
        min_content_chars: 1,
        rank_hottest: true,
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    vec![cailian(), wallstreetcn()]
}
