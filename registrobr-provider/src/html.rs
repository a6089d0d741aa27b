//! HTML extraction seam.
//!
//! The session only ever needs two things from a page: one attribute of an
//! element found by id, and the `value` of every `<input>` whose id is a
//! prefix followed by digits. Both are expressed by [`HtmlExtractor`] so the
//! scraping strategy can be swapped without touching the login flow.

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

/// Extracts tokens and record strings from registrar pages.
pub trait HtmlExtractor: Send + Sync {
    /// Value of `attribute` on the first element whose `id` equals `id`.
    fn attribute_by_id(&self, html: &str, id: &str, attribute: &str) -> Option<String>;

    /// `value` of every `<input>` whose id matches `^{id_prefix}[0-9]+`, in
    /// document order.
    fn input_values_with_prefix(&self, html: &str, id_prefix: &str) -> Vec<String>;
}

/// Start tags, e.g. `<input id="rr-0" value="www|A|1.2.3.4">`.
static START_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).ok());

/// `name="value"`, `name='value'` or `name=value`.
static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).ok()
});

/// Regex-based [`HtmlExtractor`]. Good enough for the registrar's server-rendered
/// forms; it does not build a DOM.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexHtmlExtractor;

impl RegexHtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    /// `(tag_name, attributes)` for each start tag in the document.
    fn start_tags(html: &str) -> Vec<(String, Vec<(String, String)>)> {
        let (Some(tag_re), Some(attr_re)) = (START_TAG.as_ref(), ATTRIBUTE.as_ref()) else {
            log::error!("HTML extraction patterns failed to compile");
            return Vec::new();
        };

        tag_re
            .captures_iter(html)
            .map(|caps| {
                let name = caps
                    .get(1)
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .unwrap_or_default();
                let attrs = caps.get(2).map_or_else(Vec::new, |m| {
                    attr_re
                        .captures_iter(m.as_str())
                        .filter_map(|a| {
                            let key = a.get(1)?.as_str().to_ascii_lowercase();
                            let raw = a.get(2).or_else(|| a.get(3)).or_else(|| a.get(4))?;
                            Some((key, decode_html_entities(raw.as_str()).into_owned()))
                        })
                        .collect()
                });
                (name, attrs)
            })
            .collect()
    }
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl HtmlExtractor for RegexHtmlExtractor {
    fn attribute_by_id(&self, html: &str, id: &str, attribute: &str) -> Option<String> {
        let attribute = attribute.to_ascii_lowercase();
        Self::start_tags(html)
            .into_iter()
            .find(|(_, attrs)| attr(attrs, "id") == Some(id))
            .and_then(|(_, attrs)| attr(&attrs, &attribute).map(str::to_string))
    }

    fn input_values_with_prefix(&self, html: &str, id_prefix: &str) -> Vec<String> {
        Self::start_tags(html)
            .into_iter()
            .filter(|(name, _)| name == "input")
            .filter(|(_, attrs)| {
                attr(attrs, "id")
                    .and_then(|id| id.strip_prefix(id_prefix))
                    .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            })
            .filter_map(|(_, attrs)| attr(&attrs, "value").map(str::to_string))
            .collect()
    }
}
