//! Discovery of the endpoint and locale from the embedding page's markup.
//!
//! The host grid renders the current record as a selected row. That row
//! carries the REST link for the resource being planned and, in the
//! `user_language` column, the user's locale code. Nothing here is a formal
//! contract: anything missing leaves the corresponding value unresolved.
//!
//! Resolution is a single pass over a parsed snapshot and keeps no state, so
//! re-running it on the same markup yields the same `HostContext`.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::adapter::ResourceKind;

/// Column id of the grid cell holding the locale code.
pub const LANGUAGE_COLUMN_ID: &str = "user_language";

/// Links containing this are navigation back to the host app, not API links.
pub const LAUNCHER_PAGE_MARKER: &str = "index.html";

/// Attribute carrying the widget license key.
pub const LICENSE_ATTRIBUTE: &str = "data-custom-dev-extreme-license";

static SELECTED_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ag-row-selected").expect("selected row selector"));
static INLINE_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("span selector"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("link selector"));
static LICENSE_HOLDERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[data-custom-dev-extreme-license]").expect("license selector")
});

/// Everything inferred from the host page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostContext {
    /// REST endpoint of the current resource
    pub endpoint: Option<String>,
    /// Locale code of the current user
    pub locale: Option<String>,
    /// Key convention for update URLs, fixed when the endpoint is resolved
    pub resource_kind: ResourceKind,
    /// Widget license key, forwarded untouched
    pub license_key: Option<String>,
}

impl HostContext {
    /// Resolve from markup, keeping hrefs as written.
    pub fn resolve(html: &str) -> Self {
        Self::resolve_with_base(html, None)
    }

    /// Resolve from markup, joining relative hrefs onto `base`.
    pub fn resolve_with_base(html: &str, base: Option<&Url>) -> Self {
        let document = Html::parse_document(html);
        let mut locale = None;
        let mut endpoint = None;
        let mut rows = 0usize;

        for row in document.select(&SELECTED_ROWS) {
            rows += 1;

            if let Some(code) = row_locale(row) {
                locale = Some(code);
            }

            for link in row.select(&LINKS) {
                if let Some(href) = qualifying_href(link, base) {
                    endpoint = Some(href);
                }
            }
        }

        let license_key = document
            .select(&LICENSE_HOLDERS)
            .filter_map(|el| el.value().attr(LICENSE_ATTRIBUTE))
            .map(str::trim)
            .find(|key| !key.is_empty())
            .map(str::to_string);

        tracing::debug!(
            "Scanned {} selected row(s): endpoint={:?} locale={:?} license={}",
            rows,
            endpoint,
            locale,
            if license_key.is_some() { "present" } else { "absent" }
        );

        Self::from_parts(endpoint, locale, license_key)
    }

    pub fn from_parts(
        endpoint: Option<String>,
        locale: Option<String>,
        license_key: Option<String>,
    ) -> Self {
        let resource_kind = endpoint
            .as_deref()
            .map(ResourceKind::from_endpoint)
            .unwrap_or_default();
        Self {
            endpoint,
            locale,
            resource_kind,
            license_key,
        }
    }

    /// Replace the endpoint (and with it the resource kind).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.resource_kind = ResourceKind::from_endpoint(&endpoint);
        self.endpoint = Some(endpoint);
        self
    }

    /// Use `key` only when the page carried none.
    pub fn with_license_fallback(mut self, key: Option<String>) -> Self {
        if self.license_key.is_none() {
            self.license_key = key.filter(|k| !k.is_empty());
        }
        self
    }

    /// The endpoint, or an empty string when unresolved.
    pub fn endpoint_or_empty(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("")
    }
}

/// First inline text in `row` sitting inside the language column.
fn row_locale(row: ElementRef<'_>) -> Option<String> {
    row.select(&INLINE_TEXT)
        .filter(|span| in_language_column(*span))
        .map(|span| span.text().collect::<String>().trim().to_string())
        .find(|code| !code.is_empty())
}

/// Walk up from `el` to the document root looking for the language column.
fn in_language_column(el: ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        ancestor.value().name() == "div"
            && ancestor.value().attr("col-id") == Some(LANGUAGE_COLUMN_ID)
    })
}

/// The link target, resolved against `base`, unless it is missing or points
/// back to the launcher page.
fn qualifying_href(link: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let raw = link.value().attr("href")?.trim();
    if raw.is_empty() {
        return None;
    }
    let href = match base {
        Some(base) => match base.join(raw) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!("Skipping unresolvable link '{}': {}", raw, e);
                return None;
            }
        },
        None => raw.to_string(),
    };
    if href.contains(LAUNCHER_PAGE_MARKER) {
        None
    } else {
        Some(href)
    }
}
