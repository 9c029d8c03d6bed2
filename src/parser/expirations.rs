use scraper::{Html, Selector};

/// Every selectable expiration timestamp on a symbol's landing page, in
/// document order. No deduplication: a value listed twice is fetched
/// twice, and the sink's unique index rejects the duplicate rows.
pub fn extract_expirations(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let option_sel = Selector::parse("select option").unwrap();
    doc.select(&option_sel)
        .filter_map(|opt| opt.value().attr("value"))
        .map(str::to_string)
        .collect()
}

/// Chain-page URL for one expiration of an already-fetched landing page.
pub fn chain_url(landing_url: &str, expiration: &str) -> String {
    format!("{}?date={}", landing_url, expiration)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn extracts_timestamps_in_document_order() {
        let expirations = extract_expirations(&fixture("landing"));
        assert_eq!(expirations, vec!["1576195200", "1578614400"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let html = r#"<select>
            <option value="1576195200">December 13, 2019</option>
            <option value="1576195200">December 13, 2019</option>
        </select>"#;
        assert_eq!(extract_expirations(html), vec!["1576195200", "1576195200"]);
    }

    #[test]
    fn page_without_selector_yields_nothing() {
        assert!(extract_expirations("<html><body><p>no chain</p></body></html>").is_empty());
    }

    #[test]
    fn chain_url_appends_date_query() {
        assert_eq!(
            chain_url("https://finance.yahoo.com/quote/%5ESPX/options", "1576195200"),
            "https://finance.yahoo.com/quote/%5ESPX/options?date=1576195200"
        );
    }
}
