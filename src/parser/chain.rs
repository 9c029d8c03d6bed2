use std::sync::atomic::{AtomicUsize, Ordering};

use scraper::{Html, Selector};
use tracing::{info, warn};

use super::record::{build_record, normalize_cell, OptionRecord, OptionType};
use crate::sink::Sink;

/// Extract every option row from a fetched chain page and hand the
/// results to the sink, one batch per table. A calls table and a puts
/// table on the same page produce two batches; a table with no body rows
/// produces no sink call at all.
///
/// Insert failures drop that batch and are logged with the page URL; the
/// rest of the page (and the run) carries on. Returns the number of rows
/// parsed from this page. `total` is the run-wide record counter.
pub fn parse_chain_page(html: &str, url: &str, sink: &dyn Sink, total: &AtomicUsize) -> usize {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut page_rows = 0;
    for table in doc.select(&table_sel) {
        let option_type = if table.value().attr("class") == Some("calls") {
            OptionType::Call
        } else {
            OptionType::Put
        };

        let batch: Vec<OptionRecord> = table
            .select(&row_sel)
            .map(|row| {
                let cells: Vec<String> = row
                    .select(&cell_sel)
                    .map(|td| normalize_cell(td.text().collect::<String>().trim()))
                    .collect();
                build_record(&cells, option_type)
            })
            .collect();

        if batch.is_empty() {
            continue;
        }
        page_rows += batch.len();
        total.fetch_add(batch.len(), Ordering::Relaxed);

        if let Err(e) = sink.insert(&batch) {
            warn!("Dropping batch of {} records from {}: {}", batch.len(), url, e);
        }
    }

    info!(
        "Parsed {} rows from {} ({} records total)",
        page_rows,
        url,
        total.load(Ordering::Relaxed)
    );
    page_rows
}

// ── Tests ──
