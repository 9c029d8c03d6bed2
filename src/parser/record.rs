use chrono::{NaiveDate, NaiveDateTime};

use super::contract::decode_contract;

/// Cell 1 of a chain row, e.g. "2020-12-17 3:59PM EST".
const LAST_TRADE_LAYOUT: &str = "%Y-%m-%d %I:%M%p %Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Call => "C",
            OptionType::Put => "P",
        }
    }
}

/// One chain-table row plus the fields derived from its contract name.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRecord {
    pub contract_name: String,
    pub last_trade: Option<NaiveDateTime>,
    pub strike: f64,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume: i64,
    pub open_interest: i64,
    pub implied_vol: String,
    pub symbol: String,
    pub expiration: Option<NaiveDate>,
    pub option_type: OptionType,
}

/// Prepare a raw cell for numeric parsing: the `-` placeholder becomes
/// empty, thousands-separator commas are stripped. Whitespace is left
/// alone — the last-trade cell needs its internal spaces.
pub fn normalize_cell(raw: &str) -> String {
    if raw == "-" {
        return String::new();
    }
    raw.replace(',', "")
}

/// Build one record from normalized cells. Never fails: unparseable
/// numeric cells come out as zero, unparseable dates as None, missing
/// cells read as empty. Downstream must treat zero as "unparseable or
/// zero", not "traded at zero".
pub fn build_record(cells: &[String], option_type: OptionType) -> OptionRecord {
    let contract_name = cell(cells, 0).to_string();
    let (symbol, expiration) = decode_contract(&contract_name);

    OptionRecord {
        last_trade: NaiveDateTime::parse_from_str(cell(cells, 1), LAST_TRADE_LAYOUT).ok(),
        strike: parse_f64(cell(cells, 2)),
        last_price: parse_f64(cell(cells, 3)),
        bid: parse_f64(cell(cells, 4)),
        ask: parse_f64(cell(cells, 5)),
        volume: parse_i64(cell(cells, 8)),
        open_interest: parse_i64(cell(cells, 9)),
        implied_vol: cell(cells, 10).to_string(),
        contract_name,
        symbol,
        expiration,
        option_type,
    }
}

fn cell(cells: &[String], idx: usize) -> &str {
    cells.get(idx).map(String::as_str).unwrap_or("")
}

fn parse_f64(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

fn parse_i64(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| normalize_cell(c)).collect()
    }

    #[test]
    fn normalize_placeholder_and_commas() {
        assert_eq!(normalize_cell("-"), "");
        assert_eq!(normalize_cell("1,234"), "1234");
        assert_eq!(normalize_cell("1,234,567"), "1234567");
        assert_eq!(normalize_cell(""), "");
        // Whitespace untouched; only a bare dash is a placeholder
        assert_eq!(normalize_cell(" - "), " - ");
        assert_eq!(normalize_cell("2020-12-17 3:59PM EST"), "2020-12-17 3:59PM EST");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["-", "1,234", "", "  12.5 ", "SPX201218C03600000"] {
            let once = normalize_cell(s);
            assert_eq!(normalize_cell(&once), once);
        }
    }

    #[test]
    fn builds_well_formed_row() {
        let cells = row(&[
            "SPX201218C03600000",
            "2020-12-17 3:59PM EST",
            "3,600.00",
            "12.50",
            "12.00",
            "13.00",
            "3,612.50",
            "+0.25",
            "1,024",
            "5,000",
            "21.50%",
        ]);
        let r = build_record(&cells, OptionType::Call);
        assert_eq!(r.contract_name, "SPX201218C03600000");
        assert_eq!(r.symbol, "SPX");
        assert_eq!(r.expiration, NaiveDate::from_ymd_opt(2020, 12, 18));
        assert_eq!(
            r.last_trade,
            NaiveDate::from_ymd_opt(2020, 12, 17).and_then(|d| d.and_hms_opt(15, 59, 0)),
        );
        assert_eq!(r.strike, 3600.0);
        assert_eq!(r.last_price, 12.5);
        assert_eq!(r.bid, 12.0);
        assert_eq!(r.ask, 13.0);
        assert_eq!(r.volume, 1024);
        assert_eq!(r.open_interest, 5000);
        assert_eq!(r.implied_vol, "21.50%");
        assert_eq!(r.option_type, OptionType::Call);
    }

    #[test]
    fn unparseable_strike_zeroes_without_failing() {
        let cells = row(&[
            "AAPL211119P00150000",
            "2021-11-18 2:30PM EST",
            "-",
            "4.20",
            "4.10",
            "4.30",
            "",
            "",
            "312",
            "88",
            "34.00%",
        ]);
        let r = build_record(&cells, OptionType::Put);
        assert_eq!(r.strike, 0.0);
        assert_eq!(r.last_price, 4.2);
        assert_eq!(r.volume, 312);
        assert_eq!(r.symbol, "AAPL");
        assert_eq!(r.expiration, NaiveDate::from_ymd_opt(2021, 11, 19));
    }

    #[test]
    fn short_row_zeroes_missing_cells() {
        let cells = row(&["VIX210120C00020000", "bad date"]);
        let r = build_record(&cells, OptionType::Call);
        assert_eq!(r.last_trade, None);
        assert_eq!(r.strike, 0.0);
        assert_eq!(r.volume, 0);
        assert_eq!(r.implied_vol, "");
        assert_eq!(r.symbol, "VIX");
    }
}
