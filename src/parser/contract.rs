use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Expiration digits inside a contract name, e.g. "201218" -> 2020-12-18.
const EXPIRATION_LAYOUT: &str = "%y%m%d";

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]+").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{1,6}").unwrap());

/// Split a contract name like "SPX201218C03600000" into its underlying
/// symbol and expiration date.
///
/// The symbol is the maximal uppercase-ASCII prefix (empty when the name
/// starts with a digit). The expiration is the first run of up to six
/// digits anywhere in the name, read as YYMMDD; a shorter run fails the
/// date parse and yields None. Names that deviate from the
/// `<SYMBOL><YYMMDD><C|P><strike>` shape may split incorrectly — that is
/// the accepted behavior, pinned by the tests below.
pub fn decode_contract(contract_name: &str) -> (String, Option<NaiveDate>) {
    let symbol = SYMBOL_RE
        .find(contract_name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let expiration = DIGITS_RE
        .find(contract_name)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), EXPIRATION_LAYOUT).ok());

    (symbol, expiration)
}

// ── Tests ──
