use serde::Serialize;

use crate::errors::AppError;

/// Largest amount accepted for any single money field (rupiah).
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Expenditure total of a record: the item sum when items exist, otherwise the declared value.
pub fn derive_expenditure<I>(declared: i64, item_amounts: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let mut iter = item_amounts.into_iter().peekable();
    if iter.peek().is_none() {
        declared
    } else {
        iter.sum()
    }
}

/// `saldo_awal + total_pemasukan - total_pengeluaran`, rejected when it leaves the `i64` range.
pub fn closing_balance(saldo_awal: i64, total_pemasukan: i64, total_pengeluaran: i64) -> Result<i64, AppError> {
    saldo_awal
        .checked_add(total_pemasukan)
        .and_then(|v| v.checked_sub(total_pengeluaran))
        .ok_or_else(|| AppError::validation("Sisa saldo is out of range"))
}

/// Push an error when an item-derived expenditure overflows or exceeds [`MAX_AMOUNT`].
pub fn check_item_total<I>(amounts: I, errors: &mut Vec<String>)
where
    I: IntoIterator<Item = i64>,
{
    let total = amounts.into_iter().try_fold(0i64, |acc, n| acc.checked_add(n));
    if !matches!(total, Some(t) if t <= MAX_AMOUNT) {
        errors.push("Total pengeluaran exceeds the maximum amount".to_string());
    }
}

/// Validate a non-negative money field, pushing a message into `errors` on failure.
pub fn check_amount(value: i64, field: &str, errors: &mut Vec<String>) {
    if value < 0 {
        errors.push(format!("{field} must not be negative"));
    } else if value > MAX_AMOUNT {
        errors.push(format!("{field} exceeds the maximum amount"));
    }
}

/// LPJ balances. `sisa_saldo` is recomputed by every setter, so it can never be stale.
/// A setter whose result would leave the `i64` range fails and leaves the ledger unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LpjLedger {
    saldo_awal: i64,
    total_pemasukan: i64,
    total_pengeluaran: i64,
    sisa_saldo: i64,
}

impl LpjLedger {
    pub fn new(saldo_awal: i64, total_pemasukan: i64, total_pengeluaran: i64) -> Result<Self, AppError> {
        Ok(LpjLedger {
            saldo_awal,
            total_pemasukan,
            total_pengeluaran,
            sisa_saldo: closing_balance(saldo_awal, total_pemasukan, total_pengeluaran)?,
        })
    }

    pub fn saldo_awal(&self) -> i64 {
        self.saldo_awal
    }

    pub fn total_pemasukan(&self) -> i64 {
        self.total_pemasukan
    }

    pub fn total_pengeluaran(&self) -> i64 {
        self.total_pengeluaran
    }

    pub fn sisa_saldo(&self) -> i64 {
        self.sisa_saldo
    }

    pub fn set_saldo_awal(&mut self, value: i64) -> Result<(), AppError> {
        self.sisa_saldo = closing_balance(value, self.total_pemasukan, self.total_pengeluaran)?;
        self.saldo_awal = value;
        Ok(())
    }

    pub fn set_total_pemasukan(&mut self, value: i64) -> Result<(), AppError> {
        self.sisa_saldo = closing_balance(self.saldo_awal, value, self.total_pengeluaran)?;
        self.total_pemasukan = value;
        Ok(())
    }

    pub fn set_total_pengeluaran(&mut self, value: i64) -> Result<(), AppError> {
        self.sisa_saldo = closing_balance(self.saldo_awal, self.total_pemasukan, value)?;
        self.total_pengeluaran = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_override_declared_expenditure() {
        assert_eq!(derive_expenditure(300_000, Vec::new()), 300_000);
        assert_eq!(derive_expenditure(300_000, vec![100_000, 50_000]), 150_000);
        assert_eq!(derive_expenditure(300_000, vec![0]), 0);
    }

    #[test]
    fn rab_closing_position_seeds_lpj_opening() {
        assert_eq!(closing_balance(1_000_000, 500_000, 300_000).unwrap(), 1_200_000);
    }

    #[test]
    fn balance_outside_i64_is_an_error() {
        assert!(matches!(closing_balance(i64::MIN + 1, 0, 2), Err(AppError::Validation(_))));
        assert!(matches!(closing_balance(i64::MAX, 1, 0), Err(AppError::Validation(_))));

        // A RAB whose items summed to -9.2e18 as its closing position, then a large LPJ on top
        let rab_closing = -9_200_000_000_000_000_000;
        assert!(LpjLedger::new(rab_closing, 0, 9_200 * MAX_AMOUNT).is_err());

        let mut ledger = LpjLedger::new(i64::MIN + 1, 0, 0).unwrap();
        assert!(ledger.set_total_pengeluaran(MAX_AMOUNT).is_err());
        assert_eq!(ledger.total_pengeluaran(), 0);
        assert_eq!(ledger.sisa_saldo(), i64::MIN + 1);
    }

    #[test]
    fn item_total_is_capped() {
        let mut errors = Vec::new();
        check_item_total(vec![MAX_AMOUNT / 2, MAX_AMOUNT / 2], &mut errors);
        assert!(errors.is_empty());

        // Every item is within the cap but 9200 of them are not
        check_item_total(std::iter::repeat_n(MAX_AMOUNT, 9_200), &mut errors);
        assert_eq!(errors, vec!["Total pengeluaran exceeds the maximum amount".to_string()]);

        check_item_total(vec![i64::MAX, 1], &mut errors);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn ledger_recomputes_on_every_change() {
        let mut ledger = LpjLedger::new(1_200_000, 0, 0).unwrap();
        assert_eq!(ledger.sisa_saldo(), 1_200_000);
        ledger.set_total_pemasukan(200_000).unwrap();
        assert_eq!(ledger.sisa_saldo(), 1_400_000);
        ledger.set_total_pengeluaran(150_000).unwrap();
        assert_eq!(ledger.sisa_saldo(), 1_250_000);
        ledger.set_saldo_awal(1_000_000).unwrap();
        assert_eq!(ledger.sisa_saldo(), 1_050_000);
        ledger.set_total_pengeluaran(150_000).unwrap();
        assert_eq!(ledger.sisa_saldo(), 1_050_000);
    }

    #[test]
    fn amounts_are_checked() {
        let mut errors = Vec::new();
        check_amount(0, "Saldo awal", &mut errors);
        check_amount(-1, "Total pemasukan", &mut errors);
        check_amount(MAX_AMOUNT + 1, "Total pengeluaran", &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Total pemasukan"));
    }
}
