//! JSON backup format: a plain array of invoice records.
//!
//! The same encoding is used for the local store's invoices key, so a backup
//! file is byte-for-byte what the local store holds.

use serde_json::Value;
use thiserror::Error;

use salesbook_invoicing::Invoice;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("backup must be a JSON array of invoices")]
    NotAnArray,

    #[error("backup contains an invalid invoice record: {0}")]
    InvalidRecord(#[source] serde_json::Error),
}

/// Compact JSON array, order preserved.
pub fn encode(invoices: &[Invoice]) -> Result<String, serde_json::Error> {
    serde_json::to_string(invoices)
}

pub fn decode(json: &str) -> Result<Vec<Invoice>, BackupError> {
    let value: Value = serde_json::from_str(json).map_err(BackupError::Parse)?;
    if !value.is_array() {
        return Err(BackupError::NotAnArray);
    }
    serde_json::from_value(value).map_err(BackupError::InvalidRecord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use salesbook_core::Money;
    use salesbook_invoicing::{Governorate, InvoiceDraft};

    fn sample(id: &str, customer: &str, purchase: Option<Money>) -> Invoice {
        let mut d = InvoiceDraft::new(format!("INV-{id}"), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        d.customer_name = customer.to_string();
        d.product_name = "Abaya".to_string();
        d.quantity = 2;
        d.price = Money::from_minor(34950);
        d.purchase_price = purchase;
        d.shipping_cost = Money::from_units(45);
        d.governorate = Some(Governorate::Sohag);
        d.company_logo = Some("data:image/png;base64,iVBORw0KGgo=".to_string());
        Invoice::issue(id.parse().unwrap(), d).unwrap()
    }

    #[test]
    fn roundtrip_is_identical_and_order_preserving() {
        let invoices = vec![
            sample("3", "Salma", Some(Money::from_units(200))),
            sample("1", "Omar", None),
            sample("2", "نور", Some(Money::ZERO)),
        ];
        let encoded = encode(&invoices).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, invoices);
        assert_eq!(encode(&decoded).unwrap(), encoded);
    }

    #[test]
    fn zero_purchase_price_stays_distinct_from_unset() {
        let decoded = decode(&encode(&[sample("1", "A", Some(Money::ZERO))]).unwrap()).unwrap();
        assert_eq!(decoded[0].purchase_price(), Some(Money::ZERO));
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(decode(r#"{"id":"1"}"#), Err(BackupError::NotAnArray)));
        assert!(matches!(decode("42"), Err(BackupError::NotAnArray)));
        assert!(matches!(decode("not json"), Err(BackupError::Parse(_))));
        assert!(matches!(decode(r#"[{"id":"1"}]"#), Err(BackupError::InvalidRecord(_))));
    }

    fn record_with(id: &str, price: &str) -> String {
        format!(
            r#"[{{"id":{id},"invoiceNumber":"INV-1","customerName":"A","orderDate":"2024-01-02",
                "productName":"P","quantity":2,"price":{price}}}]"#
        )
    }

    #[test]
    fn out_of_range_amounts_are_invalid_records() {
        let json = record_with(r#""big""#, r#""50000000000000000000000000000""#);
        assert!(matches!(decode(&json), Err(BackupError::InvalidRecord(_))));
    }

    #[test]
    fn unsafe_ids_are_invalid_records() {
        for id in [r#""""#, r#""a/b""#, r#""../x""#, r#""x?print=silent""#] {
            let json = record_with(id, "10");
            assert!(matches!(decode(&json), Err(BackupError::InvalidRecord(_))), "{id}");
        }
        assert_eq!(decode(&record_with(r#""legacy_7""#, "10")).unwrap().len(), 1);
    }

    #[test]
    fn long_fractions_survive_the_roundtrip() {
        let mut invoice = sample("1", "A", None).to_draft();
        invoice.price = "0.1234567890123456789".parse().unwrap();
        let invoices = vec![Invoice::issue("1".parse().unwrap(), invoice).unwrap()];
        assert_eq!(decode(&encode(&invoices).unwrap()).unwrap(), invoices);
    }

    #[test]
    fn empty_array_is_a_valid_backup() {
        assert!(decode("[]").unwrap().is_empty());
    }
}
