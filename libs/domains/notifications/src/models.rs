//! Template data for outgoing email.

use serde::Serialize;

/// Data for the registration / email-change confirmation message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailConfirmationData {
    pub email: String,
    pub confirmation_url: String,
}

/// One line of an order receipt. Money is in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub product: String,
    pub shop: String,
    pub quantity: i64,
    pub price: i64,
    pub total_price: i64,
}

/// Summary of a confirmed order, sent to the buyer and the store operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub buyer_email: String,
    pub lines: Vec<ReceiptLine>,
    pub total_sum: i64,
}

impl OrderReceipt {
    /// Builds a receipt whose total is the sum of its line totals.
    pub fn new(order_id: i64, buyer_email: impl Into<String>, lines: Vec<ReceiptLine>) -> Self {
        let total_sum = lines.iter().map(|l| l.total_price).sum();
        Self {
            order_id,
            buyer_email: buyer_email.into(),
            lines,
            total_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_total_is_sum_of_lines() {
        let receipt = OrderReceipt::new(
            7,
            "buyer@example.com",
            vec![
                ReceiptLine {
                    product: "Phone".to_string(),
                    shop: "Svyaznoy".to_string(),
                    quantity: 2,
                    price: 110,
                    total_price: 220,
                },
                ReceiptLine {
                    product: "Case".to_string(),
                    shop: "Svyaznoy".to_string(),
                    quantity: 1,
                    price: 15,
                    total_price: 15,
                },
            ],
        );

        assert_eq!(receipt.total_sum, 235);
    }
}
