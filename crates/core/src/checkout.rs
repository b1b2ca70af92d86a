//! Checkout wizard, order status machine, pricing and payment methods.
//!
//! All amounts are integer euro cents. Catalogue prices are gross (German
//! VAT included); the VAT portion is split out for the invoice.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Cents, DbId};

/// German standard VAT rate.
pub const VAT_RATE_PERCENT: i64 = 19;

/// Maximum quantity per order line.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Maximum number of distinct lines per order.
pub const MAX_ORDER_LINES: usize = 50;

/// Highest catalogue price: 1 000 000,00 €.
pub const MAX_PRICE_CENTS: Cents = 100_000_000;

/// Only euro pricing is supported.
pub const CURRENCY_EUR: &str = "EUR";

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The five steps of the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Cart,
    Billing,
    Payment,
    Review,
    Completed,
}

impl CheckoutStep {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "cart" => Ok(Self::Cart),
            "billing" => Ok(Self::Billing),
            "payment" => Ok(Self::Payment),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Ungültiger Checkout-Schritt '{s}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Billing => "billing",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Completed => "completed",
        }
    }

    /// 1-based step number shown in the progress bar.
    pub fn to_number(self) -> u8 {
        match self {
            Self::Cart => 1,
            Self::Billing => 2,
            Self::Payment => 3,
            Self::Review => 4,
            Self::Completed => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cart => "Warenkorb",
            Self::Billing => "Rechnungsadresse",
            Self::Payment => "Zahlungsart",
            Self::Review => "Überprüfen",
            Self::Completed => "Abgeschlossen",
        }
    }

    /// Validate moving from `self` to `to`.
    ///
    /// Forward moves advance exactly one step; backward moves may jump to any
    /// earlier step. Nothing leaves `completed`.
    pub fn validate_transition(self, to: CheckoutStep) -> Result<(), CoreError> {
        if self == Self::Completed {
            return Err(CoreError::Conflict(
                "Die Bestellung ist bereits abgeschlossen".to_string(),
            ));
        }
        let (from_n, to_n) = (self.to_number(), to.to_number());
        if to_n < from_n || to_n == from_n + 1 {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Schritt '{}' kann nicht direkt nach '{}' folgen",
                to.label(),
                self.label()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    AwaitingPayment,
    Paid,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            _ => Err(CoreError::Validation(format!(
                "Ungültiger Bestellstatus '{s}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, AwaitingPayment)
                | (Pending, Paid)
                | (Pending, Cancelled)
                | (AwaitingPayment, Paid)
                | (AwaitingPayment, Cancelled)
                | (Paid, Refunded)
        )
    }

    pub fn validate_transition(self, to: OrderStatus) -> Result<(), CoreError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Bestellstatus kann nicht von '{}' zu '{}' wechseln",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Payment methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    Klarna,
    BankTransfer,
}

/// Result of handing an order to the (simulated) payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    pub status: OrderStatus,
    /// Bank transfer reference (Verwendungszweck) for manual payments.
    pub transfer_reference: Option<String>,
}

impl PaymentMethod {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::Paypal),
            "klarna" => Ok(Self::Klarna),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(CoreError::Validation(format!("Ungültige Zahlungsart '{s}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
            Self::Klarna => "klarna",
            Self::BankTransfer => "bank_transfer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Card => "Kreditkarte",
            Self::Paypal => "PayPal",
            Self::Klarna => "Klarna",
            Self::BankTransfer => "Vorkasse (Überweisung)",
        }
    }

    /// Simulated gateway: instant methods settle immediately, bank transfer
    /// waits for the money to arrive.
    pub fn settle(self, order_id: DbId) -> PaymentOutcome {
        match self {
            Self::BankTransfer => PaymentOutcome {
                status: OrderStatus::AwaitingPayment,
                transfer_reference: Some(transfer_reference(order_id)),
            },
            _ => PaymentOutcome {
                status: OrderStatus::Paid,
                transfer_reference: None,
            },
        }
    }
}

/// Reference customers put on a bank transfer.
pub fn transfer_reference(order_id: DbId) -> String {
    format!("SF-{order_id:08}")
}

// ---------------------------------------------------------------------------
// Billing address
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    pub full_name: String,
    #[serde(default)]
    pub company: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    #[serde(default)]
    pub vat_id: Option<String>,
}

impl BillingAddress {
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("Name", &self.full_name),
            ("Straße", &self.street),
            ("PLZ", &self.postal_code),
            ("Ort", &self.city),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{label} darf nicht leer sein")));
            }
        }

        let country = self.country.trim();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::Validation(format!(
                "Ungültiger Ländercode '{}'. Erwartet z.B. 'DE'",
                self.country
            )));
        }

        let postal = self.postal_code.trim();
        let postal_ok = match country {
            "DE" => postal.len() == 5 && postal.chars().all(|c| c.is_ascii_digit()),
            "AT" | "CH" => postal.len() == 4 && postal.chars().all(|c| c.is_ascii_digit()),
            _ => postal.len() <= 12,
        };
        if !postal_ok {
            return Err(CoreError::Validation(format!(
                "Ungültige Postleitzahl '{}' für {country}",
                self.postal_code
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// One priced order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price_cents: Cents,
    pub quantity: i32,
}

/// Totals for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub subtotal_cents: Cents,
    pub discount_cents: Cents,
    pub total_cents: Cents,
    /// VAT contained in `total_cents`.
    pub vat_cents: Cents,
}

pub fn validate_quantity(quantity: i32) -> Result<(), CoreError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Menge muss zwischen 1 und {MAX_LINE_QUANTITY} liegen"
        )))
    }
}

pub fn validate_price(price_cents: Cents) -> Result<(), CoreError> {
    if price_cents < 0 {
        return Err(CoreError::Validation("Der Preis darf nicht negativ sein".to_string()));
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(CoreError::Validation(format!(
            "Der Preis darf höchstens {} betragen",
            format_eur(MAX_PRICE_CENTS)
        )));
    }
    Ok(())
}

fn total_too_large() -> CoreError {
    CoreError::Validation("Der Bestellwert ist zu hoch".to_string())
}

/// Compute order totals from gross line prices and an optional coupon.
pub fn quote(lines: &[PricedLine], coupon_percent: Option<i64>) -> Result<Quote, CoreError> {
    if lines.is_empty() {
        return Err(CoreError::Validation("Der Warenkorb ist leer".to_string()));
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(CoreError::Validation(format!(
            "Eine Bestellung darf höchstens {MAX_ORDER_LINES} Positionen enthalten"
        )));
    }

    let mut subtotal: Cents = 0;
    for line in lines {
        validate_quantity(line.quantity)?;
        if line.unit_price_cents < 0 {
            return Err(CoreError::Validation("Der Preis darf nicht negativ sein".to_string()));
        }
        subtotal = line
            .unit_price_cents
            .checked_mul(Cents::from(line.quantity))
            .and_then(|amount| subtotal.checked_add(amount))
            .ok_or_else(total_too_large)?;
    }

    let discount = match coupon_percent {
        None => 0,
        Some(p) if (1..=100).contains(&p) => {
            subtotal.checked_mul(p).ok_or_else(total_too_large)? / 100
        }
        Some(p) => {
            return Err(CoreError::Validation(format!(
                "Ungültiger Rabatt von {p}%"
            )))
        }
    };

    let total = subtotal - discount;
    Ok(Quote {
        subtotal_cents: subtotal,
        discount_cents: discount,
        total_cents: total,
        vat_cents: vat_included(total),
    })
}

/// VAT contained in a gross amount, rounded half up to the cent.
pub fn vat_included(gross: Cents) -> Cents {
    let divisor = i128::from(100 + VAT_RATE_PERCENT);
    let vat = (i128::from(gross) * i128::from(VAT_RATE_PERCENT) * 2 + divisor) / (2 * divisor);
    // |vat| < |gross|, so the narrowing cannot fail.
    Cents::try_from(vat).unwrap_or(Cents::MAX)
}

/// Format cents the German way, e.g. `1234` → `"12,34 €"`.
pub fn format_eur(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02} €", abs / 100, abs % 100)
}
