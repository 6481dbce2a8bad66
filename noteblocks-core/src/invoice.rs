//! Lightning invoice model and BOLT-11 decoding
//!
//! An invoice block carries a denormalized view of the fields renderers care
//! about (description, amount, expiry, payment hash, timestamp) plus the
//! original encoded string, which is the block's identity. Equality ignores
//! the denormalized fields entirely.

use bitcoin_hashes::Hash as _;
use lightning_invoice::{Bolt11Invoice, Bolt11InvoiceDescription};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Invoiced amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    /// No amount field; the payer picks
    Any,
    /// A specific amount in millisatoshis
    Specific(i64),
}

impl Amount {
    /// The specific amount in millisatoshis, if there is one
    pub fn msats(&self) -> Option<i64> {
        match self {
            Amount::Any => None,
            Amount::Specific(msats) => Some(*msats),
        }
    }
}

/// Invoice description, literal or hashed
///
/// BOLT-11 invoices carry either the description text itself or a 32-byte
/// hash of it when the literal was elided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceDescription {
    Description(String),
    DescriptionHash(#[serde(with = "hex::serde")] [u8; 32]),
}

/// A decoded lightning invoice, generic over the amount representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LnInvoice<A> {
    /// Description text or its hash
    pub description: InvoiceDescription,
    /// Invoiced amount
    pub amount: A,
    /// The original encoded invoice string; the value's identity
    pub string: String,
    /// Expiry relative to `created_at`, in seconds
    pub expiry: u64,
    /// Payment hash
    #[serde(with = "hex::serde")]
    pub payment_hash: [u8; 32],
    /// Creation timestamp, seconds since the unix epoch
    pub created_at: u64,
}

/// The invoice shape carried by blocks
pub type Invoice = LnInvoice<Amount>;

/// Identity is the encoded string; amount and description are denormalized
/// and excluded.
impl<A> PartialEq for LnInvoice<A> {
    fn eq(&self, other: &Self) -> bool {
        self.string == other.string
    }
}

impl<A> Eq for LnInvoice<A> {}

impl Invoice {
    /// Decode a BOLT-11 invoice string
    ///
    /// Returns `None` on any parse, checksum, or signature failure. A
    /// successfully parsed invoice always yields a description (literal or
    /// hash) and a payment hash, so a `Some` result satisfies the block
    /// model's presence invariant.
    ///
    /// # Example
    ///
    /// ```
    /// use noteblocks_core::Invoice;
    ///
    /// assert!(Invoice::from_bolt11("lnbc1notaninvoice").is_none());
    /// ```
    pub fn from_bolt11(s: &str) -> Option<Invoice> {
        let invoice = Bolt11Invoice::from_str(s).ok()?;

        let description = match invoice.description() {
            Bolt11InvoiceDescription::Direct(d) => {
                InvoiceDescription::Description(d.to_string())
            }
            Bolt11InvoiceDescription::Hash(h) => {
                InvoiceDescription::DescriptionHash(h.0.to_byte_array())
            }
        };

        let amount = match invoice.amount_milli_satoshis() {
            Some(msats) => Amount::Specific(msats as i64),
            None => Amount::Any,
        };

        Some(LnInvoice {
            description,
            amount,
            string: s.to_string(),
            expiry: invoice.expiry_time().as_secs(),
            payment_hash: invoice.payment_hash().to_byte_array(),
            created_at: invoice.duration_since_epoch().as_secs(),
        })
    }
}
