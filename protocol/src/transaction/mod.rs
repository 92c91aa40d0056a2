//! Payment transactions: types, construction, and network submission.
//!
//! Split the same way the flow is: [`types`] is vocabulary, [`builder`]
//! turns a consumed authorization into a [`PaymentTransaction`], and
//! [`client`] is the seam to the network plus the in-process
//! [`DevLedger`].

pub mod builder;
pub mod client;
pub mod types;

pub use builder::{build_payment, lease_for_payload, PaymentTransaction, TX_VERSION};
pub use client::{DevLedger, NetworkClient};
pub use types::{Amount, SubmittedTransaction, TransactionIntent};
