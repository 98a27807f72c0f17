//! # Production Adapters
//!
//! Outbound port implementations that talk to the outside world.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `IdentityProvider` | [`StripeIdentityProvider`] |
//! | `FeeLedger` | [`JsonRpcFeeLedger`] |
//! | `VerificationStore` | `RocksDbVerificationStore` (feature `rocksdb`) |

pub mod ledger;
pub mod storage;
pub mod stripe;

pub use ledger::{JsonRpcFeeLedger, LedgerEndpoint};
pub use stripe::StripeIdentityProvider;
