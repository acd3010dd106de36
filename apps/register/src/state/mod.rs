//! # State Module
//!
//! Register state, split by concern the same way commands ask for it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────┐        ┌──────────────────────┐          │
//! │  │      SessionState        │        │     ConfigState      │          │
//! │  │                          │        │                      │          │
//! │  │  Mutex<Order>            │        │  operator, role      │          │
//! │  │  RwLock<ReferenceData>   │        │  currency symbol     │          │
//! │  │  CheckoutSubmitter       │        │  rounding mode       │          │
//! │  └──────────────────────────┘        └──────────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • SessionState: tokio locks, held across awaits where needed          │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::ConfigState;
pub use session::SessionState;
