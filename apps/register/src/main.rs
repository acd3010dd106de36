//! # Meridian Register Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meridian Register                                │
//! │                                                                         │
//! │  main.rs ────► tokio runtime, exit code                                 │
//! │  lib.rs  ────► flags, logging, config, session, command loop            │
//! │                                                                         │
//! │  stdin  ──► commands ──► meridian-core (order, pricing, promotions)     │
//! │                     └──► meridian-client (reference data, create sale)  │
//! │  stdout ◄── cart view / receipt                                         │
//! │  stderr ◄── tracing                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#[tokio::main]
async fn main() {
    if let Err(e) = meridian_register_lib::run().await {
        eprintln!("meridian-register: {}", e);
        std::process::exit(1);
    }
}
