//! Storefront E2E Test Harness
//!
//! This crate drives end-to-end tests of the demo storefront's purchase
//! journey (login, cart, checkout) from Rust:
//! - Spawns a persistent Playwright bridge subprocess per test session
//! - Models each screen as a page object over the driver session
//! - Expands fixture arrays into generated test cases
//! - Captures failure screenshots, visual baselines, and axe-core audits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Suite Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suite                                                       │
//! │    ├── run() -> SuiteResult          bounded worker pool     │
//! │    ├── pre/post hooks                guaranteed post run     │
//! │    └── failure-artifact hook         screenshot on mismatch  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestCase (one fresh DriverSession each)                    │
//! │    ├── LoginPage / CartPage / CheckoutPage                  │
//! │    ├── ResponseWatch { begin, expect }                      │
//! │    ├── check_a11y(session, policy)                          │
//! │    └── VisualBaselines { compare, assert_matches }          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DriverSession ──JSON lines──▶ Node bridge ──▶ Playwright   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod a11y;
pub mod artifacts;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod generator;
pub mod network;
pub mod pages;
pub mod runner;
pub mod scenarios;
pub mod visual;

pub use config::HarnessConfig;
pub use driver::DriverSession;
pub use error::{HarnessError, HarnessResult};
pub use runner::{Suite, SuiteResult, TestCase, TestContext};
