// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! CPF Validation Service
//!
//! This crate exposes a single synchronous validation endpoint: given a
//! Brazilian CPF (an 11-digit taxpayer identifier), it answers whether the
//! identifier is structurally and check-digit valid. The service protects
//! itself from abusive call volume with an in-memory, per-caller
//! fixed-window rate limiter:
//!
//! - Per-caller admission control (10 requests per 60s window by default)
//! - Caller key derived from `X-Forwarded-For` (first value, trimmed)
//! - Two-stage body validation (JSON parse, then schema)
//! - Check-digit validation behind a trait seam
//! - A catch-all so no unexpected fault escapes without a 500

pub mod clock;
pub mod config;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use limiter::{RateLimitResult, RateLimiter};
pub use validator::{CheckDigitValidator, CpfValidator};
