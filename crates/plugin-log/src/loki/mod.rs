// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Buffered shipping of log lines to a Loki push endpoint.
//!
//! ```text
//!   write(line) ──> EntryBuffer ──(threshold reached)──> encode ──> Transport::send
//!                   [mutex held]                         [no lock held]
//! ```
//!
//! - **[`buffer`]**: ordered, mutex-guarded entries and the flush-threshold decision
//! - **[`labels`]**: the fixed label set tagging every stream
//! - **[`payload`]**: Loki JSON push payload encoding
//! - **[`transport`]**: authenticated HTTP POST and response classification
//! - **[`shipper`]**: the write sink composing the above

pub mod buffer;
pub mod labels;
pub mod payload;
pub mod shipper;
pub mod transport;

pub use labels::Labels;
pub use shipper::LokiShipper;
