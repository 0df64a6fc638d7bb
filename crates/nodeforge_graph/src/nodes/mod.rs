// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node catalogs.

pub mod common;

pub use common::{register_common_nodes, CommonNode};
