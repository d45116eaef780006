// SPDX-License-Identifier: Apache-2.0

//! Backend families driven by the pooled engine

pub mod keyvalue;
pub mod relational;

pub use keyvalue::KeyValueBackend;
pub use relational::RelationalBackend;
