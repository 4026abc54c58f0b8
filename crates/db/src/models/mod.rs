//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` entity matching its table plus the
//! `Deserialize` create DTO used for inserts.

pub mod feedback;
pub mod score_record;
pub mod user;
