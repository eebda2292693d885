//! Diagnostic ID constants (`GDX` + four digits).
//!
//! Generated from `spec/diagnostics.jsonc` by the build script; the
//! thousands/hundreds digits group codes by stage (10xx lexical, 11xx
//! resolution, 12xx text grammar, 13xx limits).

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));

/// Whether `id` names a diagnostic defined in the catalogue.
pub fn is_known(id: &str) -> bool {
    ALL.contains(&id)
}
