//! Serde data types shared by the formforge engine and its front ends.

pub mod compliance;
pub mod file_formats;
pub mod formulation;
pub mod ingredient;
pub mod peptide;
pub mod rules;
pub mod template;
