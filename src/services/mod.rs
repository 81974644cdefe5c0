pub mod enrichment;
pub mod providers;
