pub mod annotate;
pub mod contours;
pub mod filter_worker;
pub mod mask;
pub mod types;
