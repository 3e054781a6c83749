pub mod tracker;

pub use tracker::ActivityTracker;
