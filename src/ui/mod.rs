pub mod icons;
pub mod progress;
pub mod views;

pub use progress::ActivitySpinner;
