// Analysis module - gesture classification from accelerometer samples

pub mod classifier;

pub use classifier::{Comparison, GestureClassifier, GestureRule};
