#![allow(dead_code)]

pub mod mock_remote;
pub mod recorder;
pub mod strategies;

pub use mock_remote::*;
pub use recorder::*;
