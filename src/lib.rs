//! robocmd - Natural language to robotics command translation

pub mod command;
pub mod core;
pub mod llm;
pub mod nlp;
pub mod pipeline;
pub mod safety;
pub mod session;
