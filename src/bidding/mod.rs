pub mod commands;
pub mod evaluator;
