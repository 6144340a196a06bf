pub mod ast;
pub mod decimal;
pub mod parser;
pub mod scanner;
pub mod token;
