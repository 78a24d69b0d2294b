mod parser;
mod validator;

pub use parser::*;
pub use validator::*;
