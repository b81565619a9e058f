pub mod parse;
pub mod replay;
