pub mod ast;
pub mod glyph;
pub mod parser;

#[cfg(test)]
mod tests;
