pub mod pdf_parser;

pub use pdf_parser::PdfParser;
