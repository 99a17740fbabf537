pub mod invoice_lines;

pub use invoice_lines::parse_line_items;
