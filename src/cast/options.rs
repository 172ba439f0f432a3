//! Cast/CSV dialect options (§4.B, §6 CSV options).

#[derive(Debug, Clone)]
pub struct CastOptions {
    pub delimiter: char,
    pub escape: char,
    pub quote: char,
    pub list_begin: char,
    pub list_end: char,
    pub struct_begin: char,
    pub struct_end: char,
    pub has_header: bool,
    pub parallel: bool,
    pub sample_size: usize,
    pub ignore_errors: bool,
}

impl Default for CastOptions {
    fn default() -> Self {
        CastOptions {
            delimiter: ',',
            escape: '\\',
            quote: '"',
            list_begin: '[',
            list_end: ']',
            struct_begin: '{',
            struct_end: '}',
            has_header: true,
            parallel: true,
            sample_size: 1024,
            ignore_errors: false,
        }
    }
}
