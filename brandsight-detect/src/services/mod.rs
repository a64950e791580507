//! External engine clients
//!
//! Shipped implementations of the collaborator contracts in `types`:
//! - `TesseractCli`: OCR via the `tesseract` binary
//! - `RxingDecoder`: barcode decoding via `rxing`

pub mod rxing_decoder;
pub mod tesseract_cli;

pub use rxing_decoder::RxingDecoder;
pub use tesseract_cli::TesseractCli;
