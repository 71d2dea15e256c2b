//! Product lookup collaborator.

use async_trait::async_trait;

use crate::barcode::Barcode;
use crate::error::CoreError;
use crate::product::Product;

/// Resolves barcodes to product details.
///
/// `Ok(None)` means the catalog answered and does not know the barcode;
/// `Err` means the catalog could not be asked.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<Product>, CoreError>;
}
