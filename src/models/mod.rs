pub mod scan;
pub mod seller;

pub use scan::{AdminSummary, ScanResult, ScanSummary};
pub use seller::{AdminAccount, Seller, SellerStatus};
