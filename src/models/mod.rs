pub mod order;
pub mod pricing;
pub mod quantity;
pub mod result;
pub mod shipment;

pub use order::{
    OrderFilter, OrderSubmission, OrderUpdate, PageRequest, ProcurementOrder, DEFAULT_PER_PAGE,
};
pub use pricing::{PricingConfig, PricingInput};
pub use quantity::{is_valid_quantity, parse_quantity, scan_unit, Quantity, QuantityParseError, Unit};
pub use result::{Paginated, RecomputeSummary, SubmitOutcome, TaxResult};
pub use shipment::{decode_shipments, ShipmentRecord};
